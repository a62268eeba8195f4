//! Batch report rendering: plain text, CSV, and JSON.

use std::fmt::Write as _;

use waypoint_core::errors::EngineError;
use waypoint_core::recommendation::BatchRecommendationResult;

/// Human-readable summary report.
pub fn render_text(batch: &BatchRecommendationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Movement recommendations — {}", batch.generated_at.to_rfc3339());
    for (name, version) in &batch.model_versions {
        let _ = writeln!(out, "  model {name} v{version}");
    }
    let s = &batch.summary;
    let _ = writeln!(
        out,
        "entities: {} | immediate: {} | ready to move: {} | can wait: {}",
        s.total_entities, s.needs_immediate_action, s.ready_to_move, s.can_wait
    );
    if !s.critical_entity_ids.is_empty() {
        let _ = writeln!(out, "critical: {}", s.critical_entity_ids.join(", "));
    }
    let _ = writeln!(out);

    for prediction in &batch.predictions {
        let rec = &prediction.recommendation;
        let top_location = rec
            .options
            .first()
            .and_then(|o| o.locations.first())
            .map_or("-", |l| l.location_id.as_str());
        let _ = writeln!(
            out,
            "{} @ {} (idle {:.1}d): {} [{}] -> {} (confidence {:.2})",
            rec.entity_id,
            rec.current_location,
            rec.current_idle_days,
            rec.best_action,
            rec.priority,
            top_location,
            rec.best_confidence()
        );
        for risk in &rec.risk_factors {
            let _ = writeln!(out, "  risk: {risk}");
        }
        for opportunity in &rec.opportunity_factors {
            let _ = writeln!(out, "  opportunity: {opportunity}");
        }
    }
    out
}

/// CSV export, one row per entity.
pub fn render_csv(batch: &BatchRecommendationResult) -> String {
    let mut out = String::from(
        "entity_id,current_location,current_idle_days,best_action,priority,confidence,top_location,estimated_stay_days\n",
    );
    for prediction in &batch.predictions {
        let rec = &prediction.recommendation;
        let top = rec.options.first().and_then(|o| o.locations.first());
        let _ = writeln!(
            out,
            "{},{},{:.2},{},{},{:.4},{},{:.2}",
            csv_field(&rec.entity_id),
            csv_field(&rec.current_location),
            rec.current_idle_days,
            rec.best_action,
            rec.priority,
            rec.best_confidence(),
            csv_field(top.map_or("", |l| l.location_id.as_str())),
            top.map_or(0.0, |l| l.estimated_stay_days)
        );
    }
    out
}

/// Pretty-printed JSON of the full batch result.
pub fn render_json(batch: &BatchRecommendationResult) -> Result<String, EngineError> {
    serde_json::to_string_pretty(batch).map_err(|e| EngineError::ReportFailed {
        message: e.to_string(),
    })
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
