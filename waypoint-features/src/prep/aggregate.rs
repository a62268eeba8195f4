//! Per-entity aggregate statistics.

use chrono::{DateTime, Utc};

use waypoint_core::collections::FxHashMap;
use waypoint_core::config::PrepConfig;
use waypoint_core::features::{EntityAggregateFeatures, MovementFeatures};
use waypoint_core::records::MovementType;

const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_MONTH: f64 = 30.44;

/// Roll per-movement features up into one aggregate record per entity.
///
/// `now` anchors recency and the still-open idle gap of each entity's
/// latest movement; callers pass it explicitly so results are
/// reproducible. Aggregates are always rebuilt wholesale.
pub fn aggregate_entity_features(
    features: &[MovementFeatures],
    now: DateTime<Utc>,
    config: &PrepConfig,
) -> FxHashMap<String, EntityAggregateFeatures> {
    let mut by_entity: FxHashMap<&str, Vec<&MovementFeatures>> = FxHashMap::default();
    for f in features {
        by_entity.entry(f.entity_id.as_str()).or_default().push(f);
    }

    let mut aggregates = FxHashMap::default();
    for (entity_id, mut movements) in by_entity {
        movements.sort_by_key(|f| f.departure_time);
        let aggregate = aggregate_one(entity_id, &movements, now, config);
        aggregates.insert(entity_id.to_string(), aggregate);
    }
    aggregates
}

fn aggregate_one(
    entity_id: &str,
    movements: &[&MovementFeatures],
    now: DateTime<Utc>,
    config: &PrepConfig,
) -> EntityAggregateFeatures {
    let n = movements.len();
    let last = movements[n - 1];

    // Completed inter-movement gaps (arrival → next departure) plus the
    // still-open gap from the latest arrival to "now".
    let open_gap = ((now - last.arrival_time).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
    let mut idle_values: Vec<f64> = Vec::with_capacity(n);
    let mut warehouse_idle: Vec<f64> = Vec::new();
    let mut offsite_idle: Vec<f64> = Vec::new();
    for (i, m) in movements.iter().enumerate() {
        let idle = if i + 1 < n { m.idle_days } else { open_gap };
        idle_values.push(idle);
        if m.to_warehouse {
            warehouse_idle.push(idle);
        } else {
            offsite_idle.push(idle);
        }
    }
    let completed_gaps = &idle_values[..n - 1];

    let (mean_idle, std_idle) = mean_and_pop_stddev(&idle_values);
    let (mean_wh, std_wh) = mean_and_pop_stddev(&warehouse_idle);
    let (mean_off, std_off) = mean_and_pop_stddev(&offsite_idle);

    let mut from_counts: FxHashMap<&str, u32> = FxHashMap::default();
    let mut to_counts: FxHashMap<&str, u32> = FxHashMap::default();
    let mut region_visits: FxHashMap<String, u32> = FxHashMap::default();
    let mut type_counts: FxHashMap<MovementType, u32> = FxHashMap::default();
    let mut month_counts: FxHashMap<u32, u32> = FxHashMap::default();
    for m in movements {
        *from_counts.entry(m.from_location_id.as_str()).or_insert(0) += 1;
        *to_counts.entry(m.to_location_id.as_str()).or_insert(0) += 1;
        *region_visits.entry(m.region.clone()).or_insert(0) += 1;
        *type_counts.entry(m.movement_type).or_insert(0) += 1;
        *month_counts.entry(m.month).or_insert(0) += 1;
    }

    let span_days = ((last.arrival_time - movements[0].departure_time).num_seconds() as f64
        / SECONDS_PER_DAY)
        .max(0.0);
    let span_months = (span_days / DAYS_PER_MONTH).max(1.0);

    let (peak_months, off_peak_months) =
        detect_peak_months(&month_counts, config.effective_peak_month_multiplier());

    let warehouse_total: f64 = warehouse_idle.iter().sum();
    let idle_total: f64 = idle_values.iter().sum();

    EntityAggregateFeatures {
        entity_id: entity_id.to_string(),
        movement_count: n,
        mean_idle_days: mean_idle,
        stddev_idle_days: std_idle,
        mean_idle_days_warehouse: mean_wh,
        stddev_idle_days_warehouse: std_wh,
        mean_idle_days_offsite: mean_off,
        stddev_idle_days_offsite: std_off,
        most_frequent_from: modal(&from_counts),
        most_frequent_to: modal(&to_counts),
        region_visits,
        movements_per_month: n as f64 / span_months,
        movement_type_counts: type_counts,
        consistency_score: consistency(completed_gaps),
        recency_days: open_gap,
        has_seasonal_pattern: !peak_months.is_empty() && month_counts.len() >= 2,
        peak_months,
        off_peak_months,
        warehouse_time_ratio: if idle_total > 0.0 {
            warehouse_total / idle_total
        } else {
            0.0
        },
    }
}

/// Mean and population standard deviation; (0, 0) for an empty slice.
pub fn mean_and_pop_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Movement consistency: inverse coefficient of variation of the
/// inter-movement gaps, clamped to [0, 1]. Perfectly regular gaps
/// (CV = 0) score 1; a zero mean gap scores 0.
fn consistency(gaps: &[f64]) -> f64 {
    if gaps.is_empty() {
        return 0.0;
    }
    let (mean, stddev) = mean_and_pop_stddev(gaps);
    if mean <= 0.0 {
        return 0.0;
    }
    if stddev == 0.0 {
        return 1.0;
    }
    (mean / stddev).clamp(0.0, 1.0)
}

/// Peak months: count above `multiplier` × the average over months with
/// data. Off-peak: count below average / `multiplier`.
fn detect_peak_months(
    month_counts: &FxHashMap<u32, u32>,
    multiplier: f64,
) -> (Vec<u32>, Vec<u32>) {
    if month_counts.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let average =
        month_counts.values().sum::<u32>() as f64 / month_counts.len() as f64;

    let mut peak: Vec<u32> = month_counts
        .iter()
        .filter(|(_, &count)| count as f64 > average * multiplier)
        .map(|(&month, _)| month)
        .collect();
    let mut off_peak: Vec<u32> = month_counts
        .iter()
        .filter(|(_, &count)| (count as f64) < average / multiplier)
        .map(|(&month, _)| month)
        .collect();
    peak.sort_unstable();
    off_peak.sort_unstable();
    (peak, off_peak)
}

/// Modal key with deterministic lexical tie-break.
fn modal(counts: &FxHashMap<&str, u32>) -> String {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(k, _)| k.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn ts(day_offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day_offset)
    }

    /// Movements a day apart in transit, `gaps[i]` idle days after each
    /// arrival before the next departure.
    fn make_history(entity: &str, gaps: &[f64], to_warehouse_alternating: bool) -> Vec<MovementFeatures> {
        let mut features = Vec::new();
        let mut day = 0i64;
        for (i, &gap) in gaps.iter().enumerate() {
            let departure = ts(day);
            let arrival = ts(day + 1);
            day += 1 + gap as i64;
            features.push(MovementFeatures {
                entity_id: entity.into(),
                from_location_id: format!("loc-{i}"),
                to_location_id: format!("loc-{}", i + 1),
                region: "north".into(),
                departure_time: departure,
                arrival_time: arrival,
                idle_days: gap,
                movement_type: MovementType::Full,
                day_of_week: 0,
                month: departure.month(),
                quarter: 1,
                involves_warehouse: to_warehouse_alternating && i % 2 == 0,
                to_warehouse: to_warehouse_alternating && i % 2 == 0,
                is_seasonal: false,
                consecutive_same_type: 1,
            });
        }
        // The extractor leaves the last movement's gap at 0.
        if let Some(last) = features.last_mut() {
            last.idle_days = 0.0;
        }
        features
    }

    #[test]
    fn test_mean_includes_open_gap() {
        // Completed gaps 5 and 10, then 15 days idle as of "now".
        let features = make_history("cow-1", &[5.0, 10.0, 0.0], false);
        let last_arrival = features[2].arrival_time;
        let now = last_arrival + chrono::Duration::days(15);
        let aggregates = aggregate_entity_features(&features, now, &PrepConfig::default());
        let agg = &aggregates["cow-1"];
        assert_eq!(agg.movement_count, 3);
        assert!((agg.mean_idle_days - 10.0).abs() < 1e-9, "got {}", agg.mean_idle_days);
        assert!((agg.recency_days - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_consistency_perfectly_regular() {
        let features = make_history("cow-1", &[10.0, 10.0, 10.0, 0.0], false);
        let now = features[3].arrival_time + chrono::Duration::days(1);
        let aggregates = aggregate_entity_features(&features, now, &PrepConfig::default());
        assert_eq!(aggregates["cow-1"].consistency_score, 1.0);
    }

    #[test]
    fn test_consistency_irregular_is_below_one() {
        let features = make_history("cow-1", &[1.0, 30.0, 2.0, 45.0, 0.0], false);
        let now = features[4].arrival_time;
        let aggregates = aggregate_entity_features(&features, now, &PrepConfig::default());
        let score = aggregates["cow-1"].consistency_score;
        assert!(score < 1.0 && score >= 0.0, "got {score}");
    }

    #[test]
    fn test_warehouse_offsite_split() {
        let features = make_history("cow-1", &[10.0, 20.0, 10.0, 20.0, 0.0], true);
        let now = features[4].arrival_time;
        let aggregates = aggregate_entity_features(&features, now, &PrepConfig::default());
        let agg = &aggregates["cow-1"];
        // Even indexes arrive at warehouses: gaps 10, 10, 0 (open gap).
        assert!((agg.mean_idle_days_warehouse - 20.0 / 3.0).abs() < 1e-9);
        // Odd indexes offsite: gaps 20, 20.
        assert!((agg.mean_idle_days_offsite - 20.0).abs() < 1e-9);
        assert!(agg.warehouse_time_ratio > 0.0 && agg.warehouse_time_ratio < 1.0);
    }

    #[test]
    fn test_modal_locations_deterministic() {
        let mut counts: FxHashMap<&str, u32> = FxHashMap::default();
        counts.insert("b", 2);
        counts.insert("a", 2);
        counts.insert("c", 1);
        assert_eq!(modal(&counts), "a");
    }

    #[test]
    fn test_peak_month_detection() {
        let mut counts: FxHashMap<u32, u32> = FxHashMap::default();
        counts.insert(6, 9);
        counts.insert(1, 1);
        counts.insert(2, 2);
        // Average = 4; peak > 6, off-peak < 2.67.
        let (peak, off_peak) = detect_peak_months(&counts, 1.5);
        assert_eq!(peak, vec![6]);
        assert_eq!(off_peak, vec![1, 2]);
    }
}
