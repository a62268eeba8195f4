//! Data-quality assessment.
//!
//! Quality problems are reported, never thrown: the assessor always
//! returns a scored report with itemized issues, including for an empty
//! input (all-zero scores).

use std::fmt;

use serde::{Deserialize, Serialize};

use waypoint_core::collections::FxHashSet;
use waypoint_core::config::QualityConfig;
use waypoint_core::records::{LocationRecord, MovementRecord};

/// Issue severity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// One itemized data-quality finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub affected_records: usize,
    pub remediation: String,
}

/// Four sub-scores, their unweighted mean, and itemized issues.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Fraction of records with all required fields populated.
    pub completeness: f64,
    /// Fraction of from/to location references resolving to a known location.
    pub consistency: f64,
    /// Fraction of records with parseable, chronological timestamps.
    pub validity: f64,
    /// Fraction of known coordinates inside the configured bounding region.
    pub accuracy: f64,
    /// Unweighted mean of the four sub-scores.
    pub overall: f64,
    pub issues: Vec<QualityIssue>,
}

/// Score a record batch. Never fails; zero records yields an all-zero
/// report with a single critical issue.
pub fn assess_data_quality(
    records: &[MovementRecord],
    locations: &[LocationRecord],
    config: &QualityConfig,
) -> DataQualityReport {
    if records.is_empty() {
        return DataQualityReport {
            issues: vec![QualityIssue {
                severity: Severity::Critical,
                category: "completeness".into(),
                message: "no movement records supplied".into(),
                affected_records: 0,
                remediation: "load movement history before invoking the pipeline".into(),
            }],
            ..DataQualityReport::default()
        };
    }

    let known_ids: FxHashSet<&str> = locations.iter().map(|l| l.location_id.as_str()).collect();
    let n = records.len();

    let complete = records.iter().filter(|r| is_complete(r)).count();

    let mut resolvable_refs = 0usize;
    let mut total_refs = 0usize;
    let mut unresolvable_records = 0usize;
    for record in records {
        let mut record_ok = true;
        for id in [&record.from_location_id, &record.to_location_id] {
            total_refs += 1;
            if !id.is_empty() && known_ids.contains(id.as_str()) {
                resolvable_refs += 1;
            } else {
                record_ok = false;
            }
        }
        if !record_ok {
            unresolvable_records += 1;
        }
    }

    let valid = records.iter().filter(|r| r.is_chronological()).count();

    let (accuracy, out_of_bounds) = score_accuracy(locations, config);

    let completeness = complete as f64 / n as f64;
    let consistency = resolvable_refs as f64 / total_refs as f64;
    let validity = valid as f64 / n as f64;
    let overall = (completeness + consistency + validity + accuracy) / 4.0;

    let mut issues = Vec::new();
    push_issue(
        &mut issues,
        completeness,
        "completeness",
        n - complete,
        "movement records are missing required fields",
        "backfill entity ids, endpoints, and timestamps at the source",
    );
    push_issue(
        &mut issues,
        consistency,
        "consistency",
        unresolvable_records,
        "movement records reference unknown locations",
        "sync the location master list with the movement log",
    );
    push_issue(
        &mut issues,
        validity,
        "validity",
        n - valid,
        "records have missing or non-chronological timestamps",
        "reject rows where arrival precedes departure at ingestion",
    );
    push_issue(
        &mut issues,
        accuracy,
        "accuracy",
        out_of_bounds,
        "location coordinates fall outside the configured region",
        "re-geocode flagged locations",
    );

    DataQualityReport {
        completeness,
        consistency,
        validity,
        accuracy,
        overall,
        issues,
    }
}

fn is_complete(record: &MovementRecord) -> bool {
    !record.entity_id.is_empty()
        && !record.from_location_id.is_empty()
        && !record.to_location_id.is_empty()
        && !record.movement_type.is_empty()
        && !record.region.is_empty()
        && record.departure_time.is_some()
        && record.arrival_time.is_some()
}

/// In-bounds fraction of locations with known coordinates. Without a
/// configured region, scores coordinate presence instead. With no
/// locations (or no coordinates to check against a region) the score
/// is neutral rather than a penalty.
fn score_accuracy(locations: &[LocationRecord], config: &QualityConfig) -> (f64, usize) {
    if locations.is_empty() {
        return (1.0, 0);
    }
    match config.bounding_region {
        Some(region) => {
            let with_coords: Vec<(f64, f64)> = locations
                .iter()
                .filter_map(|l| Some((l.latitude?, l.longitude?)))
                .collect();
            if with_coords.is_empty() {
                return (1.0, 0);
            }
            let in_bounds = with_coords
                .iter()
                .filter(|(lat, lon)| region.contains(*lat, *lon))
                .count();
            (
                in_bounds as f64 / with_coords.len() as f64,
                with_coords.len() - in_bounds,
            )
        }
        None => {
            let with_coords = locations
                .iter()
                .filter(|l| l.latitude.is_some() && l.longitude.is_some())
                .count();
            (
                with_coords as f64 / locations.len() as f64,
                locations.len() - with_coords,
            )
        }
    }
}

fn push_issue(
    issues: &mut Vec<QualityIssue>,
    score: f64,
    category: &str,
    affected: usize,
    message: &str,
    remediation: &str,
) {
    if score >= 1.0 {
        return;
    }
    let severity = if score < 0.5 {
        Severity::Critical
    } else if score < 0.9 {
        Severity::Warning
    } else {
        Severity::Info
    };
    issues.push(QualityIssue {
        severity,
        category: category.to_string(),
        message: message.to_string(),
        affected_records: affected,
        remediation: remediation.to_string(),
    });
}
