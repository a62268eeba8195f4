//! Raw input records supplied by the caller.
//!
//! The core never performs I/O: the embedding application loads movement
//! and location records into memory (from CSV, a sheet, a database) and
//! hands them over as-is. Records are never mutated here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical movement of a tracked entity.
///
/// Timestamps are `Option` so the quality assessor can score records
/// whose raw values failed to parse instead of rejecting the whole
/// batch; `movement_type` stays free text for the same reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRecord {
    pub entity_id: String,
    pub from_location_id: String,
    pub from_location_type: String,
    pub to_location_id: String,
    pub to_location_type: String,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    /// Free-text movement classification, normalized by the pipeline.
    pub movement_type: String,
    pub region: String,
}

impl MovementRecord {
    /// A record is usable when it names an entity, both endpoints, and
    /// carries both timestamps. Unusable records are skipped and counted
    /// by the preparation pipeline, never fatal.
    pub fn is_usable(&self) -> bool {
        !self.entity_id.is_empty()
            && !self.from_location_id.is_empty()
            && !self.to_location_id.is_empty()
            && self.departure_time.is_some()
            && self.arrival_time.is_some()
    }

    /// Chronologically valid: both timestamps present and arrival is not
    /// before departure.
    pub fn is_chronological(&self) -> bool {
        match (self.departure_time, self.arrival_time) {
            (Some(dep), Some(arr)) => arr >= dep,
            _ => false,
        }
    }
}

/// A known location an entity can occupy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    pub location_id: String,
    pub name: String,
    /// Declared location type, e.g. "warehouse" or "site".
    pub kind: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: String,
}

impl LocationRecord {
    /// Warehouse detection: declared type first, name heuristic second.
    pub fn is_warehouse(&self) -> bool {
        self.kind.eq_ignore_ascii_case("warehouse")
            || self.name.to_ascii_lowercase().contains("warehouse")
    }
}

/// Coarse movement classification.
///
/// Full = site-to-site, Half = one endpoint is a warehouse,
/// Zero = warehouse-to-warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    Full,
    Half,
    Zero,
    Unknown,
}

impl MovementType {
    /// Normalize free text into the four-way tag. Unrecognized text maps
    /// to `Unknown` — never dropped.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "full" | "full move" => Self::Full,
            "half" | "half move" => Self::Half,
            "zero" | "zero move" => Self::Zero,
            _ => Self::Unknown,
        }
    }

    /// Numeric encoding used in feature vectors.
    pub fn weight(self) -> f64 {
        match self {
            Self::Full => 1.0,
            Self::Half => 0.5,
            Self::Zero => 0.0,
            Self::Unknown => 0.25,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Half => "half",
            Self::Zero => "zero",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
