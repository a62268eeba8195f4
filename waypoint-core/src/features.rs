//! Derived per-movement and per-entity feature records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::FxHashMap;
use crate::records::MovementType;

/// Features derived from one usable `MovementRecord`.
///
/// Created once per input record during dataset construction and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementFeatures {
    pub entity_id: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub region: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// Days between this movement's arrival and the entity's next
    /// departure. 0 for the entity's latest movement.
    pub idle_days: f64,
    pub movement_type: MovementType,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: u32,
    /// 1–12.
    pub month: u32,
    /// 1–4.
    pub quarter: u32,
    /// Either endpoint is a warehouse.
    pub involves_warehouse: bool,
    /// The destination endpoint is a warehouse.
    pub to_warehouse: bool,
    /// Departure month falls in the configured peak window.
    pub is_seasonal: bool,
    /// Running count of consecutive movements with the same type,
    /// reset on type change. Starts at 1.
    pub consecutive_same_type: u32,
}

/// Rolling statistics over all of one entity's movements.
///
/// Recomputed wholesale whenever the training dataset is rebuilt; never
/// partially updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAggregateFeatures {
    pub entity_id: String,
    pub movement_count: usize,
    pub mean_idle_days: f64,
    pub stddev_idle_days: f64,
    /// Idle statistics restricted to stays at warehouses.
    pub mean_idle_days_warehouse: f64,
    pub stddev_idle_days_warehouse: f64,
    /// Idle statistics restricted to stays at offsite locations.
    pub mean_idle_days_offsite: f64,
    pub stddev_idle_days_offsite: f64,
    pub most_frequent_from: String,
    pub most_frequent_to: String,
    /// Visit counts per region.
    pub region_visits: FxHashMap<String, u32>,
    pub movements_per_month: f64,
    /// Movement counts per type tag.
    pub movement_type_counts: FxHashMap<MovementType, u32>,
    /// Regularity of inter-movement gaps in [0, 1]; 1 = perfectly regular.
    pub consistency_score: f64,
    /// Days since the entity's latest movement, relative to the caller's
    /// explicit "now".
    pub recency_days: f64,
    pub has_seasonal_pattern: bool,
    /// Months whose movement count exceeds the configured multiple of the
    /// per-month average.
    pub peak_months: Vec<u32>,
    pub off_peak_months: Vec<u32>,
    /// Share of total idle time spent at warehouses, in [0, 1].
    pub warehouse_time_ratio: f64,
}

impl EntityAggregateFeatures {
    /// Share of this entity's visits that fall in `region`.
    pub fn region_share(&self, region: &str) -> f64 {
        let total: u32 = self.region_visits.values().sum();
        if total == 0 {
            return 0.0;
        }
        self.region_visits.get(region).copied().unwrap_or(0) as f64 / total as f64
    }

    /// Whether `month` (1–12) is one of this entity's peak months.
    pub fn is_peak_month(&self, month: u32) -> bool {
        self.peak_months.contains(&month)
    }
}
