//! Time-series lookback features.

use waypoint_core::features::MovementFeatures;

/// One lookback slot: (idle days, warehouse flag, feature name pair).
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlot {
    pub idle_days: f64,
    pub warehouse: f64,
    pub idle_name: String,
    pub warehouse_name: String,
    pub padded: bool,
}

/// Emit the last `window` movements' (idle-days, warehouse-flag) pairs,
/// most recent first. `history` must be chronologically sorted.
///
/// When fewer than `window` movements exist, remaining slots are padded
/// with `fallback_idle` (the entity's historical average) and a
/// warehouse flag of 0, with `_padded` name suffixes so downstream
/// consumers can tell real lags from fill.
pub fn window_features(
    history: &[MovementFeatures],
    window: usize,
    fallback_idle: f64,
) -> Vec<WindowSlot> {
    let mut slots = Vec::with_capacity(window);
    for lag in 1..=window {
        match history.len().checked_sub(lag).map(|i| &history[i]) {
            Some(movement) => slots.push(WindowSlot {
                idle_days: movement.idle_days,
                warehouse: if movement.to_warehouse { 1.0 } else { 0.0 },
                idle_name: format!("lag{lag}_idle_days"),
                warehouse_name: format!("lag{lag}_warehouse"),
                padded: false,
            }),
            None => slots.push(WindowSlot {
                idle_days: fallback_idle,
                warehouse: 0.0,
                idle_name: format!("lag{lag}_idle_days_padded"),
                warehouse_name: format!("lag{lag}_warehouse_padded"),
                padded: true,
            }),
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use waypoint_core::records::MovementType;

    fn make_movement(idle: f64, warehouse: bool, day: u32) -> MovementFeatures {
        let t = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        MovementFeatures {
            entity_id: "cow-1".into(),
            from_location_id: "a".into(),
            to_location_id: "b".into(),
            region: "north".into(),
            departure_time: t,
            arrival_time: t,
            idle_days: idle,
            movement_type: MovementType::Full,
            day_of_week: 0,
            month: 1,
            quarter: 1,
            involves_warehouse: warehouse,
            to_warehouse: warehouse,
            is_seasonal: false,
            consecutive_same_type: 1,
        }
    }

    #[test]
    fn test_most_recent_first() {
        let history = vec![
            make_movement(5.0, true, 1),
            make_movement(10.0, false, 5),
            make_movement(15.0, true, 9),
        ];
        let slots = window_features(&history, 2, 0.0);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].idle_days, 15.0);
        assert_eq!(slots[0].warehouse, 1.0);
        assert_eq!(slots[0].idle_name, "lag1_idle_days");
        assert_eq!(slots[1].idle_days, 10.0);
        assert!(!slots[1].padded);
    }

    #[test]
    fn test_short_history_padded_with_average() {
        let history = vec![make_movement(8.0, false, 1)];
        let slots = window_features(&history, 3, 11.5);
        assert_eq!(slots.len(), 3);
        assert!(!slots[0].padded);
        assert!(slots[1].padded);
        assert_eq!(slots[1].idle_days, 11.5);
        assert_eq!(slots[1].warehouse, 0.0);
        assert_eq!(slots[2].idle_name, "lag3_idle_days_padded");
    }

    #[test]
    fn test_empty_history_all_padded() {
        let slots = window_features(&[], 2, 4.0);
        assert!(slots.iter().all(|s| s.padded && s.idle_days == 4.0));
    }
}
