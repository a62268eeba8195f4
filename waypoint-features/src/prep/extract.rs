//! Per-movement feature extraction.

use chrono::Datelike;
use tracing::warn;

use waypoint_core::collections::FxHashMap;
use waypoint_core::config::PrepConfig;
use waypoint_core::features::MovementFeatures;
use waypoint_core::records::{LocationRecord, MovementRecord, MovementType};

/// Extraction output: derived features plus the count of rows skipped
/// for missing critical fields.
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub features: Vec<MovementFeatures>,
    pub skipped: usize,
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Derive one `MovementFeatures` per usable record.
///
/// Records are grouped per entity and sorted chronologically by
/// departure; idle days for a movement is the gap between its arrival
/// and the entity's next departure (0 for the latest movement).
/// Unusable rows are skipped and counted, never fatal.
pub fn extract_movement_features(
    records: &[MovementRecord],
    locations: &[LocationRecord],
    config: &PrepConfig,
) -> ExtractionResult {
    let location_index: FxHashMap<&str, &LocationRecord> = locations
        .iter()
        .map(|l| (l.location_id.as_str(), l))
        .collect();
    let peak_months = config.effective_seasonal_peak_months();

    let mut by_entity: FxHashMap<&str, Vec<&MovementRecord>> = FxHashMap::default();
    let mut skipped = 0usize;
    for record in records {
        if !record.is_usable() {
            skipped += 1;
            continue;
        }
        by_entity.entry(record.entity_id.as_str()).or_default().push(record);
    }
    if skipped > 0 {
        warn!(skipped, total = records.len(), "skipped records with missing critical fields");
    }

    let mut features = Vec::with_capacity(records.len().saturating_sub(skipped));
    // Deterministic output order regardless of map iteration.
    let mut entity_ids: Vec<&str> = by_entity.keys().copied().collect();
    entity_ids.sort_unstable();

    for entity_id in entity_ids {
        let mut movements = by_entity.remove(entity_id).unwrap_or_default();
        movements.sort_by_key(|r| r.departure_time);

        let mut previous_type: Option<MovementType> = None;
        let mut same_type_run = 0u32;

        for (i, record) in movements.iter().enumerate() {
            // is_usable() guarantees both timestamps.
            let departure = record.departure_time.unwrap();
            let arrival = record.arrival_time.unwrap();

            let idle_days = match movements.get(i + 1).and_then(|next| next.departure_time) {
                Some(next_departure) => {
                    ((next_departure - arrival).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0)
                }
                None => 0.0,
            };

            let movement_type = MovementType::from_label(&record.movement_type);
            same_type_run = match previous_type {
                Some(prev) if prev == movement_type => same_type_run + 1,
                _ => 1,
            };
            previous_type = Some(movement_type);

            let month = departure.month();
            features.push(MovementFeatures {
                entity_id: record.entity_id.clone(),
                from_location_id: record.from_location_id.clone(),
                to_location_id: record.to_location_id.clone(),
                region: record.region.clone(),
                departure_time: departure,
                arrival_time: arrival,
                idle_days,
                movement_type,
                day_of_week: departure.weekday().num_days_from_monday(),
                month,
                quarter: (month - 1) / 3 + 1,
                involves_warehouse: is_warehouse(
                    &record.from_location_id,
                    &record.from_location_type,
                    &location_index,
                    config,
                ) || is_warehouse(
                    &record.to_location_id,
                    &record.to_location_type,
                    &location_index,
                    config,
                ),
                to_warehouse: is_warehouse(
                    &record.to_location_id,
                    &record.to_location_type,
                    &location_index,
                    config,
                ),
                is_seasonal: peak_months.contains(&month),
                consecutive_same_type: same_type_run,
            });
        }
    }

    ExtractionResult { features, skipped }
}

/// Warehouse check: the declared type on the movement row, the resolved
/// location's declared kind/name, or a configured name marker.
fn is_warehouse(
    location_id: &str,
    declared_type: &str,
    locations: &FxHashMap<&str, &LocationRecord>,
    config: &PrepConfig,
) -> bool {
    if declared_type.eq_ignore_ascii_case("warehouse") {
        return true;
    }
    if let Some(location) = locations.get(location_id) {
        if location.is_warehouse() {
            return true;
        }
        let name = location.name.to_ascii_lowercase();
        if config
            .warehouse_name_markers
            .iter()
            .any(|marker| name.contains(marker.as_str()))
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 8, 0, 0).unwrap()
    }

    fn make_record(
        entity: &str,
        from: &str,
        to: &str,
        departure: DateTime<Utc>,
        arrival: DateTime<Utc>,
        movement_type: &str,
    ) -> MovementRecord {
        MovementRecord {
            entity_id: entity.into(),
            from_location_id: from.into(),
            from_location_type: "site".into(),
            to_location_id: to.into(),
            to_location_type: "site".into(),
            departure_time: Some(departure),
            arrival_time: Some(arrival),
            movement_type: movement_type.into(),
            region: "north".into(),
        }
    }

    fn make_location(id: &str, kind: &str) -> LocationRecord {
        LocationRecord {
            location_id: id.into(),
            name: format!("Location {id}"),
            kind: kind.into(),
            latitude: Some(0.0),
            longitude: Some(0.0),
            region: "north".into(),
        }
    }

    #[test]
    fn test_idle_days_from_next_departure() {
        let records = vec![
            make_record("cow-1", "a", "b", ts(1, 1), ts(1, 2), "full"),
            make_record("cow-1", "b", "c", ts(1, 12), ts(1, 13), "full"),
        ];
        let result = extract_movement_features(&records, &[], &PrepConfig::default());
        assert_eq!(result.features.len(), 2);
        // Arrived Jan 2, next departure Jan 12 → 10 idle days.
        assert!((result.features[0].idle_days - 10.0).abs() < 1e-9);
        // Last movement has no successor.
        assert_eq!(result.features[1].idle_days, 0.0);
    }

    #[test]
    fn test_unusable_rows_skipped_and_counted() {
        let mut bad = make_record("cow-1", "a", "b", ts(1, 1), ts(1, 2), "full");
        bad.entity_id = String::new();
        let records = vec![
            bad,
            make_record("cow-2", "a", "b", ts(1, 1), ts(1, 2), "full"),
        ];
        let result = extract_movement_features(&records, &[], &PrepConfig::default());
        assert_eq!(result.skipped, 1);
        assert_eq!(result.features.len(), 1);
        assert_eq!(result.features[0].entity_id, "cow-2");
    }

    #[test]
    fn test_movement_type_normalized_not_dropped() {
        let records = vec![make_record("cow-1", "a", "b", ts(1, 1), ts(1, 2), "weird label")];
        let result = extract_movement_features(&records, &[], &PrepConfig::default());
        assert_eq!(result.features[0].movement_type, MovementType::Unknown);
    }

    #[test]
    fn test_warehouse_flag_from_resolved_location() {
        let records = vec![make_record("cow-1", "wh-1", "site-2", ts(1, 1), ts(1, 2), "half")];
        let locations = vec![make_location("wh-1", "warehouse"), make_location("site-2", "site")];
        let result = extract_movement_features(&records, &locations, &PrepConfig::default());
        assert!(result.features[0].involves_warehouse);
        assert!(!result.features[0].to_warehouse);
    }

    #[test]
    fn test_calendar_and_seasonal_derivation() {
        // 2024-07-01 is a Monday and July is in the default peak window.
        let records = vec![make_record("cow-1", "a", "b", ts(7, 1), ts(7, 2), "full")];
        let result = extract_movement_features(&records, &[], &PrepConfig::default());
        let f = &result.features[0];
        assert_eq!(f.day_of_week, 0);
        assert_eq!(f.month, 7);
        assert_eq!(f.quarter, 3);
        assert!(f.is_seasonal);
    }

    #[test]
    fn test_consecutive_same_type_resets() {
        let records = vec![
            make_record("cow-1", "a", "b", ts(1, 1), ts(1, 2), "full"),
            make_record("cow-1", "b", "c", ts(1, 5), ts(1, 6), "full"),
            make_record("cow-1", "c", "d", ts(1, 9), ts(1, 10), "half"),
            make_record("cow-1", "d", "e", ts(1, 12), ts(1, 13), "half"),
        ];
        let result = extract_movement_features(&records, &[], &PrepConfig::default());
        let runs: Vec<u32> = result.features.iter().map(|f| f.consecutive_same_type).collect();
        assert_eq!(runs, vec![1, 2, 1, 2]);
    }
}
