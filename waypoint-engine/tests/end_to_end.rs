//! Full pipeline: raw records → training dataset → trained models →
//! batch recommendations and reports.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use waypoint_core::config::EngineConfig;
use waypoint_core::records::MovementRecord;
use waypoint_core::ManualClock;
use waypoint_engine::{report, RecommendationEngine};
use waypoint_features::DataPreparationPipeline;
use waypoint_models::{
    BehaviorClusterModel, KMeansConfig, NextLocationModel, PredictiveModel, StayDurationModel,
};

fn ts(day_offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::days(day_offset)
}

/// Ten movements for one entity with known idle gaps between them.
/// Destinations cycle through three sites so the classifier has signal.
fn movement_history(entity: &str, gaps: &[i64]) -> Vec<MovementRecord> {
    let sites = ["site-a", "site-b", "site-c"];
    let mut records = Vec::new();
    let mut day = 0i64;
    let mut from = "warehouse-0".to_string();
    for (i, gap) in std::iter::once(&0).chain(gaps.iter()).enumerate() {
        day += gap;
        let to = sites[i % 3].to_string();
        records.push(MovementRecord {
            entity_id: entity.into(),
            from_location_id: from.clone(),
            from_location_type: "site".into(),
            to_location_id: to.clone(),
            to_location_type: "site".into(),
            departure_time: Some(ts(day)),
            arrival_time: Some(ts(day)),
            movement_type: "full".into(),
            region: "north".into(),
        });
        from = to;
    }
    records
}

const GAPS: [i64; 9] = [5, 10, 15, 20, 25, 8, 12, 18, 22];

#[test]
fn full_pipeline_produces_recommendations() {
    waypoint_core::logging::init_tracing();
    let records = movement_history("cow-42", &GAPS);
    assert_eq!(records.len(), 10);

    // 30 idle days since the final arrival.
    let last_day: i64 = GAPS.iter().sum();
    let now = ts(last_day) + Duration::days(30);

    let pipeline = DataPreparationPipeline::new();

    // Aggregate idle statistics cover the nine completed gaps plus the
    // open 30-day gap: mean of [5,10,15,20,25,8,12,18,22,30] = 16.5.
    let extraction = pipeline.extract_movement_features(&records, &[]);
    assert_eq!(extraction.features.len(), 10);
    assert_eq!(extraction.skipped, 0);
    let aggregates = pipeline.aggregate_entity_features(&extraction.features, now);
    let aggregate = &aggregates["cow-42"];
    assert_eq!(aggregate.movement_count, 10);
    assert!((aggregate.mean_idle_days - 16.5).abs() < 1e-9);
    assert!((aggregate.recency_days - 30.0).abs() < 1e-9);

    // Nine movement pairs -> nine labeled samples each; one entity ->
    // one clustering sample.
    let dataset = pipeline.build_training_dataset(&records, &[], now).unwrap();
    assert_eq!(dataset.classification.len(), 9);
    assert_eq!(dataset.regression.len(), 9);
    assert_eq!(dataset.clustering.len(), 1);
    assert_eq!(dataset.metadata.unique_entities, 1);

    let mut next = NextLocationModel::new();
    next.train(&dataset.classification).unwrap();
    let mut stay = StayDurationModel::new();
    stay.train(&dataset.regression).unwrap();
    let mut behavior = BehaviorClusterModel::with_config(KMeansConfig {
        k: 3,
        max_iterations: 100,
        seed: Some(7),
    })
    .unwrap();
    behavior.train(&dataset.clustering).unwrap();

    let current = &dataset.clustering[0].vector;
    assert!((current.metadata.current_idle_days - 30.0).abs() < 1e-9);

    let stay_prediction = stay.predict(current).unwrap();
    assert!(stay_prediction.predicted_days >= 1.0);
    assert!(stay_prediction.predicted_days <= 90.0);
    assert!(!stay_prediction.rationale.is_empty());
    assert!((0.0..=1.0).contains(&stay_prediction.movement_readiness));

    let next_prediction = next.predict(current).unwrap();
    assert!(!next_prediction.ranked.is_empty());
    let top = next_prediction.top().unwrap();
    assert!(["site-a", "site-b", "site-c"].contains(&top.location_id.as_str()));
    assert!(top.rationale.contains("nearest neighbors moved to"));

    let cluster_prediction = behavior.predict(current).unwrap();
    assert!(cluster_prediction.cluster_id.is_some());

    let engine = RecommendationEngine::with_config(
        EngineConfig::default(),
        next,
        stay,
        behavior,
        Arc::new(ManualClock::new(now)),
    );
    let vectors: Vec<_> = dataset.clustering.iter().map(|s| s.vector.clone()).collect();
    let batch = engine.recommend_batch(&vectors).unwrap();
    assert_eq!(batch.summary.total_entities, 1);
    assert_eq!(batch.predictions[0].entity_id, "cow-42");
    let rec = &batch.predictions[0].recommendation;
    assert!((rec.current_idle_days - 30.0).abs() < 1e-9);
    assert!(!rec.options.is_empty());
    assert!(!rec.options[0].rationale.is_empty());
    assert_eq!(batch.generated_at, now);
    assert_eq!(batch.model_versions.len(), 3);

    // All three renderers produce non-empty output for the same batch.
    let text = report::render_text(&batch);
    assert!(text.contains("cow-42"));
    let csv = report::render_csv(&batch);
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.lines().nth(1).unwrap().starts_with("cow-42,"));
    let json = report::render_json(&batch).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
}

#[test]
fn exported_models_predict_identically() {
    let records = movement_history("cow-42", &GAPS);
    let now = ts(GAPS.iter().sum::<i64>()) + Duration::days(30);
    let pipeline = DataPreparationPipeline::new();
    let dataset = pipeline.build_training_dataset(&records, &[], now).unwrap();

    let mut stay = StayDurationModel::new();
    stay.train(&dataset.regression).unwrap();
    let restored = StayDurationModel::import(&stay.export().unwrap()).unwrap();

    let query = &dataset.clustering[0].vector;
    assert_eq!(
        stay.predict(query).unwrap().predicted_days,
        restored.predict(query).unwrap().predicted_days
    );
}
