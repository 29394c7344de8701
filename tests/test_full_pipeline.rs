//! Integration test: Full pipeline (ingest → transform → train → predict)

mod common;

use churn_pipeline::config::PipelineConfig;
use churn_pipeline::error::PipelineError;
use churn_pipeline::inference::DECISION_THRESHOLD;
use churn_pipeline::pipeline::{Pipeline, PipelineState, Stage};
use churn_pipeline::preprocessing::ProcessedDataset;
use churn_pipeline::store::ArtifactKey;
use churn_pipeline::training::{RandomForestConfig, TrainingConfig};
use common::{new_customers_csv, single_class_csv, training_csv, write, FEATURE_WIDTH};
use tempfile::TempDir;

fn setup(with_ids: bool) -> (TempDir, Pipeline) {
    let dir = tempfile::tempdir().unwrap();
    let raw = write(dir.path(), "churn.csv", &training_csv(100));
    let new = write(dir.path(), "new_customers.csv", &new_customers_csv(10, with_ids));

    let training = TrainingConfig::default()
        .with_forest(RandomForestConfig::default().with_n_estimators(30));
    let config = PipelineConfig::default()
        .with_raw_data(raw)
        .with_new_customers(new)
        .with_artifact_root(dir.path().join("store"))
        .with_training(training);
    (dir, Pipeline::new(config))
}

#[test]
fn test_end_to_end_scenario() {
    let (dir, pipeline) = setup(true);
    let report = pipeline.run().unwrap();

    assert_eq!(report.state, PipelineState::Predicted);
    assert_eq!(report.ingested_rows, 100);
    assert_eq!(report.n_features, FEATURE_WIDTH);
    assert_eq!(
        report.stage_timings.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
        Stage::ALL.to_vec()
    );

    let dataset: ProcessedDataset = pipeline.store().load().unwrap();
    assert_eq!(dataset.n_samples(), 100);
    assert_eq!(dataset.n_features(), FEATURE_WIDTH);
    assert_eq!(dataset.positives(), 20);

    let auc = report.training.selected.evaluation.auc;
    assert!((0.0..=1.0).contains(&auc));

    assert_eq!(report.predictions.len(), 10);
    for row in report.predictions.rows() {
        assert!((0.0..=1.0).contains(&row.probability));
        assert_eq!(row.predicted_label == 1, row.probability >= DECISION_THRESHOLD);
        assert!(row.customer_id.starts_with('N'));
    }

    for key in ArtifactKey::ALL {
        assert!(pipeline.store().exists(key), "{} not stored", key);
    }
    assert!(dir.path().join("store/models/churn_model.bin").is_file());
    assert!(dir.path().join("store/db/churn_predictions.csv").is_file());
}

#[test]
fn test_predict_before_training_writes_nothing() {
    let (_dir, pipeline) = setup(true);
    pipeline.ingest().unwrap();
    pipeline.transform().unwrap();

    match pipeline.predict().unwrap_err() {
        PipelineError::ArtifactMissing { artifact, stage } => {
            assert_eq!(artifact, ArtifactKey::SelectedModel);
            assert_eq!(stage, Stage::Train);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!pipeline.store().exists(ArtifactKey::PredictionHistory));
}

#[test]
fn test_predict_on_empty_store() {
    let (_dir, pipeline) = setup(true);
    let err = pipeline.predict().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::ArtifactMissing {
            artifact: ArtifactKey::FittedTransform,
            stage: Stage::Transform
        }
    ));
}

#[test]
fn test_prediction_history_is_append_only() {
    let (_dir, pipeline) = setup(true);
    let first = pipeline.run().unwrap().predictions;
    let after_first = pipeline.prediction_history().unwrap();
    assert_eq!(after_first.len(), 10);

    pipeline.predict().unwrap();
    let after_second = pipeline.prediction_history().unwrap();
    assert_eq!(after_second.len(), 20);

    for (stored, original) in after_second.rows()[..10].iter().zip(first.rows()) {
        assert_eq!(stored.customer_id, original.customer_id);
        assert_eq!(stored.predicted_label, original.predicted_label);
        assert_eq!(stored.prediction_date, original.prediction_date);
        assert!((stored.probability - original.probability).abs() < 1e-9);
    }
    assert_eq!(&after_second.rows()[..10], after_first.rows());
}

#[test]
fn test_rerun_rebuilds_every_stage() {
    let (_dir, pipeline) = setup(true);
    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();

    assert_eq!(second.stage_timings.len(), 4);
    assert_eq!(
        first.training.selected.kind(),
        second.training.selected.kind()
    );
    assert_eq!(pipeline.prediction_history().unwrap().len(), 20);
}

#[test]
fn test_failed_retrain_leaves_model_unusable_with_new_transform() {
    let (dir, pipeline) = setup(true);
    pipeline.run().unwrap();

    write(dir.path(), "churn.csv", &single_class_csv(50));
    pipeline.ingest().unwrap();
    pipeline.transform().unwrap();
    assert!(matches!(pipeline.train(), Err(PipelineError::DataError(_))));

    match pipeline.predict().unwrap_err() {
        PipelineError::ShapeError { expected, actual } => {
            assert!(expected.contains("gender_Female"), "{}", expected);
            assert!(actual.contains("gender_F'"), "{}", actual);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(pipeline.prediction_history().unwrap().len(), 10);
}

#[test]
fn test_positions_replace_missing_identifiers() {
    let (_dir, pipeline) = setup(false);
    let report = pipeline.run().unwrap();
    let ids: Vec<&str> = report
        .predictions
        .rows()
        .iter()
        .map(|r| r.customer_id.as_str())
        .collect();
    let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_missing_raw_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere.csv");
    let config = PipelineConfig::default()
        .with_raw_data(&missing)
        .with_artifact_root(dir.path());

    match Pipeline::new(config).ingest().unwrap_err() {
        PipelineError::MissingInputFile { path } => assert_eq!(path, missing),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_new_customers_file() {
    let (dir, pipeline) = setup(true);
    std::fs::remove_file(dir.path().join("new_customers.csv")).unwrap();

    pipeline.ingest().unwrap();
    pipeline.transform().unwrap();
    pipeline.train().unwrap();
    assert!(matches!(
        pipeline.predict(),
        Err(PipelineError::MissingInputFile { .. })
    ));
    assert!(!pipeline.store().exists(ArtifactKey::PredictionHistory));
}
