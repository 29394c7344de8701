//! Integration test: Artifact store on the local file system

mod common;

use churn_pipeline::error::PipelineError;
use churn_pipeline::inference::{PredictionBatch, PredictionRow};
use churn_pipeline::preprocessing::{FeatureTransform, FittedTransform, RawDataset};
use churn_pipeline::store::{Artifact, ArtifactKey, ArtifactStore};
use churn_pipeline::training::SelectedModel;
use churn_pipeline::utils::DataLoader;
use common::training_csv;
use std::fs;

fn fitted() -> FittedTransform {
    let frame = DataLoader::new()
        .load_csv_bytes(training_csv(20).as_bytes())
        .unwrap();
    FeatureTransform::default().fit(&frame).unwrap().1
}

fn batch(prefix: &str, date: &str) -> PredictionBatch {
    PredictionBatch::new(
        (0..3)
            .map(|i| PredictionRow {
                customer_id: format!("{}{}", prefix, i),
                predicted_label: (i % 2) as i32,
                probability: if i % 2 == 1 { 0.75 } else { 0.25 },
                prediction_date: date.to_string(),
            })
            .collect(),
    )
}

#[test]
fn test_blob_survives_a_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let transform = fitted();
    ArtifactStore::local(dir.path()).save(&transform).unwrap();

    let reopened = ArtifactStore::local(dir.path());
    let loaded: FittedTransform = reopened.load().unwrap();
    assert_eq!(loaded, transform);
    assert!(dir.path().join("models/preprocessor.bin").is_file());
}

#[test]
fn test_raw_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::local(dir.path());
    let frame = DataLoader::new()
        .load_csv_bytes(training_csv(10).as_bytes())
        .unwrap();
    store.save(&RawDataset::new(frame.clone())).unwrap();

    let loaded: RawDataset = store.load().unwrap();
    assert_eq!(loaded.frame.shape(), frame.shape());
    assert!(loaded.frame.equals(&frame));
}

#[test]
fn test_corrupted_blob_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::local(dir.path());
    store.save(&fitted()).unwrap();

    let path = dir.path().join(ArtifactKey::FittedTransform.location());
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, bytes).unwrap();

    assert!(matches!(
        store.load::<FittedTransform>(),
        Err(PipelineError::SerializationError(_))
    ));
}

#[test]
fn test_blob_kind_is_checked() {
    let transform = fitted();
    let bytes = transform.to_bytes().unwrap();
    assert!(SelectedModel::from_bytes(&bytes).is_err());
}

#[test]
fn test_missing_model_names_producer() {
    let dir = tempfile::tempdir().unwrap();
    let err = ArtifactStore::local(dir.path())
        .load::<SelectedModel>()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "artifact 'selected model' is missing (produced by the train stage)"
    );
}

#[test]
fn test_history_appends_whole_batches() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::local(dir.path());
    store.append_predictions(&batch("a", "2024-01-01 09:00:00")).unwrap();
    store.append_predictions(&PredictionBatch::default()).unwrap();
    store.append_predictions(&batch("b", "2024-02-01 09:00:00")).unwrap();

    let text = fs::read_to_string(dir.path().join("db/churn_predictions.csv")).unwrap();
    assert_eq!(text.matches("customer_id").count(), 1);
    assert_eq!(text.lines().count(), 7);

    let history = store.prediction_history().unwrap();
    assert_eq!(history.len(), 6);
    assert_eq!(history.rows()[0].customer_id, "a0");
    assert_eq!(history.latest_first()[0].customer_id, "b0");
    assert_eq!(history.latest_first()[5].customer_id, "a2");
}
