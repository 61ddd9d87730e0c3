use std::io::Write;

use ndarray::array;

use mtmkl_classifiers::io::{read_csv_dataset, read_labeled_csv, write_predictions, CsvReaderConfig};
use mtmkl_classifiers::preprocessing::StandardScaler;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

#[test]
fn reads_features_and_labels() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "data.csv", "a,label,b\n1.0,2,0.5\n-1.5,0,2\n");

    let data = read_labeled_csv(&path, &CsvReaderConfig::default()).unwrap();
    assert_eq!(data.feature_names, vec!["a", "b"]);
    assert_eq!(data.x, array![[1.0, 0.5], [-1.5, 2.0]]);
    assert_eq!(data.labels().unwrap(), &[2, 0]);
}

#[test]
fn selected_columns_keep_requested_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "data.tsv", "id\tb\ta\tLabel\n7\t1\t2\t1\n");
    let config = CsvReaderConfig {
        feature_columns: Some(vec!["a".to_string(), "b".to_string()]),
        delimiter: b'\t',
        ..CsvReaderConfig::default()
    };

    let data = read_labeled_csv(&path, &config).unwrap();
    assert_eq!(data.x, array![[2.0, 1.0]]);
    assert_eq!(data.labels().unwrap(), &[1]);
}

#[test]
fn label_column_is_optional_for_inference() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "data.csv", "a,b\n1,2\n3,4\n");

    let data = read_csv_dataset(&path, &CsvReaderConfig::default()).unwrap();
    assert!(data.y.is_none());
    assert_eq!(data.x.dim(), (2, 2));
    assert!(read_labeled_csv(&path, &CsvReaderConfig::default()).is_err());
}

#[test]
fn malformed_values_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let bad_feature = write_file(&dir, "bad_feature.csv", "a,label\nfoo,1\n");
    assert!(read_labeled_csv(&bad_feature, &CsvReaderConfig::default()).is_err());

    let bad_label = write_file(&dir, "bad_label.csv", "a,label\n1.0,x\n");
    assert!(read_labeled_csv(&bad_label, &CsvReaderConfig::default()).is_err());

    let missing = CsvReaderConfig {
        feature_columns: Some(vec!["nope".to_string()]),
        ..CsvReaderConfig::default()
    };
    let ok = write_file(&dir, "ok.csv", "a,label\n1.0,1\n");
    assert!(read_labeled_csv(&ok, &missing).is_err());
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[test]
fn predictions_are_written_with_probability_columns() {
    let proba = array![[0.25, 0.75], [1.0, 0.0]];
    let mut buffer = Vec::new();
    write_predictions(&mut buffer, &[3, 5], &[5, 3], proba.view()).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text, "prediction,proba_3,proba_5\n5,0.25,0.75\n3,1,0\n");
}

#[test]
fn mismatched_prediction_shapes_are_rejected() {
    let proba = array![[0.5, 0.5]];
    let mut buffer = Vec::new();
    assert!(write_predictions(&mut buffer, &[0, 1, 2], &[0], proba.view()).is_err());
}

// ---------------------------------------------------------------------------
// Scaler
// ---------------------------------------------------------------------------

#[test]
fn scaler_survives_json_round_trip() {
    let x = array![[1.0, 5.0], [3.0, 7.0], [5.0, 9.0]];
    let (scaler, scaled) = StandardScaler::fit_transform(x.view()).unwrap();

    let json = serde_json::to_string(&scaler).unwrap();
    let restored: StandardScaler = serde_json::from_str(&json).unwrap();
    let again = restored.transform(x.view()).unwrap();
    for (a, b) in scaled.iter().zip(again.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}
