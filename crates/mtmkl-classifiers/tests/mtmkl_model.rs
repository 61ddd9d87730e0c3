use ndarray::{array, Array2};

use mtmkl_classifiers::config::MtmklConfig;
use mtmkl_classifiers::error::MtmklError;
use mtmkl_classifiers::kernels::{KernelKind, KernelWeights};
use mtmkl_classifiers::models::{ClassifierModel, MajorityClassifier, MtmklClassifier};

/// Three compact blobs of five points each, labelled 0, 1 and 2.
fn three_blobs() -> (Array2<f64>, Vec<i32>) {
    let centers = [(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)];
    let offsets = [(0.1, 0.2), (-0.2, 0.1), (0.15, -0.1), (-0.1, -0.2), (0.0, 0.05)];
    let mut data = Vec::new();
    let mut labels = Vec::new();
    for (class, (cx, cy)) in centers.iter().enumerate() {
        for (dx, dy) in offsets {
            data.push(cx + dx);
            data.push(cy + dy);
            labels.push(class as i32);
        }
    }
    let x = Array2::from_shape_vec((labels.len(), 2), data).unwrap();
    (x, labels)
}

fn fitted(config: MtmklConfig) -> MtmklClassifier {
    let (x, y) = three_blobs();
    let mut model = MtmklClassifier::new(config);
    model.fit(x.view(), &y).unwrap();
    model
}

// ---------------------------------------------------------------------------
// Probabilities and predictions
// ---------------------------------------------------------------------------

#[test]
fn probability_rows_are_distributions() {
    let (x, _) = three_blobs();
    let model = fitted(MtmklConfig::default());
    let proba = model.predict_proba(x.view()).unwrap();

    assert_eq!(proba.dim(), (15, 3));
    for row in proba.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-6);
        assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}

#[test]
fn three_classes_score_at_least_the_majority_baseline() {
    let (x, y) = three_blobs();
    let model = fitted(MtmklConfig::default());

    let predictions = model.predict(x.view()).unwrap();
    assert!(predictions.iter().all(|p| [0, 1, 2].contains(p)));

    let mut baseline = MajorityClassifier::new();
    baseline.fit(x.view(), &y).unwrap();
    let score = model.score(x.view(), &y).unwrap();
    assert!(score >= baseline.score(x.view(), &y).unwrap());
    assert!(score > 0.9);
}

#[test]
fn two_separable_points_are_classified() {
    let x = array![[-1.0], [1.0]];
    let y = [0, 1];
    let mut model = MtmklClassifier::default();
    model.fit(x.view(), &y).unwrap();

    for class in [0, 1] {
        assert!(model.task(class).unwrap().accuracy > 0.99);
    }
    assert_eq!(model.predict(x.view()).unwrap(), vec![0, 1]);
}

#[test]
fn predict_is_idempotent() {
    let (x, _) = three_blobs();
    let model = fitted(MtmklConfig::default());
    let first = model.predict(x.view()).unwrap();
    let second = model.predict(x.view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn identical_fits_give_identical_probabilities() {
    let (x, _) = three_blobs();
    let a = fitted(MtmklConfig::default().with_seed(11));
    let b = fitted(MtmklConfig::default().with_seed(11));
    assert_eq!(
        a.predict_proba(x.view()).unwrap(),
        b.predict_proba(x.view()).unwrap()
    );
}

#[test]
fn kernel_importances_are_normalized() {
    let model = fitted(MtmklConfig::default());
    let importances = model.kernel_importances().unwrap();
    assert_eq!(importances.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    for weights in importances.values() {
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!(weights.iter().all(|(_, w)| w >= 0.0));
    }
    assert_eq!(model.n_features().unwrap(), 2);
}

#[test]
fn warm_start_weights_are_respected_by_the_kernel_set() {
    let initial = KernelWeights::new([(KernelKind::Linear, 1.0)]).unwrap();
    let config = MtmklConfig::default()
        .with_kernels(vec![KernelKind::Linear, KernelKind::Rbf])
        .with_initial_weights(1, initial.clone());
    let model = fitted(config);

    for weights in model.kernel_importances().unwrap().values() {
        assert_eq!(weights.kernels(), vec![KernelKind::Linear, KernelKind::Rbf]);
    }
    // the configured warm start is never rewritten
    assert_eq!(model.config().initial_weights[&1], initial);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn inference_before_fit_fails() {
    let (x, _) = three_blobs();
    let model = MtmklClassifier::default();
    assert!(matches!(model.predict_proba(x.view()), Err(MtmklError::NotFitted)));
}

#[test]
fn column_mismatch_is_rejected() {
    let model = fitted(MtmklConfig::default());
    let wide = Array2::<f64>::zeros((2, 3));
    assert!(matches!(model.predict_proba(wide.view()), Err(MtmklError::InputShape(_))));
}

#[test]
fn score_checks_label_length() {
    let (x, _) = three_blobs();
    let model = fitted(MtmklConfig::default());
    assert!(matches!(model.score(x.view(), &[0, 1]), Err(MtmklError::InputShape(_))));
}

#[test]
fn failed_refit_leaves_model_unfitted() {
    let mut model = fitted(MtmklConfig::default());
    assert!(model.is_fitted());
    let bad = array![[f64::INFINITY, 0.0]];
    assert!(model.fit(bad.view(), &[0]).is_err());
    assert!(!model.is_fitted());
}

#[test]
fn invalid_config_is_rejected_at_fit() {
    let (x, y) = three_blobs();
    let mut model = MtmklClassifier::new(MtmklConfig::default().with_c(-1.0));
    assert!(matches!(model.fit(x.view(), &y), Err(MtmklError::InvalidConfig(_))));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn json_round_trip_reproduces_predictions() {
    let (x, _) = three_blobs();
    let model = fitted(MtmklConfig::default());
    let json = serde_json::to_string(&model).unwrap();
    let restored: MtmklClassifier = serde_json::from_str(&json).unwrap();

    assert_eq!(model.predict(x.view()).unwrap(), restored.predict(x.view()).unwrap());
    let before = model.predict_proba(x.view()).unwrap();
    let after = restored.predict_proba(x.view()).unwrap();
    for (a, b) in before.iter().zip(after.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn config_loads_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"kernels": ["poly", "rbf"], "degenerate_policy": "final_weights", "solver": {"eps": 0.01}}"#,
    )
    .unwrap();

    let cfg: MtmklConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(cfg.kernels, vec![KernelKind::Polynomial, KernelKind::Rbf]);
    assert_eq!(cfg.solver.eps, 0.01);
    assert_eq!(cfg.solver.probability_folds, 5);
    assert!(cfg.validate().is_ok());
}
