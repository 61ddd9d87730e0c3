use anyhow::{Context, Result};
use log::info;

use mtmkl_classifiers::io::read_labeled_csv;
use mtmkl_classifiers::models::{ClassifierModel, MajorityClassifier, MtmklClassifier};
use mtmkl_classifiers::preprocessing::StandardScaler;

use crate::artifact::ModelArtifact;
use crate::train::input::TrainConfig;

/// Fit a classifier on `config.train_data` and write the artifact to
/// `config.output_file`.
pub fn run_training(config: &TrainConfig) -> Result<ModelArtifact> {
    let data = read_labeled_csv(&config.train_data, &config.reader_config())?;
    let y = data.labels()?.to_vec();
    info!(
        "Loaded {} samples with {} features from {}",
        data.x.nrows(),
        data.x.ncols(),
        config.train_data
    );

    let (scaler, x) = if config.scale_features {
        let (scaler, scaled) = StandardScaler::fit_transform(data.x.view())?;
        (Some(scaler), scaled)
    } else {
        (None, data.x.clone())
    };

    let mut classifier = MtmklClassifier::new(config.model.clone());
    classifier
        .fit(x.view(), &y)
        .context("Failed to fit MTMKL classifier")?;

    for (class, weights) in classifier.kernel_importances()? {
        let accuracy = classifier.task(class).map(|t| t.accuracy).unwrap_or_default();
        info!(
            "Class {}: cross-validated accuracy {:.4}, kernel weights {:?}",
            class, accuracy, weights
        );
    }
    let train_accuracy = classifier.score(x.view(), &y)?;
    info!("Training accuracy: {:.4}", train_accuracy);

    let mut baseline = MajorityClassifier::new();
    baseline.fit(x.view(), &y)?;

    let artifact = ModelArtifact {
        feature_names: data.feature_names,
        scaler,
        classifier,
        baseline: Some(baseline),
    };
    artifact.save(&config.output_file)?;
    info!("Model written to {}", config.output_file);

    Ok(artifact)
}
