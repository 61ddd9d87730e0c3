use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use mtmkl_classifiers::io::{read_csv_dataset, read_labeled_csv, write_predictions};
use mtmkl_classifiers::models::{ClassifierModel, MajorityClassifier};

use crate::artifact::ModelArtifact;

/// Accuracy of a stored model on a labeled dataset, next to the majority baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub n_samples: usize,
    pub accuracy: f64,
    pub baseline_accuracy: f64,
}

/// Predict every row of `data_path` and write class plus per-class
/// probabilities to `output` (stdout when `None`).
pub fn run_prediction(
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
    label_column: &str,
) -> Result<()> {
    let artifact = ModelArtifact::load(model_path)?;
    let data = read_csv_dataset(data_path, &artifact.reader_config(data_path, label_column))?;
    let x = artifact.prepare(data.x.view())?;

    let proba = artifact.classifier.predict_proba(x.view())?;
    let predictions = artifact.classifier.predict_from_proba(proba.view())?;
    let classes = artifact.classifier.classes()?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    write_predictions(writer, classes, &predictions, proba.view())?;

    if let Some(path) = output {
        info!("Wrote {} predictions to {}", predictions.len(), path.display());
    }
    Ok(())
}

/// Score a stored model against the labels in `data_path`.
///
/// The baseline is the majority class of the training labels when the
/// artifact carries one, otherwise the majority class of the scored labels.
pub fn run_scoring(model_path: &Path, data_path: &Path, label_column: &str) -> Result<ScoreSummary> {
    let artifact = ModelArtifact::load(model_path)?;
    let data = read_labeled_csv(data_path, &artifact.reader_config(data_path, label_column))?;
    let y = data.labels()?;
    let x = artifact.prepare(data.x.view())?;

    let accuracy = artifact.classifier.score(x.view(), y)?;
    let baseline = match &artifact.baseline {
        Some(baseline) => baseline.clone(),
        None => {
            let mut baseline = MajorityClassifier::new();
            baseline.fit(x.view(), y)?;
            baseline
        }
    };
    let baseline_accuracy = baseline.score(x.view(), y)?;

    Ok(ScoreSummary {
        n_samples: y.len(),
        accuracy,
        baseline_accuracy,
    })
}
