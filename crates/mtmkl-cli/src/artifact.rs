//! On-disk bundle of everything needed to reuse a trained classifier.
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use mtmkl_classifiers::io::CsvReaderConfig;
use mtmkl_classifiers::models::{MajorityClassifier, MtmklClassifier};
use mtmkl_classifiers::preprocessing::StandardScaler;

use crate::util::delimiter_for;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature columns in the order the classifier was trained on.
    pub feature_names: Vec<String>,
    /// Present when features were standardized before fitting.
    pub scaler: Option<StandardScaler>,
    pub classifier: MtmklClassifier,
    /// Majority-class baseline fitted on the same training labels.
    #[serde(default)]
    pub baseline: Option<MajorityClassifier>,
}

impl ModelArtifact {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize model")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write model: {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model: {}", path.as_ref().display()))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model: {}", path.as_ref().display()))?;
        if !artifact.classifier.is_fitted() {
            return Err(anyhow!(
                "Model file {} holds an unfitted classifier",
                path.as_ref().display()
            ));
        }
        Ok(artifact)
    }

    /// Reader settings that select exactly the training feature columns of `data_path`.
    pub fn reader_config<P: AsRef<Path>>(&self, data_path: P, label_column: &str) -> CsvReaderConfig {
        CsvReaderConfig {
            label_column: label_column.to_string(),
            feature_columns: Some(self.feature_names.clone()),
            delimiter: delimiter_for(data_path),
        }
    }

    /// Apply the stored scaler, if any.
    pub fn prepare(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        match &self.scaler {
            Some(scaler) => Ok(scaler.transform(x)?),
            None => Ok(x.to_owned()),
        }
    }
}
