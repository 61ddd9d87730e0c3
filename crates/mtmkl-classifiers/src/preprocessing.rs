//! Per-column standardization applied before data reaches the classifier.
//!
//! The classifier itself never scales; callers that want zero-mean,
//! unit-variance features fit a [`StandardScaler`] on the training matrix and
//! reuse it for every later batch.
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{MtmklError, Result};

/// Standard scaler (per-column mean/std).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f64 = 1e-12;

    /// Fit column means and population standard deviations.
    pub fn fit(x: ArrayView2<f64>) -> Result<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(MtmklError::EmptyInput(format!(
                "scaler requires a non-empty matrix, got {:?}",
                x.dim()
            )));
        }
        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            MtmklError::EmptyInput("scaler requires at least one row".to_string())
        })?;
        let std = x.std_axis(Axis(0), 0.0).mapv(|s| s.max(Self::MIN_STD));
        Ok(StandardScaler { mean, std })
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(MtmklError::InputShape(format!(
                "scaler was fitted on {} columns but input has {}",
                self.mean.len(),
                x.ncols()
            )));
        }
        Ok((&x - &self.mean) / &self.std)
    }

    pub fn fit_transform(x: ArrayView2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }
}
