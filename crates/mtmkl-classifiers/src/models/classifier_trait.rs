use ndarray::{Array2, ArrayView2};

use crate::error::{MtmklError, Result};
use crate::stats::accuracy;

/// Common contract for the multi-class classifiers in this crate.
///
/// Labels are arbitrary `i32` class ids; probability columns follow the
/// sorted set of classes seen by `fit`.
pub trait ClassifierModel {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[i32]) -> Result<()>;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<i32>>;

    /// One row per sample, one column per class, rows summing to one.
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>>;

    /// Accuracy of `predict(x)` against `y`.
    fn score(&self, x: ArrayView2<f64>, y: &[i32]) -> Result<f64> {
        if x.nrows() != y.len() {
            return Err(MtmklError::InputShape(format!(
                "{} samples but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(MtmklError::EmptyInput("cannot score zero samples".to_string()));
        }
        let predicted = self.predict(x)?;
        Ok(accuracy(y, &predicted))
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
