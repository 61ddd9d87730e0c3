use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{MtmklError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Predicts the most frequent training label for every sample.
///
/// Ties go to the smallest label. Probabilities are the training class
/// frequencies, identical for every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MajorityClassifier {
    classes: Vec<i32>,
    frequencies: Vec<f64>,
}

impl MajorityClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> &[i32] {
        &self.classes
    }

    /// The predicted label, if fitted.
    pub fn majority(&self) -> Option<i32> {
        let mut best: Option<(i32, f64)> = None;
        for (&class, &freq) in self.classes.iter().zip(&self.frequencies) {
            if best.map_or(true, |(_, f)| freq > f) {
                best = Some((class, freq));
            }
        }
        best.map(|(class, _)| class)
    }
}

impl ClassifierModel for MajorityClassifier {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[i32]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(MtmklError::InputShape(format!(
                "feature matrix has {} rows but {} labels were given",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(MtmklError::EmptyInput("cannot fit on zero samples".to_string()));
        }

        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for &label in y {
            *counts.entry(label).or_insert(0) += 1;
        }
        self.classes = counts.keys().copied().collect();
        self.frequencies = counts
            .values()
            .map(|&c| c as f64 / y.len() as f64)
            .collect();
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<i32>> {
        let label = self.majority().ok_or(MtmklError::NotFitted)?;
        Ok(vec![label; x.nrows()])
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(MtmklError::NotFitted);
        }
        let row = Array1::from_vec(self.frequencies.clone());
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for mut r in proba.rows_mut() {
            r.assign(&row);
        }
        Ok(proba)
    }

    fn name(&self) -> &str {
        "majority"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicts_most_frequent_label() {
        let x = Array2::<f64>::zeros((5, 1));
        let mut model = MajorityClassifier::new();
        model.fit(x.view(), &[2, 1, 2, 0, 2]).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), vec![2; 5]);
        assert_eq!(model.score(x.view(), &[2, 1, 2, 0, 2]).unwrap(), 0.6);

        let proba = model.predict_proba(x.view()).unwrap();
        assert_eq!(proba.row(0).to_vec(), vec![0.2, 0.2, 0.6]);
    }

    #[test]
    fn ties_go_to_smallest_label() {
        let x = Array2::<f64>::zeros((4, 1));
        let mut model = MajorityClassifier::new();
        model.fit(x.view(), &[3, 1, 3, 1]).unwrap();
        assert_eq!(model.majority(), Some(1));
    }

    #[test]
    fn unfitted_model_is_rejected() {
        let x = Array2::<f64>::zeros((1, 1));
        let model = MajorityClassifier::new();
        assert!(matches!(model.predict(x.view()), Err(MtmklError::NotFitted)));
    }
}
