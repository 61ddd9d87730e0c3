//! Multi-task multiple-kernel-learning classifier.
//!
//! Every class is a one-vs-rest task with its own kernel blend and its own
//! precomputed-kernel SVM. Task probabilities are stacked column-wise in the
//! sorted class order and renormalized per row.
use std::collections::{BTreeMap, BTreeSet};

use log::info;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MtmklConfig;
use crate::error::{MtmklError, Result};
use crate::kernels::{combine, KernelWeights};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::svm::PrecomputedSvm;
use crate::optimizer::TaskWeightOptimizer;

/// Everything needed to score one class at inference time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskModel {
    pub svm: PrecomputedSvm,
    pub kernel_weights: KernelWeights,
    /// Cross-validated accuracy reached by `kernel_weights` during fit.
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedState {
    x_train: Array2<f64>,
    classes: Vec<i32>,
    tasks: BTreeMap<i32, TaskModel>,
}

/// The MTMKL classifier.
///
/// The fitted state (training matrix, class set, per-class task models) is
/// replaced wholesale by each successful [`fit`](Self::fit) and cleared by a
/// failed one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MtmklClassifier {
    config: MtmklConfig,
    fitted: Option<FittedState>,
}

impl MtmklClassifier {
    pub fn new(config: MtmklConfig) -> Self {
        MtmklClassifier {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &MtmklConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Sorted class labels discovered by `fit`.
    pub fn classes(&self) -> Result<&[i32]> {
        Ok(&self.state()?.classes)
    }

    /// Column count of the training matrix.
    pub fn n_features(&self) -> Result<usize> {
        Ok(self.state()?.x_train.ncols())
    }

    pub fn task(&self, class: i32) -> Option<&TaskModel> {
        self.fitted.as_ref().and_then(|s| s.tasks.get(&class))
    }

    /// Converged kernel weights of every task.
    pub fn kernel_importances(&self) -> Result<BTreeMap<i32, &KernelWeights>> {
        Ok(self
            .state()?
            .tasks
            .iter()
            .map(|(&class, task)| (class, &task.kernel_weights))
            .collect())
    }

    fn state(&self) -> Result<&FittedState> {
        self.fitted.as_ref().ok_or(MtmklError::NotFitted)
    }

    /// Fit one task per class on `x` (samples x features) and labels `y`.
    ///
    /// # Errors
    ///
    /// Configuration, shape, emptiness and finiteness violations, plus any
    /// task that fails to optimize. The model is left unfitted on error.
    pub fn fit(&mut self, x: ArrayView2<f64>, y: &[i32]) -> Result<&mut Self> {
        self.fitted = None;
        self.config.validate()?;
        check_training_input(x, y)?;

        let classes: Vec<i32> = y.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        info!(
            "Fitting MTMKL classifier: {} samples, {} features, {} classes, kernels {:?}",
            x.nrows(),
            x.ncols(),
            classes.len(),
            self.config.kernels
        );

        let optimizer = TaskWeightOptimizer::new(&self.config);
        let tasks: BTreeMap<i32, TaskModel> = classes
            .par_iter()
            .map(|&class| {
                fit_task(&optimizer, &self.config, x, y, class).map(|task| (class, task))
            })
            .collect::<Result<_>>()?;

        self.fitted = Some(FittedState {
            x_train: x.to_owned(),
            classes,
            tasks,
        });
        Ok(self)
    }

    /// Class probabilities, one column per class in sorted class order.
    ///
    /// # Errors
    ///
    /// [`MtmklError::NotFitted`] before `fit`; [`MtmklError::InputShape`]
    /// when `x` has a different column count than the training matrix.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let state = self.state()?;
        if x.ncols() != state.x_train.ncols() {
            return Err(MtmklError::InputShape(format!(
                "model was fitted on {} features but input has {}",
                state.x_train.ncols(),
                x.ncols()
            )));
        }
        check_finite(x)?;

        let columns: Vec<Array1<f64>> = state
            .classes
            .par_iter()
            .map(|class| {
                let task = state.tasks.get(class).ok_or(MtmklError::NotFitted)?;
                let cross = combine(&task.kernel_weights, x, state.x_train.view())?;
                task.svm.predict_positive_proba(cross.view())
            })
            .collect::<Result<_>>()?;

        let mut proba = Array2::zeros((x.nrows(), state.classes.len()));
        for (j, column) in columns.iter().enumerate() {
            proba.column_mut(j).assign(column);
        }
        normalize_rows(&mut proba);
        Ok(proba)
    }

    /// Most probable class per row; ties go to the smaller class label.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<i32>> {
        let proba = self.predict_proba(x)?;
        self.predict_from_proba(proba.view())
    }

    /// Class labels for rows already returned by [`Self::predict_proba`].
    ///
    /// # Errors
    ///
    /// [`MtmklError::NotFitted`] before `fit` or when the fitted class list is
    /// empty; [`MtmklError::InputShape`] when `proba` has a column count other
    /// than the number of classes.
    pub fn predict_from_proba(&self, proba: ArrayView2<f64>) -> Result<Vec<i32>> {
        let state = self.state()?;
        if proba.ncols() != state.classes.len() {
            return Err(MtmklError::InputShape(format!(
                "probabilities have {} columns but the model has {} classes",
                proba.ncols(),
                state.classes.len()
            )));
        }
        proba
            .rows()
            .into_iter()
            .map(|row| state.classes.get(argmax(row)).copied().ok_or(MtmklError::NotFitted))
            .collect()
    }

    /// Fraction of `predict(x)` equal to `y`.
    pub fn score(&self, x: ArrayView2<f64>, y: &[i32]) -> Result<f64> {
        ClassifierModel::score(self, x, y)
    }
}

impl ClassifierModel for MtmklClassifier {
    fn fit(&mut self, x: ArrayView2<f64>, y: &[i32]) -> Result<()> {
        MtmklClassifier::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<i32>> {
        MtmklClassifier::predict(self, x)
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        MtmklClassifier::predict_proba(self, x)
    }

    fn name(&self) -> &str {
        "mtmkl"
    }
}

fn fit_task(
    optimizer: &TaskWeightOptimizer,
    config: &MtmklConfig,
    x: ArrayView2<f64>,
    y: &[i32],
    class: i32,
) -> Result<TaskModel> {
    info!("Training for task (class) {}...", class);
    let y_task: Vec<u8> = y.iter().map(|&label| u8::from(label == class)).collect();

    let optimum = optimizer.optimize(class, x, &y_task, config.initial_weights.get(&class))?;
    let gram = combine(&optimum.weights, x, x)?;
    let svm = PrecomputedSvm::fit_with_probability(
        gram.view(),
        &y_task,
        &config.svm_params(),
        config.seed,
    )?;

    info!(
        "Task {}: accuracy {:.4} after {} round(s){}, weights {:?}",
        class,
        optimum.accuracy,
        optimum.rounds,
        if optimum.converged { "" } else { " (not converged)" },
        optimum.weights
    );

    Ok(TaskModel {
        svm,
        kernel_weights: optimum.weights,
        accuracy: optimum.accuracy,
    })
}

fn check_training_input(x: ArrayView2<f64>, y: &[i32]) -> Result<()> {
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
    check_finite(x)
}

fn check_finite(x: ArrayView2<f64>) -> Result<()> {
    match x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), value)) => Err(MtmklError::NonFiniteInput(format!(
            "value {} at row {}, column {}",
            value, row, col
        ))),
        None => Ok(()),
    }
}

/// Scale each row to sum to one; rows without positive finite mass become uniform.
fn normalize_rows(proba: &mut Array2<f64>) {
    let n_classes = proba.ncols();
    for mut row in proba.rows_mut() {
        let total = row.sum();
        if total > 0.0 && total.is_finite() && row.iter().all(|p| p.is_finite()) {
            row.mapv_inplace(|p| p / total);
        } else {
            row.fill(1.0 / n_classes as f64);
        }
    }
}

/// Index of the first maximum.
fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (j, &p) in row.iter().enumerate() {
        if p > row[best] {
            best = j;
        }
    }
    best
}
