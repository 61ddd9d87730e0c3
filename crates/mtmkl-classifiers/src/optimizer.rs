//! Per-task kernel weight optimization.
//!
//! Each round reweights the kernels in proportion to how well each one
//! classifies the task on its own, then scores the blended kernel over the
//! same stratified folds. The best blend seen is kept; the loop stops once
//! the weights move less than `tol` (L1) between rounds.
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::config::{DegeneratePolicy, MtmklConfig};
use crate::cross_validation::{Fold, StratifiedKFold};
use crate::error::{MtmklError, Result};
use crate::kernels::kind::STANDALONE_COEF0;
use crate::kernels::{combine_grams, scale_gamma, KernelKind, KernelWeights};
use crate::models::svm::{PrecomputedSvm, SvmParams};
use crate::stats::{accuracy, mean};

/// Converged weights for one task and the cross-validated accuracy they reached.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOptimum {
    pub weights: KernelWeights,
    pub accuracy: f64,
    /// Rounds actually run.
    pub rounds: usize,
    /// Whether the weights settled below `tol` before `max_iter`.
    pub converged: bool,
}

/// Kernel weight optimizer for a single one-vs-rest task.
#[derive(Debug, Clone)]
pub struct TaskWeightOptimizer {
    kernels: Vec<KernelKind>,
    svm: SvmParams,
    max_iter: usize,
    tol: f64,
    cv_folds: usize,
    seed: u64,
    degenerate_policy: DegeneratePolicy,
}

impl TaskWeightOptimizer {
    pub fn new(config: &MtmklConfig) -> Self {
        Self {
            kernels: config.kernels.clone(),
            svm: config.svm_params(),
            max_iter: config.max_iter,
            tol: config.tol,
            cv_folds: config.cv_folds,
            seed: config.seed,
            degenerate_policy: config.degenerate_policy,
        }
    }

    /// Optimize the kernel weights of `task` on features `x` and binary labels `y`.
    ///
    /// `initial` warm-starts the weights; it is aligned to the kernel set and
    /// renormalized, never modified.
    ///
    /// # Errors
    ///
    /// [`MtmklError::DegenerateOptimization`] when no round beats zero accuracy
    /// and the policy is [`DegeneratePolicy::Error`]; shape errors from the
    /// kernels and solver.
    pub fn optimize(
        &self,
        task: i32,
        x: ArrayView2<f64>,
        y: &[u8],
        initial: Option<&KernelWeights>,
    ) -> Result<TaskOptimum> {
        if x.nrows() != y.len() {
            return Err(MtmklError::InputShape(format!(
                "task {}: {} samples but {} labels",
                task,
                x.nrows(),
                y.len()
            )));
        }

        let mut weights = match initial {
            Some(w) => w.aligned_to(&self.kernels)?,
            None => KernelWeights::uniform(&self.kernels)?,
        };

        let folds = StratifiedKFold::new(self.cv_folds).seed(self.seed).split(y);
        log::debug!(
            "Task {}: {} positives / {} samples, {} fold(s)",
            task,
            y.iter().filter(|&&l| l == 1).count(),
            y.len(),
            folds.len()
        );

        let grams: Vec<(KernelKind, Array2<f64>)> = self
            .kernels
            .par_iter()
            .map(|&kernel| kernel.gram(x, x).map(|g| (kernel, g)))
            .collect::<Result<_>>()?;

        // Single-kernel scores depend only on x, y and the fixed folds, so every
        // round would recompute the same values.
        let gamma = scale_gamma(x);
        let kernel_scores: Vec<(KernelKind, f64)> = self
            .kernels
            .par_iter()
            .map(|&kernel| {
                let gram = standalone_gram(kernel, x, gamma)?;
                cross_validated_accuracy(gram.view(), y, &folds, &self.svm).map(|s| (kernel, s))
            })
            .collect::<Result<_>>()?;
        for (kernel, score) in &kernel_scores {
            log::debug!("Task {}: {} kernel alone scores {:.4}", task, kernel, score);
        }

        let mut best: Option<(KernelWeights, f64)> = None;
        let mut best_accuracy = 0.0;
        let mut rounds = 0;
        let mut converged = false;

        while rounds < self.max_iter {
            rounds += 1;
            let previous = weights.clone();

            if let Some(updated) = KernelWeights::from_scores(&kernel_scores) {
                weights = updated;
            }

            let combined = combine_grams(&weights, &grams)?;
            let current = cross_validated_accuracy(combined.view(), y, &folds, &self.svm)?;
            log::debug!(
                "Task {} round {}: combined accuracy {:.4} with {:?}",
                task,
                rounds,
                current,
                weights
            );

            if current > best_accuracy {
                best_accuracy = current;
                best = Some((weights.clone(), current));
            }

            if weights.l1_distance(&previous) < self.tol {
                converged = true;
                break;
            }
        }

        self.settle(task, best, weights, rounds, converged)
    }

    /// Turn the best round (if any) into the task result, applying the
    /// degenerate policy when no round ever beat zero accuracy.
    fn settle(
        &self,
        task: i32,
        best: Option<(KernelWeights, f64)>,
        last: KernelWeights,
        rounds: usize,
        converged: bool,
    ) -> Result<TaskOptimum> {
        match best {
            Some((weights, accuracy)) => Ok(TaskOptimum {
                weights,
                accuracy,
                rounds,
                converged,
            }),
            None => match self.degenerate_policy {
                DegeneratePolicy::Error => Err(MtmklError::DegenerateOptimization { task, rounds }),
                DegeneratePolicy::FinalWeights => {
                    log::warn!(
                        "Task {}: no weight configuration beat zero accuracy in {} round(s); keeping final weights",
                        task,
                        rounds
                    );
                    Ok(TaskOptimum {
                        weights: last,
                        accuracy: 0.0,
                        rounds,
                        converged,
                    })
                }
            },
        }
    }
}

/// Self-Gram used to score `kernel` on its own: variance-scaled `gamma` and a
/// zero independent term, unlike the blended kernel.
fn standalone_gram(kernel: KernelKind, x: ArrayView2<f64>, gamma: f64) -> Result<Array2<f64>> {
    kernel.gram_with(x, x, gamma, STANDALONE_COEF0)
}

/// Mean fold accuracy of a precomputed-kernel SVM over `folds`.
///
/// Each fold trains on the train x train block of `gram` and predicts from
/// the test x train block; kernels are never recomputed per fold.
pub fn cross_validated_accuracy(
    gram: ArrayView2<f64>,
    y: &[u8],
    folds: &[Fold],
    params: &SvmParams,
) -> Result<f64> {
    let scores: Vec<f64> = folds
        .par_iter()
        .map(|fold| {
            let svm = PrecomputedSvm::fit(fold.train_gram(gram).view(), &fold.train_labels(y), params)?;
            let predicted = svm.predict(fold.test_gram(gram).view())?;
            Ok(accuracy(&fold.test_labels(y), &predicted))
        })
        .collect::<Result<_>>()?;
    Ok(mean(&scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn blobs() -> (Array2<f64>, Vec<u8>) {
        let x = array![
            [1.0, 1.2],
            [1.3, 0.8],
            [0.9, 1.1],
            [1.2, 1.4],
            [1.1, 0.9],
            [-1.0, -1.1],
            [-1.2, -0.9],
            [-0.8, -1.3],
            [-1.1, -1.0],
            [-1.4, -1.2]
        ];
        let y = vec![1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
        (x, y)
    }

    #[test]
    fn converged_weights_form_a_distribution() {
        let (x, y) = blobs();
        let optimizer = TaskWeightOptimizer::new(&MtmklConfig::default());
        let optimum = optimizer.optimize(1, x.view(), &y, None).unwrap();

        assert!((optimum.weights.sum() - 1.0).abs() < 1e-9);
        assert!(optimum.weights.iter().all(|(_, w)| w >= 0.0));
        assert!(optimum.accuracy >= 0.8);
        assert!(optimum.converged);
        assert!(optimum.rounds <= 2);
    }

    #[test]
    fn warm_start_is_not_mutated() {
        let (x, y) = blobs();
        let initial = KernelWeights::new([(KernelKind::Linear, 1.0)]).unwrap();
        let snapshot = initial.clone();
        let optimizer = TaskWeightOptimizer::new(&MtmklConfig::default());
        optimizer.optimize(0, x.view(), &y, Some(&initial)).unwrap();
        assert_eq!(initial, snapshot);
    }

    #[test]
    fn all_zero_task_does_not_crash() {
        let (x, _) = blobs();
        let y = vec![0u8; x.nrows()];
        let optimizer = TaskWeightOptimizer::new(&MtmklConfig::default());
        let optimum = optimizer.optimize(7, x.view(), &y, None).unwrap();
        assert_eq!(optimum.accuracy, 1.0);
        assert!((optimum.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn two_samples_use_resubstitution() {
        let x = array![[-1.0], [1.0]];
        let y = vec![0u8, 1u8];
        let optimizer = TaskWeightOptimizer::new(&MtmklConfig::default());
        let optimum = optimizer.optimize(1, x.view(), &y, None).unwrap();
        assert!(optimum.accuracy > 0.99);
    }

    #[test]
    fn held_out_misclassification_scores_zero() {
        // each fold trains on a single class and is tested on the other one
        let x = array![[0.0], [1.0]];
        let y = vec![0u8, 1u8];
        let folds = vec![
            Fold { train_indices: vec![0], test_indices: vec![1] },
            Fold { train_indices: vec![1], test_indices: vec![0] },
        ];
        let gram = KernelKind::Rbf.gram(x.view(), x.view()).unwrap();
        let acc = cross_validated_accuracy(gram.view(), &y, &folds, &SvmParams::default()).unwrap();
        assert_eq!(acc, 0.0);
    }

    #[test]
    fn degenerate_run_follows_policy() {
        let last = KernelWeights::uniform(&KernelKind::ALL).unwrap();

        let strict = TaskWeightOptimizer::new(&MtmklConfig::default());
        assert!(matches!(
            strict.settle(4, None, last.clone(), 2, true),
            Err(MtmklError::DegenerateOptimization { task: 4, rounds: 2 })
        ));

        let lenient = TaskWeightOptimizer::new(
            &MtmklConfig::default().with_degenerate_policy(DegeneratePolicy::FinalWeights),
        );
        let optimum = lenient.settle(4, None, last.clone(), 2, true).unwrap();
        assert_eq!(optimum.weights, last);
        assert_eq!(optimum.accuracy, 0.0);
    }

    #[test]
    fn standalone_kernels_use_scaled_gamma_without_offset() {
        // entries 1, 0, 0, 1: variance 0.25, gamma = 1 / (2 * 0.25) = 2
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let gamma = scale_gamma(x.view());
        assert!((gamma - 2.0).abs() < 1e-12);

        let poly = standalone_gram(KernelKind::Polynomial, x.view(), gamma).unwrap();
        assert!((poly[[0, 0]] - 8.0).abs() < 1e-12);
        assert_eq!(poly[[0, 1]], 0.0);

        let sig = standalone_gram(KernelKind::Sigmoid, x.view(), gamma).unwrap();
        assert!((sig[[0, 0]] - 2.0f64.tanh()).abs() < 1e-12);
        assert_eq!(sig[[1, 0]], 0.0);

        let rbf = standalone_gram(KernelKind::Rbf, x.view(), gamma).unwrap();
        assert!((rbf[[0, 1]] - (-4.0f64).exp()).abs() < 1e-12);

        // the blended kernel keeps gamma = 1/d and coef0 = 1
        let blended = KernelKind::Polynomial.gram(x.view(), x.view()).unwrap();
        assert!((blended[[0, 0]] - 3.375).abs() < 1e-12);
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let (x, _) = blobs();
        let optimizer = TaskWeightOptimizer::new(&MtmklConfig::default());
        assert!(matches!(
            optimizer.optimize(0, x.view(), &[0, 1], None),
            Err(MtmklError::InputShape(_))
        ));
    }
}
