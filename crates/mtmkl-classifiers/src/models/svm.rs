use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::cross_validation::StratifiedKFold;
use crate::error::{MtmklError, Result};
use crate::models::platt::PlattScaling;

/// Floor for a non-positive curvature in the two-variable sub-problem.
const TAU: f64 = 1e-12;

/// Hyper-parameters of the precomputed-kernel C-SVC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    /// Regularization strength.
    pub c: f64,
    /// Stopping tolerance on the maximal KKT violation.
    pub eps: f64,
    /// Cap on SMO iterations.
    pub max_iter: usize,
    /// Internal folds used to collect decision values for Platt scaling.
    pub probability_folds: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            eps: 1e-3,
            max_iter: 10_000_000,
            probability_folds: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SvmState {
    /// Only one label was present at fit time.
    Constant { label: u8 },
    Trained { dual_coef: Array1<f64>, rho: f64 },
}

/// Binary C-SVC trained directly on a Gram matrix.
///
/// Labels are `0`/`1`; label `1` is the positive class (`+1` in the dual).
/// Prediction takes the kernel between new samples and *every* training
/// sample, one column per training sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecomputedSvm {
    n_train: usize,
    state: SvmState,
    platt: Option<PlattScaling>,
}

impl PrecomputedSvm {
    /// Solve the C-SVC dual on `gram` with labels `y`.
    ///
    /// # Errors
    ///
    /// [`MtmklError::InputShape`] if `gram` is not square or does not match
    /// the label count; [`MtmklError::EmptyInput`] for zero samples.
    pub fn fit(gram: ArrayView2<f64>, y: &[u8], params: &SvmParams) -> Result<Self> {
        check_gram(gram, y)?;

        let n_pos = y.iter().filter(|&&l| l == 1).count();
        if n_pos == 0 || n_pos == y.len() {
            let label = if n_pos == 0 { 0 } else { 1 };
            log::trace!("Single-class training set; fitting constant model ({})", label);
            return Ok(PrecomputedSvm {
                n_train: y.len(),
                state: SvmState::Constant { label },
                platt: None,
            });
        }

        let signs: Vec<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
        let (alpha, rho) = smo(gram, &signs, params);
        let dual_coef = Array1::from_iter(alpha.iter().zip(&signs).map(|(a, s)| a * s));

        Ok(PrecomputedSvm {
            n_train: y.len(),
            state: SvmState::Trained { dual_coef, rho },
            platt: None,
        })
    }

    /// Fit the SVM and calibrate its decision values with Platt scaling.
    ///
    /// Calibration uses decision values collected out-of-fold from a seeded
    /// stratified split; when no class has two members the in-sample
    /// decision values are used instead.
    pub fn fit_with_probability(
        gram: ArrayView2<f64>,
        y: &[u8],
        params: &SvmParams,
        seed: u64,
    ) -> Result<Self> {
        let mut svm = Self::fit(gram, y, params)?;
        if matches!(svm.state, SvmState::Constant { .. }) {
            return Ok(svm);
        }

        let folds = StratifiedKFold::new(params.probability_folds)
            .seed(seed)
            .split(y);
        let mut decision_values = vec![0.0; y.len()];
        for fold in &folds {
            let dec = if fold.is_resubstitution() {
                svm.decision_function(gram)?
            } else {
                let sub = Self::fit(
                    fold.train_gram(gram).view(),
                    &fold.train_labels(y),
                    params,
                )?;
                sub.decision_function(fold.test_gram(gram).view())?
            };
            for (&idx, &value) in fold.test_indices.iter().zip(dec.iter()) {
                decision_values[idx] = value;
            }
        }

        svm.platt = Some(PlattScaling::fit(&decision_values, y));
        Ok(svm)
    }

    pub fn n_train(&self) -> usize {
        self.n_train
    }

    pub fn has_probability(&self) -> bool {
        self.platt.is_some() || matches!(self.state, SvmState::Constant { .. })
    }

    /// Signed distance to the separating surface; positive means class `1`.
    ///
    /// A constant model returns `+1` or `-1` for every row.
    pub fn decision_function(&self, cross: ArrayView2<f64>) -> Result<Array1<f64>> {
        if cross.ncols() != self.n_train {
            return Err(MtmklError::InputShape(format!(
                "kernel has {} columns but the SVM was trained on {} samples",
                cross.ncols(),
                self.n_train
            )));
        }
        match &self.state {
            SvmState::Constant { label } => {
                let value = if *label == 1 { 1.0 } else { -1.0 };
                Ok(Array1::from_elem(cross.nrows(), value))
            }
            SvmState::Trained { dual_coef, rho } => Ok(cross.dot(dual_coef) - *rho),
        }
    }

    pub fn predict(&self, cross: ArrayView2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .decision_function(cross)?
            .iter()
            .map(|&d| u8::from(d > 0.0))
            .collect())
    }

    /// Probability of class `1` for every row of `cross`.
    pub fn predict_positive_proba(&self, cross: ArrayView2<f64>) -> Result<Array1<f64>> {
        if let SvmState::Constant { label } = self.state {
            if cross.ncols() != self.n_train {
                return Err(MtmklError::InputShape(format!(
                    "kernel has {} columns but the SVM was trained on {} samples",
                    cross.ncols(),
                    self.n_train
                )));
            }
            return Ok(Array1::from_elem(cross.nrows(), f64::from(label)));
        }
        let platt = self.platt.ok_or(MtmklError::ProbabilityUnavailable)?;
        Ok(self.decision_function(cross)?.mapv(|d| platt.probability(d)))
    }
}

fn check_gram(gram: ArrayView2<f64>, y: &[u8]) -> Result<()> {
    if gram.nrows() != gram.ncols() {
        return Err(MtmklError::InputShape(format!(
            "training Gram matrix must be square, got {:?}",
            gram.dim()
        )));
    }
    if gram.nrows() != y.len() {
        return Err(MtmklError::InputShape(format!(
            "Gram matrix has {} rows but {} labels were given",
            gram.nrows(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(MtmklError::EmptyInput("cannot fit an SVM on zero samples".to_string()));
    }
    Ok(())
}

/// Sequential minimal optimization of the C-SVC dual
///
/// `min 1/2 a'Qa - e'a` s.t. `y'a = 0`, `0 <= a_i <= C`, with
/// `Q_ij = y_i y_j K_ij`. Working pairs are chosen by maximal violation for
/// `i` and second-order gain for `j`. Returns the multipliers and the bias
/// `rho` (decision = `sum_i y_i a_i K(x, x_i) - rho`).
fn smo(gram: ArrayView2<f64>, y: &[f64], params: &SvmParams) -> (Vec<f64>, f64) {
    let n = y.len();
    let c = params.c;
    let q: Array2<f64> = Array2::from_shape_fn((n, n), |(i, j)| y[i] * y[j] * gram[[i, j]]);
    let qd: Vec<f64> = (0..n).map(|i| q[[i, i]]).collect();

    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];
    let is_upper = |a: f64| a >= c;
    let is_lower = |a: f64| a <= 0.0;

    let mut iter = 0;
    while iter < params.max_iter {
        // i: maximal violator among I_up
        let mut g_max = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..n {
            if y[t] > 0.0 {
                if !is_upper(alpha[t]) && -grad[t] >= g_max {
                    g_max = -grad[t];
                    i_sel = Some(t);
                }
            } else if !is_lower(alpha[t]) && grad[t] >= g_max {
                g_max = grad[t];
                i_sel = Some(t);
            }
        }

        // j: best second-order gain among I_low
        let mut g_max2 = f64::NEG_INFINITY;
        let mut j_sel = None;
        let mut obj_diff_min = f64::INFINITY;
        if let Some(i) = i_sel {
            for t in 0..n {
                if y[t] > 0.0 {
                    if !is_lower(alpha[t]) {
                        let grad_diff = g_max + grad[t];
                        if grad[t] >= g_max2 {
                            g_max2 = grad[t];
                        }
                        if grad_diff > 0.0 {
                            let quad = qd[i] + qd[t] - 2.0 * y[i] * q[[i, t]];
                            let obj_diff = -(grad_diff * grad_diff) / if quad > 0.0 { quad } else { TAU };
                            if obj_diff <= obj_diff_min {
                                j_sel = Some(t);
                                obj_diff_min = obj_diff;
                            }
                        }
                    }
                } else if !is_upper(alpha[t]) {
                    let grad_diff = g_max - grad[t];
                    if -grad[t] >= g_max2 {
                        g_max2 = -grad[t];
                    }
                    if grad_diff > 0.0 {
                        let quad = qd[i] + qd[t] + 2.0 * y[i] * q[[i, t]];
                        let obj_diff = -(grad_diff * grad_diff) / if quad > 0.0 { quad } else { TAU };
                        if obj_diff <= obj_diff_min {
                            j_sel = Some(t);
                            obj_diff_min = obj_diff;
                        }
                    }
                }
            }
        }

        let (i, j) = match (i_sel, j_sel) {
            (Some(i), Some(j)) if g_max + g_max2 >= params.eps => (i, j),
            _ => break,
        };
        iter += 1;

        let old_ai = alpha[i];
        let old_aj = alpha[j];
        let (mut ai, mut aj) = (old_ai, old_aj);

        if y[i] != y[j] {
            let mut quad = qd[i] + qd[j] + 2.0 * q[[i, j]];
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = ai - aj;
            ai += delta;
            aj += delta;
            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > 0.0 {
                if ai > c {
                    ai = c;
                    aj = c - diff;
                }
            } else if aj > c {
                aj = c;
                ai = c + diff;
            }
        } else {
            let mut quad = qd[i] + qd[j] - 2.0 * q[[i, j]];
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (grad[i] - grad[j]) / quad;
            let sum = ai + aj;
            ai -= delta;
            aj += delta;
            if sum > c {
                if ai > c {
                    ai = c;
                    aj = sum - c;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c {
                if aj > c {
                    aj = c;
                    ai = sum - c;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }

        alpha[i] = ai;
        alpha[j] = aj;
        let d_ai = ai - old_ai;
        let d_aj = aj - old_aj;
        for t in 0..n {
            grad[t] += q[[i, t]] * d_ai + q[[j, t]] * d_aj;
        }
    }

    if iter >= params.max_iter {
        log::warn!(
            "SMO reached the iteration cap ({}) before converging; consider a larger solver.max_iter",
            params.max_iter
        );
    } else {
        log::trace!("SMO converged after {} iterations", iter);
    }

    let rho = compute_rho(&alpha, &grad, y, c);
    (alpha, rho)
}

fn compute_rho(alpha: &[f64], grad: &[f64], y: &[f64], c: f64) -> f64 {
    let mut n_free = 0usize;
    let mut sum_free = 0.0;
    let mut ub = f64::INFINITY;
    let mut lb = f64::NEG_INFINITY;

    for t in 0..alpha.len() {
        let yg = y[t] * grad[t];
        if alpha[t] >= c {
            if y[t] < 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else if alpha[t] <= 0.0 {
            if y[t] > 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else {
            n_free += 1;
            sum_free += yg;
        }
    }

    if n_free > 0 {
        sum_free / n_free as f64
    } else {
        (ub + lb) / 2.0
    }
}
