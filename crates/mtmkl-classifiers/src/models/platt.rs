//! Platt scaling of SVM decision values.
//!
//! Fits `P(y = 1 | f) = 1 / (1 + exp(A * f + B))` by Newton's method with a
//! backtracking line search, using Platt's smoothed targets
//! `(N+ + 1) / (N+ + 2)` and `1 / (N- + 2)` to avoid overfitting on tiny sets.
use serde::{Deserialize, Serialize};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit the sigmoid to decision values and their binary labels (1 = positive).
    pub fn fit(decision_values: &[f64], labels: &[u8]) -> Self {
        let prior1 = labels.iter().filter(|&&l| l == 1).count() as f64;
        let prior0 = labels.len() as f64 - prior1;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&l| if l == 1 { hi_target } else { lo_target })
            .collect();

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(decision_values, &targets, a, b);

        for iter in 0..MAX_ITER {
            let mut h11 = SIGMA;
            let mut h22 = SIGMA;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;
            for (&f, &t) in decision_values.iter().zip(&targets) {
                let (p, q) = probabilities(f * a + b);
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                log::trace!("Platt scaling converged after {} iterations", iter);
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(decision_values, &targets, new_a, new_b);
                if new_f < fval + 0.0001 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                log::trace!("Platt scaling line search failed at iteration {}", iter);
                break;
            }
        }

        PlattScaling { a, b }
    }

    /// Probability of the positive class for one decision value.
    pub fn probability(&self, decision_value: f64) -> f64 {
        probabilities(decision_value * self.a + self.b).0
    }
}

/// Numerically stable `(1 / (1 + e^x), e^x / (1 + e^x))`.
fn probabilities(f_apb: f64) -> (f64, f64) {
    if f_apb >= 0.0 {
        let e = (-f_apb).exp();
        (e / (1.0 + e), 1.0 / (1.0 + e))
    } else {
        let e = f_apb.exp();
        (1.0 / (1.0 + e), e / (1.0 + e))
    }
}

/// Negative log-likelihood of the targets under the sigmoid.
fn objective(decision_values: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    decision_values
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let f_apb = f * a + b;
            if f_apb >= 0.0 {
                t * f_apb + (1.0 + (-f_apb).exp()).ln()
            } else {
                (t - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_increase_with_decision_value() {
        let dec = [-2.0, -1.5, -1.0, -0.2, 0.3, 1.1, 1.4, 2.5];
        let labels = [0u8, 0, 0, 0, 1, 1, 1, 1];
        let platt = PlattScaling::fit(&dec, &labels);
        assert!(platt.a < 0.0);

        let probs: Vec<f64> = dec.iter().map(|&d| platt.probability(d)).collect();
        for pair in probs.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(probs[0] < 0.5 && probs[7] > 0.5);
        assert!(probs.iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    fn two_point_fit_separates_the_points() {
        let platt = PlattScaling::fit(&[1.0, -1.0], &[1, 0]);
        assert!(platt.probability(1.0) > 0.5);
        assert!(platt.probability(-1.0) < 0.5);
    }

    #[test]
    fn single_class_targets_stay_finite() {
        let platt = PlattScaling::fit(&[1.0, 1.0, 1.0], &[1, 1, 1]);
        let p = platt.probability(1.0);
        assert!(p.is_finite() && p > 0.5);
    }
}
