use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{MtmklError, Result};

/// Degree of the polynomial kernel.
pub const POLYNOMIAL_DEGREE: i32 = 3;

/// Independent term shared by the polynomial and sigmoid kernels.
pub const COEF0: f64 = 1.0;

/// Independent term of the polynomial and sigmoid kernels when a kernel is
/// scored on its own.
pub const STANDALONE_COEF0: f64 = 0.0;

/// The fixed set of kernel families a task can blend.
///
/// Each variant carries its own closed-form Gram matrix. Ordering follows
/// declaration order and is what `KernelWeights` iterates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KernelKind {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "rbf")]
    Rbf,
    #[serde(rename = "poly", alias = "polynomial")]
    Polynomial,
    #[serde(rename = "sigmoid")]
    Sigmoid,
}

impl KernelKind {
    pub const ALL: [KernelKind; 4] = [
        KernelKind::Linear,
        KernelKind::Rbf,
        KernelKind::Polynomial,
        KernelKind::Sigmoid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KernelKind::Linear => "linear",
            KernelKind::Rbf => "rbf",
            KernelKind::Polynomial => "poly",
            KernelKind::Sigmoid => "sigmoid",
        }
    }

    /// Compute the `a.nrows() x b.nrows()` Gram matrix between two sample sets.
    ///
    /// `gamma` is `1 / n_features` for every kernel that uses it. Passing the
    /// same matrix twice yields the symmetric self-Gram used during training.
    ///
    /// # Errors
    ///
    /// [`MtmklError::InputShape`] when `a` and `b` disagree on the number of
    /// features.
    pub fn gram(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.gram_with(a, b, gamma(a.ncols()), COEF0)
    }

    /// Gram matrix with an explicit `gamma` and `coef0`.
    ///
    /// `coef0` is ignored by the linear and RBF kernels, `gamma` by the
    /// linear one.
    pub fn gram_with(
        &self,
        a: ArrayView2<f64>,
        b: ArrayView2<f64>,
        gamma: f64,
        coef0: f64,
    ) -> Result<Array2<f64>> {
        if a.ncols() != b.ncols() {
            return Err(MtmklError::InputShape(format!(
                "{} kernel between matrices with {} and {} features",
                self.name(),
                a.ncols(),
                b.ncols()
            )));
        }

        let mut k = a.dot(&b.t());

        match self {
            KernelKind::Linear => {}
            KernelKind::Rbf => {
                let a_sq = a.map_axis(Axis(1), |row| row.dot(&row));
                let b_sq = b.map_axis(Axis(1), |row| row.dot(&row));
                Zip::indexed(&mut k).for_each(|(i, j), v| {
                    // rounding can push the expanded distance slightly below zero
                    let sq_dist = (a_sq[i] + b_sq[j] - 2.0 * *v).max(0.0);
                    *v = (-gamma * sq_dist).exp();
                });
            }
            KernelKind::Polynomial => {
                k.mapv_inplace(|v| (gamma * v + coef0).powi(POLYNOMIAL_DEGREE));
            }
            KernelKind::Sigmoid => {
                k.mapv_inplace(|v| (gamma * v + coef0).tanh());
            }
        }

        Ok(k)
    }
}

fn gamma(n_features: usize) -> f64 {
    if n_features == 0 {
        1.0
    } else {
        1.0 / n_features as f64
    }
}

/// Variance-scaled gamma, `1 / (n_features * Var(x))`, with the variance
/// taken over every entry of `x`. Falls back to `1` when the variance is
/// zero or `x` has no entries.
pub fn scale_gamma(x: ArrayView2<f64>) -> f64 {
    if x.is_empty() {
        return 1.0;
    }
    let variance = x.var(0.0);
    if variance > 0.0 {
        1.0 / (x.ncols() as f64 * variance)
    } else {
        1.0
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelKind {
    type Err = MtmklError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(KernelKind::Linear),
            "rbf" | "gauss" | "gaussian" => Ok(KernelKind::Rbf),
            "poly" | "polynomial" => Ok(KernelKind::Polynomial),
            "sigmoid" => Ok(KernelKind::Sigmoid),
            other => Err(MtmklError::InvalidConfig(format!(
                "Unknown kernel: {}. Valid options are: linear, rbf, poly, sigmoid",
                other
            ))),
        }
    }
}
