use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MtmklError, Result};
use crate::kernels::{KernelKind, KernelWeights};
use crate::models::svm::SvmParams;

/// Central configuration for the MTMKL classifier.
///
/// Every field has a default, so a JSON config only needs the values it
/// overrides.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MtmklConfig {
    /// Regularization strength of every SVM.
    pub c: f64,
    /// Candidate kernels each task may blend.
    pub kernels: Vec<KernelKind>,
    /// Warm-start weights per class label; classes without an entry start uniform.
    pub initial_weights: BTreeMap<i32, KernelWeights>,
    /// Maximum optimizer rounds per task.
    pub max_iter: usize,
    /// L1 change in weights below which a task's optimizer stops.
    pub tol: f64,
    /// Folds used for cross-validated accuracy.
    pub cv_folds: usize,
    /// Seed for fold assignment and probability calibration.
    pub seed: u64,
    pub solver: SolverConfig,
    pub degenerate_policy: DegeneratePolicy,
}

/// SMO solver and calibration settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub eps: f64,
    pub max_iter: usize,
    pub probability_folds: usize,
}

/// What the optimizer does when no round ever beats zero accuracy.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fail the task with `MtmklError::DegenerateOptimization`.
    #[default]
    Error,
    /// Keep the final round's weights and report zero accuracy.
    FinalWeights,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let params = SvmParams::default();
        Self {
            eps: params.eps,
            max_iter: params.max_iter,
            probability_folds: params.probability_folds,
        }
    }
}

impl Default for MtmklConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernels: KernelKind::ALL.to_vec(),
            initial_weights: BTreeMap::new(),
            max_iter: 100,
            tol: 1e-3,
            cv_folds: 5,
            seed: 42,
            solver: SolverConfig::default(),
            degenerate_policy: DegeneratePolicy::default(),
        }
    }
}

impl MtmklConfig {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_kernels(mut self, kernels: Vec<KernelKind>) -> Self {
        self.kernels = kernels;
        self
    }

    pub fn with_initial_weights(mut self, class: i32, weights: KernelWeights) -> Self {
        self.initial_weights.insert(class, weights);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    /// SVM parameters derived from `c` and the solver section.
    pub fn svm_params(&self) -> SvmParams {
        SvmParams {
            c: self.c,
            eps: self.solver.eps,
            max_iter: self.solver.max_iter,
            probability_folds: self.solver.probability_folds,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) || !self.c.is_finite() {
            return Err(MtmklError::InvalidConfig(format!("c must be positive, got {}", self.c)));
        }
        if self.kernels.is_empty() {
            return Err(MtmklError::InvalidConfig("kernel set is empty".to_string()));
        }
        let mut sorted = self.kernels.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != self.kernels.len() {
            return Err(MtmklError::InvalidConfig(format!(
                "kernel set contains duplicates: {:?}",
                self.kernels
            )));
        }
        if self.max_iter == 0 {
            return Err(MtmklError::InvalidConfig("max_iter must be at least 1".to_string()));
        }
        if !(self.tol >= 0.0) || !self.tol.is_finite() {
            return Err(MtmklError::InvalidConfig(format!(
                "tol must be finite and non-negative, got {}",
                self.tol
            )));
        }
        if self.cv_folds < 2 {
            return Err(MtmklError::InvalidConfig(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if !(self.solver.eps > 0.0) {
            return Err(MtmklError::InvalidConfig(format!(
                "solver.eps must be positive, got {}",
                self.solver.eps
            )));
        }
        if self.solver.probability_folds < 2 {
            return Err(MtmklError::InvalidConfig(format!(
                "solver.probability_folds must be at least 2, got {}",
                self.solver.probability_folds
            )));
        }
        if self.solver.max_iter == 0 {
            return Err(MtmklError::InvalidConfig(
                "solver.max_iter must be at least 1".to_string(),
            ));
        }
        for (class, weights) in &self.initial_weights {
            weights.aligned_to(&self.kernels).map_err(|e| {
                MtmklError::InvalidConfig(format!("initial weights for class {}: {}", class, e))
            })?;
        }
        Ok(())
    }
}
