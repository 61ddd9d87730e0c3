use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MtmklError, Result};
use crate::kernels::KernelKind;

/// Immutable mapping from kernel kind to its share of a combined kernel.
///
/// Every constructor renormalizes, so the weights of a `KernelWeights` value
/// are always finite, non-negative and sum to one. Updates produce a new
/// value rather than mutating an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<KernelKind, f64>", into = "BTreeMap<KernelKind, f64>")]
pub struct KernelWeights {
    weights: BTreeMap<KernelKind, f64>,
}

impl KernelWeights {
    /// Equal weight `1 / kernels.len()` for every kernel in the set.
    pub fn uniform(kernels: &[KernelKind]) -> Result<Self> {
        Self::new(kernels.iter().map(|&k| (k, 1.0)))
    }

    /// Build a mapping from raw, not necessarily normalized weights.
    ///
    /// # Errors
    ///
    /// [`MtmklError::InvalidWeights`] if any weight is negative or non-finite,
    /// or if the weights do not have a positive sum.
    pub fn new<I>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = (KernelKind, f64)>,
    {
        let mut weights = BTreeMap::new();
        for (kernel, weight) in raw {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MtmklError::InvalidWeights(format!(
                    "weight for {} kernel must be finite and non-negative, got {}",
                    kernel, weight
                )));
            }
            *weights.entry(kernel).or_insert(0.0) += weight;
        }

        let total: f64 = weights.values().sum();
        if !(total > 0.0) || !total.is_finite() {
            return Err(MtmklError::InvalidWeights(format!(
                "weights must have a positive finite sum, got {}",
                total
            )));
        }
        for weight in weights.values_mut() {
            *weight /= total;
        }

        Ok(Self { weights })
    }

    /// Performance-proportional weights: `score_k / sum(scores)`.
    ///
    /// Returns `None` when the scores sum to zero, in which case the caller
    /// keeps its previous weights.
    pub fn from_scores(scores: &[(KernelKind, f64)]) -> Option<Self> {
        let total: f64 = scores.iter().map(|(_, s)| s.max(0.0)).sum();
        if !(total > 0.0) {
            return None;
        }
        Self::new(scores.iter().map(|&(k, s)| (k, s.max(0.0)))).ok()
    }

    /// Align a warm-start mapping with the configured kernel set.
    ///
    /// Kernels of the set missing from `self` get weight zero; kernels in
    /// `self` that are not part of the set are rejected.
    pub fn aligned_to(&self, kernels: &[KernelKind]) -> Result<Self> {
        if let Some(extra) = self.weights.keys().find(|k| !kernels.contains(k)) {
            return Err(MtmklError::InvalidConfig(format!(
                "initial weights reference the {} kernel, which is not in the kernel set",
                extra
            )));
        }
        Self::new(kernels.iter().map(|&k| (k, self.get(k))))
    }

    pub fn get(&self, kernel: KernelKind) -> f64 {
        self.weights.get(&kernel).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (KernelKind, f64)> + '_ {
        self.weights.iter().map(|(&k, &w)| (k, w))
    }

    /// Kernels with a strictly positive weight; only these are ever evaluated.
    pub fn active(&self) -> impl Iterator<Item = (KernelKind, f64)> + '_ {
        self.iter().filter(|&(_, w)| w > 0.0)
    }

    pub fn kernels(&self) -> Vec<KernelKind> {
        self.weights.keys().copied().collect()
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    /// L1 distance over the union of both kernel sets.
    pub fn l1_distance(&self, other: &KernelWeights) -> f64 {
        let mut kernels: Vec<KernelKind> = self.kernels();
        kernels.extend(other.weights.keys().copied());
        kernels.sort();
        kernels.dedup();
        kernels
            .into_iter()
            .map(|k| (self.get(k) - other.get(k)).abs())
            .sum()
    }
}

impl TryFrom<BTreeMap<KernelKind, f64>> for KernelWeights {
    type Error = MtmklError;

    fn try_from(raw: BTreeMap<KernelKind, f64>) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<KernelWeights> for BTreeMap<KernelKind, f64> {
    fn from(weights: KernelWeights) -> Self {
        weights.weights
    }
}
