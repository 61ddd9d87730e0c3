//! Seeded stratified k-fold splitting and Gram sub-matrix helpers.
//!
//! Fold assignment is decided once, from a single seeded RNG, so every caller
//! that shares a `StratifiedKFold` sees identical folds regardless of how the
//! folds are later evaluated (sequentially or in parallel).
use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A single train/test split of sample indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl Fold {
    /// Train and test on every sample.
    pub fn resubstitution(n_samples: usize) -> Self {
        let all: Vec<usize> = (0..n_samples).collect();
        Fold {
            train_indices: all.clone(),
            test_indices: all,
        }
    }

    pub fn is_resubstitution(&self) -> bool {
        self.train_indices == self.test_indices
    }

    /// Train x train block of a square Gram matrix.
    pub fn train_gram(&self, gram: ArrayView2<f64>) -> Array2<f64> {
        gram.select(Axis(0), &self.train_indices)
            .select(Axis(1), &self.train_indices)
    }

    /// Test x train block of a square Gram matrix.
    pub fn test_gram(&self, gram: ArrayView2<f64>) -> Array2<f64> {
        gram.select(Axis(0), &self.test_indices)
            .select(Axis(1), &self.train_indices)
    }

    pub fn train_labels<T: Copy>(&self, y: &[T]) -> Vec<T> {
        self.train_indices.iter().map(|&i| y[i]).collect()
    }

    pub fn test_labels<T: Copy>(&self, y: &[T]) -> Vec<T> {
        self.test_indices.iter().map(|&i| y[i]).collect()
    }
}

/// Stratified k-fold splitter over binary (or small integer) labels.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed: 42,
        }
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of folds actually used for `y`: the configured count, capped
    /// by the size of the largest class.
    ///
    /// A class smaller than the fold count is spread over as many folds as it
    /// has members; the remaining folds train on the other class only.
    pub fn effective_splits(&self, y: &[u8]) -> usize {
        let largest = class_indices(y).values().map(Vec::len).max().unwrap_or(0);
        self.n_splits.min(largest)
    }

    /// Split `0..y.len()` into folds that preserve the class proportions of `y`.
    ///
    /// Classes are visited in ascending order; within a class the indices are
    /// shuffled and dealt round-robin, continuing the fold counter from the
    /// previous class so fold sizes stay balanced. Folds with an empty test
    /// set are dropped. When fewer than two folds are possible, a single
    /// resubstitution fold is returned instead.
    pub fn split(&self, y: &[u8]) -> Vec<Fold> {
        let n_splits = self.effective_splits(y);
        if n_splits < 2 {
            log::trace!(
                "Stratified split of {} samples cannot form 2 folds; using resubstitution",
                y.len()
            );
            return vec![Fold::resubstitution(y.len())];
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut per_class = class_indices(y);
        if self.shuffle {
            for indices in per_class.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let mut assignment = vec![0usize; y.len()];
        let mut offset = 0;
        for indices in per_class.values() {
            for (i, &idx) in indices.iter().enumerate() {
                assignment[idx] = (offset + i) % n_splits;
            }
            offset += indices.len();
        }

        (0..n_splits)
            .filter_map(|fold_idx| {
                let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| assignment[i] == fold_idx);
                if test_indices.is_empty() {
                    return None;
                }
                log::trace!(
                    "Fold {}: {} train / {} test samples",
                    fold_idx,
                    train_indices.len(),
                    test_indices.len()
                );
                Some(Fold {
                    train_indices,
                    test_indices,
                })
            })
            .collect()
    }
}

fn class_indices(y: &[u8]) -> BTreeMap<u8, Vec<usize>> {
    let mut per_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in y.iter().enumerate() {
        per_class.entry(label).or_default().push(idx);
    }
    per_class
}
