//! Kernel families, kernel weight mappings and the weighted kernel combiner.
//!
//! `KernelKind` evaluates Gram matrices, `KernelWeights` is the per-task
//! convex weighting, and `combiner` blends the two into one precomputed kernel.
pub mod combiner;
pub mod kind;
pub mod weights;

pub use combiner::{combine, combine_grams};
pub use kind::{scale_gamma, KernelKind};
pub use weights::KernelWeights;
