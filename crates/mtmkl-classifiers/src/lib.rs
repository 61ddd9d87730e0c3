//! mtmkl-classifiers: multi-task multiple-kernel-learning classification.
//!
//! For every class the classifier treats "this class vs. the rest" as its own
//! task, learns a convex blend of candidate kernels for it by cross-validated
//! accuracy, and trains a precomputed-kernel SVM on the blend. Task
//! probabilities are normalized into a multi-class distribution.
//!
//! Besides the model the crate carries the pieces around it: kernel
//! evaluation and blending, a seeded stratified k-fold splitter, an SMO
//! solver with Platt scaling, a majority baseline, a standard scaler and a
//! CSV dataset reader.
pub mod config;
pub mod cross_validation;
pub mod error;
pub mod io;
pub mod kernels;
pub mod models;
pub mod optimizer;
pub mod preprocessing;
pub mod stats;

pub use config::{DegeneratePolicy, MtmklConfig, SolverConfig};
pub use error::{MtmklError, Result};
pub use kernels::{KernelKind, KernelWeights};
pub use models::{ClassifierModel, MajorityClassifier, MtmklClassifier};
