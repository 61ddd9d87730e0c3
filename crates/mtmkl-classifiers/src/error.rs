use thiserror::Error;

/// Result alias used throughout the classifier core.
pub type Result<T> = std::result::Result<T, MtmklError>;

/// Errors raised by kernel evaluation, weight optimization and the MTMKL model.
///
/// All variants are precondition violations surfaced straight to the caller;
/// nothing in the core retries.
#[derive(Error, Debug)]
pub enum MtmklError {
    #[error("Model not fitted: call `fit` before inference")]
    NotFitted,

    #[error(
        "Kernel weight optimization for task {task} never improved on zero accuracy after {rounds} round(s)"
    )]
    DegenerateOptimization { task: i32, rounds: usize },

    #[error("Input shape mismatch: {0}")]
    InputShape(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Non-finite input: {0}")]
    NonFiniteInput(String),

    #[error("Invalid kernel weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Probability estimates unavailable: model was trained without Platt scaling")]
    ProbabilityUnavailable,
}
