//! Error types for training operations.

use thiserror::Error;

use neurofuzz_infer::EngineError;
use neurofuzz_ir::IrError;

/// Errors that can occur while configuring or running a trainer.
#[derive(Error, Debug)]
pub enum TrainError {
    /// A configuration value is outside its legal range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The dataset does not match the engine or itself.
    #[error("dataset shape mismatch: {0}")]
    DataShape(String),

    /// The engine graph must be built before training.
    #[error("engine has not been built")]
    EngineNotBuilt,

    /// A rule's consequent term kind cannot be identified by least
    /// squares.
    #[error("unsupported consequent term kind '{kind}' for rule {rule}")]
    UnsupportedConsequent { rule: usize, kind: String },

    /// The firing-strength gradient is not implemented for this norm
    /// family.
    #[error("gradient for norm '{norm}' is not implemented")]
    NormGradientNotImplemented { norm: String },

    /// Error from the engine graph.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error from the rule-base IR (derivative adapter, parameter
    /// setters).
    #[error("rule base error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for training operations.
pub type TrainResult<T> = Result<T, TrainError>;
