//! Error types for the rule-base IR.

use thiserror::Error;

/// Errors raised by the IR layer.
#[derive(Error, Debug)]
pub enum IrError {
    /// Parameter vector rejected by a term's setter.
    #[error("invalid parameters for {kind} term '{term}': {reason}")]
    InvalidParameters {
        term: String,
        kind: String,
        reason: String,
    },

    /// A rule antecedent combines AND and OR operators.
    #[error("rule antecedents must not mix AND with OR")]
    MixedConnectives,

    /// Parameter derivative requested for a term kind that has none.
    #[error("parameter derivative for {kind} terms is not implemented")]
    DerivativeNotImplemented { kind: String },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
