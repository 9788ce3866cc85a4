//! Error types for engine construction and evaluation.

use thiserror::Error;

use neurofuzz_ir::IrError;

/// Errors raised while assembling or querying the adaptive network.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine must have exactly one output variable.
    #[error("there must be exactly one output variable (found {found})")]
    OutputVariableCount { found: usize },

    /// A rule must conclude on exactly one (variable, term) pair.
    #[error("rule {rule} must have exactly one conclusion (found {found})")]
    ConclusionCount { rule: usize, found: usize },

    /// Name lookup missed an input variable.
    #[error("input variable '{name}' not found")]
    InputVariableNotFound { name: String },

    /// Name lookup missed an output variable.
    #[error("output variable '{name}' not found")]
    OutputVariableNotFound { name: String },

    /// Name lookup missed a rule block.
    #[error("rule block '{name}' not found")]
    RuleBlockNotFound { name: String },

    /// A proposition references a term its variable does not carry.
    #[error("term '{term}' not found on variable '{variable}'")]
    TermNotFound { variable: String, term: String },

    /// Positional access outside a collection.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A crisp value vector does not match the number of input variables.
    #[error("expected {expected} input values, got {got}")]
    InputArity { expected: usize, got: usize },

    /// Consequent terms of the output variable disagree in order
    /// (constant vs. linear). Only raised when the opt-in check is on.
    #[error("consequent terms must all have the same order")]
    MixedConsequentOrder,

    /// Error bubbled up from the rule-base IR.
    #[error("rule base error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
