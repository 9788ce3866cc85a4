//! # neurofuzz infer
//!
//! The adaptive network behind a single-output Sugeno fuzzy system: a
//! six-layer feed-forward DAG built from an engine's variables and rule
//! blocks, evaluated layer by layer.
//!
//! Layers, in order: crisp input passthrough, term memberships, the
//! materialized complement of every term, per-rule firing strengths,
//! per-rule implications, the two sums (implications and strengths), and
//! the final normalization ratio.
//!
//! The [`Engine`] owns the variables, rule blocks, and graph; nodes are
//! arena-allocated and addressed by integer handles, with adjacency kept
//! as predecessor/successor lists whose insertion order is significant —
//! the predecessors of a firing-strength node follow the flattened
//! antecedent, which downstream also fixes the layout of least-squares
//! regressors.
//!
//! ```rust
//! use neurofuzz_infer::Engine;
//! use neurofuzz_ir::{Conclusion, Expr, Rule, RuleBlock, Term, TermKind, Variable};
//!
//! let mut engine = Engine::new("tipper")
//!     .with_input_variable(
//!         Variable::new("service", 0.0, 10.0)
//!             .with_term(Term::new("good", TermKind::Ramp { start: 0.0, end: 10.0 })),
//!     )
//!     .with_output_variable(
//!         Variable::new("tip", 0.0, 30.0)
//!             .with_term(Term::new("generous", TermKind::Constant { value: 20.0 })),
//!     )
//!     .with_rule_block(RuleBlock::new("rules").with_rule(Rule::new(
//!         Expr::prop("service", "good"),
//!         Conclusion::new("tip", "generous"),
//!     )));
//!
//! engine.build().unwrap();
//! engine.set_input_value("service", 5.0).unwrap();
//! engine.eval();
//! assert_eq!(engine.output_value("tip").unwrap(), 20.0);
//! ```

mod engine;
mod error;
mod node;

pub use engine::{Engine, Layer, RuleTopology};
pub use error::{EngineError, EngineResult};
pub use node::{Node, NodeId, NodeKind};
