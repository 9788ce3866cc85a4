//! # neurofuzz IR
//!
//! Data model for a single-output Sugeno fuzzy rule base: parametric
//! membership terms, T-norm/S-norm families, hedges, linguistic variables,
//! rules and rule blocks, plus the two pieces of machinery the adaptive
//! network in `neurofuzz-infer` is built from:
//!
//! - the **antecedent flattener** ([`flatten`]), which turns a rule's
//!   antecedent expression tree into parallel `(variable, term, negated)`
//!   sequences under a single connective, and
//! - the **term-parameter adapter** ([`params`]), which reads and writes
//!   term parameters as flat vectors and evaluates the derivative of a
//!   term's membership with respect to those parameters.
//!
//! Term kinds and norm families are tagged enums rather than trait objects,
//! so downstream derivative code is an exhaustive match checked at compile
//! time.
//!
//! ```rust
//! use neurofuzz_ir::{Expr, Rule, Conclusion, flatten::flatten};
//!
//! let antecedent = Expr::prop("service", "good").and(Expr::prop("food", "tasty"));
//! let rule = Rule::new(antecedent, Conclusion::new("tip", "generous"));
//! let flat = flatten(rule.antecedent()).unwrap();
//! assert_eq!(flat.len(), 2);
//! ```

mod error;
pub mod flatten;
mod hedge;
mod norm;
pub mod params;
mod rule;
mod term;
mod variable;

pub use error::{IrError, IrResult};
pub use flatten::FlatAntecedent;
pub use hedge::Hedge;
pub use norm::{Norm, SNorm, TNorm};
pub use rule::{Conclusion, Connective, Expr, Proposition, Rule, RuleBlock};
pub use term::{Term, TermKind};
pub use variable::Variable;
