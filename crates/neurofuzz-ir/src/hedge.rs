//! Unary hedges over membership degrees.

use serde::{Deserialize, Serialize};

/// A linguistic hedge. The complement hedge carries the canonical name
/// `"not"` and is the one materialized for every term node in the engine
/// graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hedge {
    Any,
    Extremely,
    Not,
    Somewhat,
    Very,
}

impl Hedge {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Hedge::Any => x,
            Hedge::Extremely => {
                if x <= 0.5 {
                    2.0 * x * x
                } else {
                    1.0 - 2.0 * (1.0 - x) * (1.0 - x)
                }
            }
            Hedge::Not => 1.0 - x,
            Hedge::Somewhat => x.sqrt(),
            Hedge::Very => x * x,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Hedge::Any => "any",
            Hedge::Extremely => "extremely",
            Hedge::Not => "not",
            Hedge::Somewhat => "somewhat",
            Hedge::Very => "very",
        }
    }

    /// True for the canonical complement hedge.
    pub fn is_complement(&self) -> bool {
        matches!(self, Hedge::Not)
    }
}
