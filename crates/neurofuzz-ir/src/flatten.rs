//! Antecedent flattening.
//!
//! The engine graph wires one firing-strength node per rule, fed by the
//! rule's propositions in a fixed order. Flattening produces that order:
//! a depth-first, left-to-right walk of the antecedent tree yielding
//! parallel `(variable, term, negated)` sequences and the single
//! connective shared by every operator in the tree.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::rule::{Connective, Expr, Proposition};

/// The flattened form of a rule antecedent.
///
/// The index of each triple is the index of the corresponding predecessor
/// of the rule's firing-strength node, and downstream the row layout of
/// the least-squares regressors. A single-proposition antecedent defaults
/// to [`Connective::And`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatAntecedent {
    pub variables: Vec<String>,
    pub terms: Vec<String>,
    pub negated: Vec<bool>,
    pub connective: Connective,
}

impl FlatAntecedent {
    /// Number of propositions.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate the triples in firing-strength input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.variables
            .iter()
            .zip(&self.terms)
            .zip(&self.negated)
            .map(|((v, t), &n)| (v.as_str(), t.as_str(), n))
    }

    /// Rebuild an equivalent antecedent expression: a left-fold of the
    /// triples under the connective.
    pub fn to_expr(&self) -> Expr {
        let mut props = self.iter().map(|(v, t, n)| {
            if n {
                Expr::not_prop(v, t)
            } else {
                Expr::prop(v, t)
            }
        });
        let first = props.next().expect("flattened antecedent is never empty");
        props.fold(first, |acc, p| match self.connective {
            Connective::And => acc.and(p),
            Connective::Or => acc.or(p),
        })
    }
}

/// Flatten an antecedent expression tree.
///
/// Every binary operator in the tree must carry the same connective;
/// mixing AND with OR fails with [`IrError::MixedConnectives`].
pub fn flatten(expr: &Expr) -> IrResult<FlatAntecedent> {
    let mut flat = FlatAntecedent {
        variables: Vec::new(),
        terms: Vec::new(),
        negated: Vec::new(),
        connective: Connective::And,
    };
    let mut connective = None;
    walk(expr, &mut flat, &mut connective)?;
    flat.connective = connective.unwrap_or(Connective::And);
    Ok(flat)
}

fn walk(
    expr: &Expr,
    flat: &mut FlatAntecedent,
    connective: &mut Option<Connective>,
) -> IrResult<()> {
    match expr {
        Expr::Prop(prop) => {
            push_prop(prop, flat);
            Ok(())
        }
        Expr::Binary {
            connective: op,
            left,
            right,
        } => {
            match connective {
                None => *connective = Some(*op),
                Some(seen) if seen != op => return Err(IrError::MixedConnectives),
                Some(_) => {}
            }
            walk(left, flat, connective)?;
            walk(right, flat, connective)
        }
    }
}

fn push_prop(prop: &Proposition, flat: &mut FlatAntecedent) {
    flat.variables.push(prop.variable.clone());
    flat.terms.push(prop.term.clone());
    flat.negated.push(prop.is_negated());
}
