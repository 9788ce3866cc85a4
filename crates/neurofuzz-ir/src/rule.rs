//! Rules, rule blocks and antecedent expression trees.

use serde::{Deserialize, Serialize};

use crate::hedge::Hedge;
use crate::norm::{SNorm, TNorm};

/// The connective joining the propositions of an antecedent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connective {
    And,
    Or,
}

/// A simple statement `variable IS [hedges] term`, referencing variable
/// and term by name. Names are resolved when the engine graph is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposition {
    pub variable: String,
    pub hedges: Vec<Hedge>,
    pub term: String,
}

impl Proposition {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Proposition {
            variable: variable.into(),
            hedges: Vec::new(),
            term: term.into(),
        }
    }

    pub fn with_hedge(mut self, hedge: Hedge) -> Self {
        self.hedges.push(hedge);
        self
    }

    /// True when any hedge is the canonical complement.
    pub fn is_negated(&self) -> bool {
        self.hedges.iter().any(Hedge::is_complement)
    }
}

/// An antecedent expression: a proposition leaf or a binary connective
/// over two subexpressions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Prop(Proposition),
    Binary {
        connective: Connective,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Leaf proposition `variable IS term`.
    pub fn prop(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Expr::Prop(Proposition::new(variable, term))
    }

    /// Leaf proposition `variable IS NOT term`.
    pub fn not_prop(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Expr::Prop(Proposition::new(variable, term).with_hedge(Hedge::Not))
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::Binary {
            connective: Connective::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Binary {
            connective: Connective::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }
}

/// The THEN-part of a rule: one (output variable, term) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    pub variable: String,
    pub term: String,
}

impl Conclusion {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Conclusion {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

/// A fuzzy rule. Parsed rules may carry any number of conclusions; the
/// engine's `check` enforces exactly one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    antecedent: Expr,
    conclusions: Vec<Conclusion>,
}

impl Rule {
    pub fn new(antecedent: Expr, conclusion: Conclusion) -> Self {
        Rule {
            antecedent,
            conclusions: vec![conclusion],
        }
    }

    pub fn with_conclusions(antecedent: Expr, conclusions: Vec<Conclusion>) -> Self {
        Rule {
            antecedent,
            conclusions,
        }
    }

    pub fn antecedent(&self) -> &Expr {
        &self.antecedent
    }

    pub fn conclusions(&self) -> &[Conclusion] {
        &self.conclusions
    }
}

/// An ordered group of rules sharing norm operators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleBlock {
    name: String,
    enabled: bool,
    rules: Vec<Rule>,
    conjunction: TNorm,
    disjunction: SNorm,
    activation: TNorm,
}

impl RuleBlock {
    pub fn new(name: impl Into<String>) -> Self {
        RuleBlock {
            name: name.into(),
            enabled: true,
            rules: Vec::new(),
            conjunction: TNorm::AlgebraicProduct,
            disjunction: SNorm::AlgebraicSum,
            activation: TNorm::AlgebraicProduct,
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_operators(mut self, conjunction: TNorm, disjunction: SNorm, activation: TNorm) -> Self {
        self.conjunction = conjunction;
        self.disjunction = disjunction;
        self.activation = activation;
        self
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn conjunction(&self) -> TNorm {
        self.conjunction
    }

    pub fn disjunction(&self) -> SNorm {
        self.disjunction
    }

    pub fn activation(&self) -> TNorm {
        self.activation
    }
}
