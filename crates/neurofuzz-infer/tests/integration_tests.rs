//! Integration tests for the engine graph: construction invariants,
//! order stability across rebuilds, and evaluation edge cases.

use approx::assert_relative_eq;
use neurofuzz_infer::{Engine, Layer, NodeId};
use neurofuzz_ir::{
    Conclusion, Expr, Rule, RuleBlock, SNorm, TNorm, Term, TermKind, Variable,
};

fn bell(name: &str, center: f64, width: f64) -> Term {
    Term::new(
        name,
        TermKind::Bell {
            center,
            width,
            slope: 2.0,
        },
    )
}

/// Two inputs with two terms each, four conjunctive rules.
fn two_input_engine() -> Engine {
    let x1 = Variable::new("x1", 0.0, 1.0)
        .with_term(bell("low", 0.0, 0.5))
        .with_term(bell("high", 1.0, 0.5));
    let x2 = Variable::new("x2", 0.0, 1.0)
        .with_term(bell("low", 0.0, 0.5))
        .with_term(bell("high", 1.0, 0.5));
    let y = Variable::new("y", 0.0, 2.0)
        .with_term(Term::new("c00", TermKind::Constant { value: 0.0 }))
        .with_term(Term::new("c01", TermKind::Constant { value: 0.5 }))
        .with_term(Term::new("c10", TermKind::Constant { value: 1.5 }))
        .with_term(Term::new("c11", TermKind::Constant { value: 2.0 }));

    let block = RuleBlock::new("rules")
        .with_operators(
            TNorm::AlgebraicProduct,
            SNorm::AlgebraicSum,
            TNorm::AlgebraicProduct,
        )
        .with_rule(Rule::new(
            Expr::prop("x1", "low").and(Expr::prop("x2", "low")),
            Conclusion::new("y", "c00"),
        ))
        .with_rule(Rule::new(
            Expr::prop("x1", "low").and(Expr::prop("x2", "high")),
            Conclusion::new("y", "c01"),
        ))
        .with_rule(Rule::new(
            Expr::prop("x1", "high").and(Expr::prop("x2", "low")),
            Conclusion::new("y", "c10"),
        ))
        .with_rule(Rule::new(
            Expr::prop("x1", "high").and(Expr::prop("x2", "high")),
            Conclusion::new("y", "c11"),
        ));

    Engine::new("grid")
        .with_input_variable(x1)
        .with_input_variable(x2)
        .with_output_variable(y)
        .with_rule_block(block)
}

#[test]
fn layer_sizes_match_rule_base() {
    let mut engine = two_input_engine();
    engine.build().unwrap();

    assert_eq!(engine.layer_nodes(Layer::Input).len(), 2);
    assert_eq!(engine.layer_nodes(Layer::Term).len(), 4);
    assert_eq!(engine.layer_nodes(Layer::Hedge).len(), 4);
    assert_eq!(engine.layer_nodes(Layer::FiringStrength).len(), 4);
    assert_eq!(engine.layer_nodes(Layer::Implication).len(), 4);
    assert_eq!(engine.layer_nodes(Layer::Sum).len(), 2);
    assert_eq!(engine.layer_nodes(Layer::Normalization).len(), 1);
}

#[test]
fn build_order_is_stable_across_rebuilds() {
    let mut a = two_input_engine();
    let mut b = two_input_engine();
    a.build().unwrap();
    b.build().unwrap();

    let strengths_a = a.layer_nodes(Layer::FiringStrength).to_vec();
    let strengths_b = b.layer_nodes(Layer::FiringStrength).to_vec();
    assert_eq!(strengths_a, strengths_b);

    for (&sa, &sb) in strengths_a.iter().zip(&strengths_b) {
        let preds_a: Vec<NodeId> = a.predecessors(sa).to_vec();
        let preds_b: Vec<NodeId> = b.predecessors(sb).to_vec();
        assert_eq!(preds_a, preds_b);
    }

    // rebuilding the same engine keeps every predecessor list identical
    let before: Vec<Vec<NodeId>> = strengths_a
        .iter()
        .map(|&s| a.predecessors(s).to_vec())
        .collect();
    a.build().unwrap();
    let after: Vec<Vec<NodeId>> = a
        .layer_nodes(Layer::FiringStrength)
        .iter()
        .map(|&s| a.predecessors(s).to_vec())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn corner_inputs_recover_consequents() {
    let mut engine = two_input_engine();
    engine.build().unwrap();

    for (x1, x2, expected) in [
        (0.0, 0.0, 0.0),
        (0.0, 1.0, 0.5),
        (1.0, 0.0, 1.5),
        (1.0, 1.0, 2.0),
    ] {
        engine.set_input_values(&[x1, x2]).unwrap();
        let out = engine.eval();
        // corners are dominated by one rule but all four fire a little
        assert!((out[0] - expected).abs() < 0.2, "corner ({x1},{x2})");
    }
}

#[test]
fn strength_layer_values_are_exposed() {
    let mut engine = two_input_engine();
    engine.build().unwrap();
    engine.set_input_values(&[0.5, 0.5]).unwrap();

    engine.eval_layer(Layer::Input);
    engine.eval_layer(Layer::Term);
    engine.eval_layer(Layer::Hedge);
    let strengths = engine.eval_layer(Layer::FiringStrength);
    assert_eq!(strengths.len(), 4);
    // symmetric inputs fire all rules equally
    for &s in &strengths[1..] {
        assert_relative_eq!(s, strengths[0], epsilon = 1e-12);
    }
}

#[test]
fn zero_firing_yields_nan_output() {
    // a triangle far away from the probed input gives all-zero strengths
    let x = Variable::new("x", 0.0, 10.0).with_term(Term::new(
        "near_zero",
        TermKind::Triangle {
            a: 0.0,
            b: 1.0,
            c: 2.0,
        },
    ));
    let y =
        Variable::new("y", 0.0, 1.0).with_term(Term::new("c", TermKind::Constant { value: 1.0 }));
    let block = RuleBlock::new("rules").with_rule(Rule::new(
        Expr::prop("x", "near_zero"),
        Conclusion::new("y", "c"),
    ));
    let mut engine = Engine::new("zero")
        .with_input_variable(x)
        .with_output_variable(y)
        .with_rule_block(block);
    engine.build().unwrap();

    engine.set_input_value("x", 9.0).unwrap();
    let out = engine.eval();
    assert!(out[0].is_nan());
    assert!(engine.output_value("y").unwrap().is_nan());
}

#[test]
fn disjunctive_rule_uses_snorm() {
    let x = Variable::new("x", 0.0, 1.0)
        .with_term(bell("low", 0.0, 0.5))
        .with_term(bell("high", 1.0, 0.5));
    let y =
        Variable::new("y", 0.0, 1.0).with_term(Term::new("c", TermKind::Constant { value: 1.0 }));
    let block = RuleBlock::new("rules")
        .with_operators(TNorm::Minimum, SNorm::Maximum, TNorm::AlgebraicProduct)
        .with_rule(Rule::new(
            Expr::prop("x", "low").or(Expr::prop("x", "high")),
            Conclusion::new("y", "c"),
        ));
    let mut engine = Engine::new("or")
        .with_input_variable(x)
        .with_output_variable(y)
        .with_rule_block(block);
    engine.build().unwrap();

    engine.set_input_value("x", 0.0).unwrap();
    engine.eval();
    let strength = engine.layer_nodes(Layer::FiringStrength)[0];
    // max(mu_low(0), mu_high(0)) = mu_low(0) = 1
    assert_relative_eq!(engine.node_value(strength), 1.0, epsilon = 1e-12);
}
