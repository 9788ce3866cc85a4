//! Gradient descent over antecedent parameters with fixed consequents.
//!
//! Run with: cargo run --example 02_antecedent_only

use anyhow::Result;
use ndarray::{Array1, Array2};

use neurofuzz_infer::Engine;
use neurofuzz_ir::{params, Conclusion, Expr, Rule, RuleBlock, Term, TermKind, Variable};
use neurofuzz_train::{DescentConfig, GradientDescentTrainer};

fn main() -> Result<()> {
    // bells deliberately off-center; descent has to pull them back
    let x = Variable::new("x", 0.0, 1.0)
        .with_term(Term::new(
            "low",
            TermKind::Bell {
                center: 0.2,
                width: 0.5,
                slope: 2.0,
            },
        ))
        .with_term(Term::new(
            "high",
            TermKind::Bell {
                center: 0.8,
                width: 0.5,
                slope: 2.0,
            },
        ));
    let y = Variable::new("y", 0.0, 1.0)
        .with_term(Term::new("low", TermKind::Constant { value: 0.0 }))
        .with_term(Term::new("high", TermKind::Constant { value: 1.0 }));
    let block = RuleBlock::new("rules")
        .with_rule(Rule::new(Expr::prop("x", "low"), Conclusion::new("y", "low")))
        .with_rule(Rule::new(
            Expr::prop("x", "high"),
            Conclusion::new("y", "high"),
        ));

    let mut engine = Engine::new("identity")
        .with_input_variable(x)
        .with_output_variable(y)
        .with_rule_block(block);
    engine.build()?;

    let xs: Vec<f64> = (0..=20).map(|i| i as f64 / 20.0).collect();
    let data = Array2::from_shape_vec((21, 1), xs.clone())?;
    let targets = Array1::from_vec(xs);

    let mut trainer = GradientDescentTrainer::new(DescentConfig {
        initial_step_size: 0.02,
        momentum: 0.5,
        ..DescentConfig::default()
    })?;
    let rmse = trainer.train(&mut engine, data.view(), targets.view(), 50, 1e-3)?;

    println!("final rmse: {rmse:.5}, step size {:.5}", trainer.step_size());
    for (variable, term) in [(0, 0), (0, 1)] {
        let t = engine.input_term(variable, term)?;
        println!("bell '{}': {:?}", t.name(), params::parameters(t));
    }
    Ok(())
}
