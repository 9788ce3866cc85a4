//! Hybrid training of a one-input Sugeno system on the identity map.
//!
//! Run with: cargo run --example 01_basic_training

use anyhow::Result;
use ndarray::{Array1, Array2};

use neurofuzz_infer::Engine;
use neurofuzz_ir::{params, Conclusion, Expr, Rule, RuleBlock, Term, TermKind, Variable};
use neurofuzz_train::HybridTrainer;

fn main() -> Result<()> {
    let x = Variable::new("x", 0.0, 1.0)
        .with_term(Term::new(
            "low",
            TermKind::Bell {
                center: 0.0,
                width: 0.5,
                slope: 2.0,
            },
        ))
        .with_term(Term::new(
            "high",
            TermKind::Bell {
                center: 1.0,
                width: 0.5,
                slope: 2.0,
            },
        ));
    let y = Variable::new("y", 0.0, 1.0)
        .with_term(Term::new("low", TermKind::Constant { value: 0.0 }))
        .with_term(Term::new("high", TermKind::Constant { value: 0.0 }));
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

    let xs: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
    let data = Array2::from_shape_vec((11, 1), xs.clone())?;
    let targets = Array1::from_vec(xs);

    let mut trainer = HybridTrainer::with_defaults()?;
    let rmse = trainer.train(&mut engine, data.view(), targets.view(), 20, 1e-3)?;

    println!("final rmse: {rmse:.5}");
    for index in 0..2 {
        let term = engine.output_term(index)?;
        println!(
            "consequent '{}': {:?}",
            term.name(),
            params::parameters(term)
        );
    }

    engine.set_input_value("x", 0.25)?;
    engine.eval();
    println!("f(0.25) = {:.4}", engine.output_value("y")?);
    Ok(())
}
