//! Gradient-descent-only training.
//!
//! The degenerate variant of the hybrid algorithm: consequent parameters
//! stay fixed, and each epoch is just the backward pass plus one
//! steepest-descent step with the same adaptive step-size schedule.
//! Exists so antecedent-only learning can be isolated.

use indexmap::IndexMap;
use log::debug;
use ndarray::{ArrayView1, ArrayView2};

use neurofuzz_infer::{Engine, NodeId};

use crate::backward::{accumulate_sample, apply_step, GradientAccumulator};
use crate::cancel::CancelToken;
use crate::error::{TrainError, TrainResult};
use crate::hybrid::TrainerState;
use crate::metrics::RmseAccumulator;
use crate::step::StepSizePolicy;

/// Options of the gradient-descent trainer.
#[derive(Clone, Debug)]
pub struct DescentConfig {
    pub initial_step_size: f64,
    pub step_size_decrease_rate: f64,
    pub step_size_increase_rate: f64,
    pub momentum: f64,
    pub online: bool,
}

impl Default for DescentConfig {
    fn default() -> Self {
        DescentConfig {
            initial_step_size: 0.01,
            step_size_decrease_rate: 0.9,
            step_size_increase_rate: 1.1,
            momentum: 0.0,
            online: false,
        }
    }
}

/// Backpropagation over antecedent parameters only.
pub struct GradientDescentTrainer {
    config: DescentConfig,
    state: TrainerState,
    step: StepSizePolicy,
    accum: GradientAccumulator,
    previous_deltas: IndexMap<NodeId, Vec<f64>>,
    cancel: CancelToken,
}

impl GradientDescentTrainer {
    pub fn new(config: DescentConfig) -> TrainResult<Self> {
        if config.momentum < 0.0 {
            return Err(TrainError::InvalidParameter(format!(
                "momentum must be non-negative, got {}",
                config.momentum
            )));
        }
        let step = StepSizePolicy::new(
            config.initial_step_size,
            config.step_size_decrease_rate,
            config.step_size_increase_rate,
        )?;
        Ok(GradientDescentTrainer {
            config,
            state: TrainerState::Uninitialized,
            step,
            accum: GradientAccumulator::default(),
            previous_deltas: IndexMap::new(),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_defaults() -> TrainResult<Self> {
        Self::new(DescentConfig::default())
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn step_size(&self) -> f64 {
        self.step.step_size()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn init(&mut self, engine: &Engine) -> TrainResult<()> {
        if !engine.is_built() {
            return Err(TrainError::EngineNotBuilt);
        }
        if engine.num_rules() == 0 {
            return Err(TrainError::InvalidParameter(
                "engine has no enabled rules".to_string(),
            ));
        }
        self.accum.clear();
        self.previous_deltas.clear();
        self.state = TrainerState::Ready;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state = TrainerState::Uninitialized;
        self.accum.clear();
        self.previous_deltas.clear();
        self.step.reset();
        self.cancel.reset();
    }

    /// Train for up to `max_epochs`, stopping early at `error_goal` or
    /// on cancellation; returns the last epoch's RMSE.
    pub fn train(
        &mut self,
        engine: &mut Engine,
        data: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        max_epochs: usize,
        error_goal: f64,
    ) -> TrainResult<f64> {
        self.prepare(engine, data, targets)?;

        let mut rmse = f64::NAN;
        for epoch in 0..max_epochs {
            if self.cancel.is_cancelled() {
                debug!("training cancelled after {epoch} epochs");
                break;
            }
            rmse = self.run_epoch(engine, data, targets)?;
            self.step.record(rmse);
            debug!("epoch {epoch}: rmse {rmse:.6}, step size {}", self.step_size());
            if rmse <= error_goal {
                break;
            }
        }
        Ok(rmse)
    }

    /// Run exactly one epoch and return its RMSE.
    pub fn train_single_epoch(
        &mut self,
        engine: &mut Engine,
        data: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> TrainResult<f64> {
        self.prepare(engine, data, targets)?;
        self.run_epoch(engine, data, targets)
    }

    fn prepare(
        &mut self,
        engine: &Engine,
        data: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> TrainResult<()> {
        if self.state == TrainerState::Uninitialized {
            self.init(engine)?;
        }
        if data.ncols() != engine.num_input_variables() {
            return Err(TrainError::DataShape(format!(
                "data has {} columns, engine has {} inputs",
                data.ncols(),
                engine.num_input_variables()
            )));
        }
        if data.nrows() != targets.len() {
            return Err(TrainError::DataShape(format!(
                "data has {} rows, targets has {}",
                data.nrows(),
                targets.len()
            )));
        }
        Ok(())
    }

    fn run_epoch(
        &mut self,
        engine: &mut Engine,
        data: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> TrainResult<f64> {
        self.state = TrainerState::Training;
        let result = self.epoch(engine, data, targets);
        self.state = TrainerState::Ready;
        result
    }

    fn epoch(
        &mut self,
        engine: &mut Engine,
        data: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> TrainResult<f64> {
        let mut rmse = RmseAccumulator::new();
        for (row, &y) in data.outer_iter().zip(targets.iter()) {
            let inputs = row.to_vec();
            engine.set_input_values(&inputs)?;
            engine.eval();
            match accumulate_sample(engine, y, &mut self.accum)? {
                Some(predicted) => {
                    rmse.add(y - predicted);
                    if self.config.online {
                        apply_step(
                            engine,
                            &self.accum,
                            self.step.step_size(),
                            self.config.momentum,
                            &mut self.previous_deltas,
                        )?;
                        self.accum.clear();
                    }
                }
                None => debug!("zero firing strength; sample skipped"),
            }
        }
        if !self.config.online {
            apply_step(
                engine,
                &self.accum,
                self.step.step_size(),
                self.config.momentum,
                &mut self.previous_deltas,
            )?;
            self.accum.clear();
        }
        Ok(rmse.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use neurofuzz_ir::{params, Conclusion, Expr, Rule, RuleBlock, Term, TermKind, Variable};

    fn bell(name: &str, center: f64) -> Term {
        Term::new(
            name,
            TermKind::Bell {
                center,
                width: 0.5,
                slope: 2.0,
            },
        )
    }

    /// Bells nudged off their ideal centers, consequents already right.
    fn offset_engine() -> Engine {
        let x = Variable::new("x", 0.0, 1.0)
            .with_term(bell("low", 0.15))
            .with_term(bell("high", 0.85));
        let y = Variable::new("y", 0.0, 1.0)
            .with_term(Term::new("cl", TermKind::Constant { value: 0.0 }))
            .with_term(Term::new("ch", TermKind::Constant { value: 1.0 }));
        let block = RuleBlock::new("rules")
            .with_rule(Rule::new(Expr::prop("x", "low"), Conclusion::new("y", "cl")))
            .with_rule(Rule::new(Expr::prop("x", "high"), Conclusion::new("y", "ch")));
        let mut engine = Engine::new("offset")
            .with_input_variable(x)
            .with_output_variable(y)
            .with_rule_block(block);
        engine.build().unwrap();
        engine
    }

    fn identity_data() -> (Array2<f64>, Array1<f64>) {
        let xs: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        let data = Array2::from_shape_vec((11, 1), xs.clone()).unwrap();
        let targets = Array1::from_vec(xs);
        (data, targets)
    }

    #[test]
    fn consequents_stay_fixed() {
        let mut engine = offset_engine();
        let (data, targets) = identity_data();
        let mut trainer = GradientDescentTrainer::with_defaults().unwrap();
        trainer
            .train(&mut engine, data.view(), targets.view(), 5, 0.0)
            .unwrap();

        assert_eq!(
            params::parameters(engine.output_term(0).unwrap()),
            vec![0.0]
        );
        assert_eq!(
            params::parameters(engine.output_term(1).unwrap()),
            vec![1.0]
        );
    }

    #[test]
    fn antecedents_move() {
        let mut engine = offset_engine();
        let (data, targets) = identity_data();
        let before = params::parameters(engine.input_term(0, 0).unwrap());
        let mut trainer = GradientDescentTrainer::with_defaults().unwrap();
        trainer
            .train(&mut engine, data.view(), targets.view(), 3, 0.0)
            .unwrap();
        let after = params::parameters(engine.input_term(0, 0).unwrap());
        assert_ne!(before, after);
    }

    #[test]
    fn offline_descent_is_monotone_at_small_kappa() {
        let mut engine = offset_engine();
        let (data, targets) = identity_data();
        let mut trainer = GradientDescentTrainer::new(DescentConfig {
            initial_step_size: 0.001,
            ..DescentConfig::default()
        })
        .unwrap();

        let mut previous = f64::INFINITY;
        for _ in 0..5 {
            let rmse = trainer
                .train_single_epoch(&mut engine, data.view(), targets.view())
                .unwrap();
            assert!(rmse <= previous + 1e-12, "rmse rose: {previous} -> {rmse}");
            previous = rmse;
        }
    }

    #[test]
    fn state_machine_mirrors_hybrid() {
        let mut trainer = GradientDescentTrainer::with_defaults().unwrap();
        assert_eq!(trainer.state(), TrainerState::Uninitialized);
        let mut engine = offset_engine();
        let (data, targets) = identity_data();
        trainer
            .train(&mut engine, data.view(), targets.view(), 1, 0.0)
            .unwrap();
        assert_eq!(trainer.state(), TrainerState::Ready);
        trainer.reset();
        assert_eq!(trainer.state(), TrainerState::Uninitialized);
    }
}
