//! The hybrid learning algorithm (Jang, 1993).
//!
//! Each epoch combines a forward pass, in which the consequent
//! parameters are identified by recursive least squares over regressors
//! built from normalized firing strengths, and a backward pass, in which
//! error derivatives flow from the output back to the antecedent term
//! parameters, which then take one steepest-descent step of adaptive
//! length.

use indexmap::IndexMap;
use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2};

use neurofuzz_infer::{Engine, Layer, NodeId};
use neurofuzz_ir::{params, TermKind};

use crate::backward::{accumulate_sample, apply_step, GradientAccumulator};
use crate::cancel::CancelToken;
use crate::error::{TrainError, TrainResult};
use crate::metrics::RmseAccumulator;
use crate::rls::{RecursiveLeastSquares, DEFAULT_COVARIANCE_SCALE};
use crate::step::StepSizePolicy;

/// Options of the hybrid algorithm.
#[derive(Clone, Debug)]
pub struct HybridConfig {
    /// Initial transition length along the gradient.
    pub initial_step_size: f64,
    /// Multiplier applied to kappa when the error oscillates; in (0, 1).
    pub step_size_decrease_rate: f64,
    /// Multiplier applied to kappa under sustained descent; above 1.
    pub step_size_increase_rate: f64,
    /// RLS forgetting factor; in (0, 1].
    pub forgetting_factor: f64,
    /// Coefficient of the previous parameter delta.
    pub momentum: f64,
    /// Update antecedent parameters after each sample instead of once
    /// per epoch.
    pub online: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        HybridConfig {
            initial_step_size: 0.01,
            step_size_decrease_rate: 0.9,
            step_size_increase_rate: 1.1,
            forgetting_factor: 1.0,
            momentum: 0.0,
            online: false,
        }
    }
}

/// Trainer lifecycle: `Uninitialized` until the first `train` call (or
/// an explicit `init`), `Training` while an epoch runs, `Ready` between
/// epochs. `reset` returns to `Uninitialized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainerState {
    Uninitialized,
    Ready,
    Training,
}

/// Layout of one rule's block inside the concatenated consequent
/// parameter vector.
#[derive(Clone, Copy, Debug)]
struct ConsequentSlot {
    offset: usize,
    len: usize,
    linear: bool,
}

/// Hybrid trainer over a built [`Engine`].
///
/// The trainer borrows the engine mutably only for the duration of each
/// call; between calls the engine is free to evaluate.
pub struct HybridTrainer {
    config: HybridConfig,
    state: TrainerState,
    step: StepSizePolicy,
    rls: RecursiveLeastSquares,
    accum: GradientAccumulator,
    previous_deltas: IndexMap<NodeId, Vec<f64>>,
    layout: Vec<ConsequentSlot>,
    cancel: CancelToken,
}

impl HybridTrainer {
    /// Create a trainer, validating every configuration value.
    pub fn new(config: HybridConfig) -> TrainResult<Self> {
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
        let rls = RecursiveLeastSquares::new(config.forgetting_factor)?;
        Ok(HybridTrainer {
            config,
            state: TrainerState::Uninitialized,
            step,
            rls,
            accum: GradientAccumulator::default(),
            previous_deltas: IndexMap::new(),
            layout: Vec::new(),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_defaults() -> TrainResult<Self> {
        Self::new(HybridConfig::default())
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    /// Current kappa; positive for every epoch.
    pub fn step_size(&self) -> f64 {
        self.step.step_size()
    }

    /// A handle that cancels training at the next epoch boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Size the estimator against the engine's consequent layout and
    /// become `Ready`. Called implicitly by the first `train`.
    pub fn init(&mut self, engine: &Engine) -> TrainResult<()> {
        if !engine.is_built() {
            return Err(TrainError::EngineNotBuilt);
        }
        if engine.num_rules() == 0 {
            return Err(TrainError::InvalidParameter(
                "engine has no enabled rules".to_string(),
            ));
        }

        let inputs = engine.num_input_variables();
        let mut layout = Vec::with_capacity(engine.num_rules());
        let mut offset = 0;
        for (rule, topology) in engine.rule_topology().iter().enumerate() {
            let term = engine.output_term(topology.consequent_term)?;
            let (len, linear) = match term.kind() {
                TermKind::Constant { .. } => (1, false),
                TermKind::Linear { coefficients } => {
                    if coefficients.len() != inputs + 1 {
                        return Err(TrainError::DataShape(format!(
                            "linear consequent of rule {rule} has {} coefficients, expected {}",
                            coefficients.len(),
                            inputs + 1
                        )));
                    }
                    (inputs + 1, true)
                }
                other => {
                    return Err(TrainError::UnsupportedConsequent {
                        rule,
                        kind: other.name().to_string(),
                    })
                }
            };
            layout.push(ConsequentSlot {
                offset,
                len,
                linear,
            });
            offset += len;
        }

        self.layout = layout;
        self.rls.reset(offset, DEFAULT_COVARIANCE_SCALE);
        self.accum.clear();
        self.previous_deltas.clear();
        self.state = TrainerState::Ready;
        Ok(())
    }

    /// Forget everything learned about the engine: RLS state, gradient
    /// accumulators, the step-size window and momentum history.
    pub fn reset(&mut self) {
        self.state = TrainerState::Uninitialized;
        self.rls.reset(0, DEFAULT_COVARIANCE_SCALE);
        self.accum.clear();
        self.previous_deltas.clear();
        self.layout.clear();
        self.step.reset();
        self.cancel.reset();
    }

    /// Train for up to `max_epochs`, stopping early when the epoch RMSE
    /// reaches `error_goal` or cancellation is requested. Returns the
    /// RMSE of the last completed epoch.
    ///
    /// `data` holds one sample per row, columns in engine input order;
    /// `targets` holds the desired outputs.
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
        let result = if self.config.online {
            self.epoch_online(engine, data, targets)
        } else {
            self.epoch_offline(engine, data, targets)
        };
        self.state = TrainerState::Ready;
        result
    }

    /// Batch epoch: identify consequents over the whole dataset, write
    /// them back, then accumulate antecedent gradients and step once.
    ///
    /// The estimator restarts every epoch; regressors computed under the
    /// previous antecedent parameters must not leak into this epoch's
    /// identification.
    fn epoch_offline(
        &mut self,
        engine: &mut Engine,
        data: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> TrainResult<f64> {
        self.rls
            .reset(self.rls.dimension(), DEFAULT_COVARIANCE_SCALE);
        let mut folded = 0usize;
        for (row, &y) in data.outer_iter().zip(targets.iter()) {
            if self.forward_sample(engine, row, y)? {
                folded += 1;
            }
        }
        // with nothing folded the estimate is still the zero vector and
        // must not overwrite the consequents
        if folded > 0 {
            self.write_back(engine)?;
        }

        let mut rmse = RmseAccumulator::new();
        for (row, &y) in data.outer_iter().zip(targets.iter()) {
            let inputs = row.to_vec();
            engine.set_input_values(&inputs)?;
            engine.eval();
            match accumulate_sample(engine, y, &mut self.accum)? {
                Some(predicted) => rmse.add(y - predicted),
                None => debug!("zero firing strength; sample skipped"),
            }
        }
        apply_step(
            engine,
            &self.accum,
            self.step.step_size(),
            self.config.momentum,
            &mut self.previous_deltas,
        )?;
        self.accum.clear();
        Ok(rmse.value())
    }

    /// Online epoch: consequent and antecedent parameters are updated
    /// after every sample.
    fn epoch_online(
        &mut self,
        engine: &mut Engine,
        data: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> TrainResult<f64> {
        let mut rmse = RmseAccumulator::new();
        for (row, &y) in data.outer_iter().zip(targets.iter()) {
            let updated = self.forward_sample(engine, row, y)?;
            if updated {
                self.write_back(engine)?;
            }
            match accumulate_sample(engine, y, &mut self.accum)? {
                Some(predicted) => {
                    rmse.add(y - predicted);
                    apply_step(
                        engine,
                        &self.accum,
                        self.step.step_size(),
                        self.config.momentum,
                        &mut self.previous_deltas,
                    )?;
                }
                None => debug!("zero firing strength; sample skipped"),
            }
            self.accum.clear();
        }
        Ok(rmse.value())
    }

    /// Run layers 0..5 for one sample and fold its regressor into the
    /// estimator. Returns false when the sample was skipped.
    fn forward_sample(
        &mut self,
        engine: &mut Engine,
        row: ArrayView1<'_, f64>,
        target: f64,
    ) -> TrainResult<bool> {
        let inputs = row.to_vec();
        engine.set_input_values(&inputs)?;
        engine.eval_layer(Layer::Input);
        engine.eval_layer(Layer::Term);
        engine.eval_layer(Layer::Hedge);
        let strengths = engine.eval_layer(Layer::FiringStrength);
        engine.eval_layer(Layer::Implication);
        let sums = engine.eval_layer(Layer::Sum);

        let total = sums[1];
        if total == 0.0 || !total.is_finite() {
            debug!("zero firing strength; sample excluded from least squares");
            return Ok(false);
        }

        let mut phi = Array1::zeros(self.rls.dimension());
        for (slot, &strength) in self.layout.iter().zip(&strengths) {
            let weight = strength / total;
            if slot.linear {
                for (i, &x) in inputs.iter().enumerate() {
                    phi[slot.offset + i] = weight * x;
                }
                phi[slot.offset + slot.len - 1] = weight;
            } else {
                phi[slot.offset] = weight;
            }
        }
        self.rls.update(phi.view(), target)?;
        Ok(true)
    }

    /// Copy the estimate back into the consequent terms, rule by rule.
    fn write_back(&self, engine: &mut Engine) -> TrainResult<()> {
        let theta = self.rls.solution().to_vec();
        let consequent_terms: Vec<usize> = engine
            .rule_topology()
            .iter()
            .map(|r| r.consequent_term)
            .collect();
        for (slot, &term_index) in self.layout.iter().zip(&consequent_terms) {
            let term = engine.output_term_mut(term_index)?;
            params::set_parameters(term, &theta[slot.offset..slot.offset + slot.len])?;
        }
        Ok(())
    }
}
