//! Backward pass: error derivatives with respect to antecedent term
//! parameters, and the steepest-descent parameter step.
//!
//! For a sample with target `y`, predicted `yhat = sum_r s_r f_r / S`
//! and instantaneous error `E = (y - yhat)^2`, the error signal at rule
//! r's firing strength is `dE/ds_r = (2 (yhat - y) / S) (f_r - yhat)`.
//! From there the chain runs through the strength node's norm fold, an
//! optional complement hedge, and the term's parameter derivative.

use indexmap::IndexMap;
use log::debug;

use neurofuzz_infer::{Engine, NodeId};
use neurofuzz_ir::{params, Norm, SNorm, TNorm};

use crate::error::{TrainError, TrainResult};

/// Per-term-node gradient vectors, keyed by term node handle. Insertion
/// order is first-seen order, which keeps parameter updates
/// deterministic across runs.
#[derive(Clone, Debug, Default)]
pub(crate) struct GradientAccumulator {
    grads: IndexMap<NodeId, Vec<f64>>,
}

impl GradientAccumulator {
    pub(crate) fn clear(&mut self) {
        self.grads.clear();
    }

    /// Global L2 norm over every accumulated component.
    pub(crate) fn norm(&self) -> f64 {
        self.grads
            .values()
            .flat_map(|g| g.iter())
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt()
    }

    fn add(&mut self, node: NodeId, component: &[f64], scale: f64) {
        let entry = self
            .grads
            .entry(node)
            .or_insert_with(|| vec![0.0; component.len()]);
        for (acc, c) in entry.iter_mut().zip(component) {
            *acc += scale * c;
        }
    }

    fn iter(&self) -> impl Iterator<Item = (NodeId, &Vec<f64>)> {
        self.grads.iter().map(|(&id, g)| (id, g))
    }
}

/// Derivative of the folded firing strength with respect to each of its
/// inputs `u`, per norm family.
fn strength_derivatives(norm: Norm, inputs: &[f64]) -> TrainResult<Vec<f64>> {
    match norm {
        Norm::T(TNorm::AlgebraicProduct) => Ok(inputs
            .iter()
            .enumerate()
            .map(|(k, _)| {
                inputs
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != k)
                    .map(|(_, &u)| u)
                    .product()
            })
            .collect()),
        Norm::T(TNorm::Minimum) => {
            let min = inputs.iter().copied().fold(f64::INFINITY, f64::min);
            Ok(inputs
                .iter()
                .map(|&u| if u == min { 1.0 } else { 0.0 })
                .collect())
        }
        Norm::S(SNorm::AlgebraicSum) => Ok(inputs
            .iter()
            .enumerate()
            .map(|(k, _)| {
                inputs
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != k)
                    .map(|(_, &u)| 1.0 - u)
                    .product()
            })
            .collect()),
        Norm::S(SNorm::Maximum) => {
            let max = inputs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Ok(inputs
                .iter()
                .map(|&u| if u == max { 1.0 } else { 0.0 })
                .collect())
        }
        other => Err(TrainError::NormGradientNotImplemented {
            norm: other.name().to_string(),
        }),
    }
}

/// Propagate the error signal for one evaluated sample into `accum`.
///
/// Returns the predicted output, or `None` when the firing-strength sum
/// is zero or non-finite; such samples contribute no gradient.
pub(crate) fn accumulate_sample(
    engine: &Engine,
    target: f64,
    accum: &mut GradientAccumulator,
) -> TrainResult<Option<f64>> {
    let strengths: Vec<f64> = engine
        .rule_topology()
        .iter()
        .map(|r| engine.node_value(r.strength_node))
        .collect();
    let total: f64 = strengths.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Ok(None);
    }

    let consequents: Vec<f64> = (0..strengths.len())
        .map(|r| engine.consequent_value(r))
        .collect::<Result<_, _>>()?;
    let predicted = strengths
        .iter()
        .zip(&consequents)
        .map(|(s, f)| s * f)
        .sum::<f64>()
        / total;
    if !predicted.is_finite() {
        return Ok(None);
    }

    for (r, topology) in engine.rule_topology().iter().enumerate() {
        let de_ds = 2.0 * (predicted - target) / total * (consequents[r] - predicted);

        let fold_inputs: Vec<f64> = engine
            .predecessors(topology.strength_node)
            .iter()
            .map(|&p| engine.node_value(p))
            .collect();
        let ds_du = strength_derivatives(topology.norm, &fold_inputs)?;

        for (k, &term_node) in topology.term_nodes.iter().enumerate() {
            // chain through the complement hedge when negated
            let sign = if topology.negated[k] { -1.0 } else { 1.0 };
            let de_dt = de_ds * ds_du[k] * sign;
            if de_dt == 0.0 {
                continue;
            }

            let (variable, term) = engine
                .term_node_location(term_node)
                .ok_or_else(|| TrainError::InvalidParameter(
                    "rule topology references a non-term node".to_string(),
                ))?;
            let x = engine.input_variable(variable)?.value();
            let dmu = params::derivative_wrt_parameters(engine.input_term(variable, term)?, x)?;
            accum.add(term_node, &dmu, de_dt);
        }
    }

    Ok(Some(predicted))
}

/// One steepest-descent transition of length `step_size` along the
/// accumulated gradient, with optional momentum. A zero gradient norm
/// skips the step.
pub(crate) fn apply_step(
    engine: &mut Engine,
    accum: &GradientAccumulator,
    step_size: f64,
    momentum: f64,
    previous_deltas: &mut IndexMap<NodeId, Vec<f64>>,
) -> TrainResult<()> {
    let norm = accum.norm();
    if norm == 0.0 {
        debug!("gradient norm is zero; skipping parameter step");
        return Ok(());
    }
    if !norm.is_finite() {
        return Err(TrainError::InvalidParameter(format!(
            "gradient norm is {norm}"
        )));
    }
    let eta = step_size / norm;

    for (node, gradient) in accum.iter() {
        let (variable, term) = engine.term_node_location(node).ok_or_else(|| {
            TrainError::InvalidParameter("gradient recorded for a non-term node".to_string())
        })?;
        let term_ref = engine.input_term_mut(variable, term)?;
        let mut values = params::parameters(term_ref);
        let previous = previous_deltas
            .entry(node)
            .or_insert_with(|| vec![0.0; gradient.len()]);
        for i in 0..gradient.len() {
            let delta = -eta * gradient[i] + momentum * previous[i];
            values[i] += delta;
            previous[i] = delta;
        }
        params::set_parameters(term_ref, &values)?;
    }
    Ok(())
}
