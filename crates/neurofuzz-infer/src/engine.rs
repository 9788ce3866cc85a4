//! The adaptive network engine.

use std::collections::HashMap;

use log::debug;

use neurofuzz_ir::flatten::flatten;
use neurofuzz_ir::{Connective, Hedge, Norm, RuleBlock, TNorm, Term, TermKind, Variable};

use crate::error::{EngineError, EngineResult};
use crate::node::{fold_strength, normalize, Node, NodeId, NodeKind};

/// The seven layers of the network, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Input,
    Term,
    Hedge,
    FiringStrength,
    Implication,
    Sum,
    Normalization,
}

/// Per-rule wiring recorded during `build`, in rule creation order.
///
/// `term_nodes[k]` is the term-layer node behind the k-th antecedent
/// triple; when `negated[k]` the firing-strength node is actually fed by
/// that term's complement hedge node. The order of `term_nodes` matches
/// the flattened antecedent and the layout of least-squares regressors.
#[derive(Clone, Debug)]
pub struct RuleTopology {
    pub strength_node: NodeId,
    pub implication_node: NodeId,
    pub term_nodes: Vec<NodeId>,
    pub negated: Vec<bool>,
    pub norm: Norm,
    pub activation: TNorm,
    /// Index of the consequent term within the output variable's terms.
    pub consequent_term: usize,
}

/// A single-output Sugeno engine and the layered DAG built from it.
///
/// The engine owns its variables and rule blocks, and is the arena for
/// the graph: nodes are addressed by handles, adjacency is kept as
/// predecessor and successor lists in insertion order. `build` creates
/// the nodes, `clear` (or dropping the engine) releases them; a failed
/// `build` clears any partially constructed graph before returning.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    name: String,
    inputs: Vec<Variable>,
    outputs: Vec<Variable>,
    rule_blocks: Vec<RuleBlock>,
    check_uniform_consequent_order: bool,

    nodes: Vec<Node>,
    preds: Vec<Vec<NodeId>>,
    succs: Vec<Vec<NodeId>>,

    input_nodes: Vec<NodeId>,
    term_nodes: Vec<NodeId>,
    hedge_nodes: Vec<NodeId>,
    strength_nodes: Vec<NodeId>,
    implication_nodes: Vec<NodeId>,
    sum_nodes: Vec<NodeId>,
    normalization_nodes: Vec<NodeId>,

    rules: Vec<RuleTopology>,
}

struct PendingRule {
    norm: Norm,
    activation: TNorm,
    triples: Vec<(usize, usize, bool)>,
    consequent_term: usize,
}

impl Engine {
    pub fn new(name: impl Into<String>) -> Self {
        Engine {
            name: name.into(),
            ..Engine::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_input_variable(mut self, variable: Variable) -> Self {
        self.add_input_variable(variable);
        self
    }

    pub fn with_output_variable(mut self, variable: Variable) -> Self {
        self.add_output_variable(variable);
        self
    }

    pub fn with_rule_block(mut self, block: RuleBlock) -> Self {
        self.add_rule_block(block);
        self
    }

    /// Opt into the consequent-order validation during `check`: when on,
    /// the output variable's Constant and Linear terms must not be mixed.
    pub fn set_check_uniform_consequent_order(&mut self, enabled: bool) {
        self.check_uniform_consequent_order = enabled;
    }

    // ---- input variables ------------------------------------------------

    pub fn add_input_variable(&mut self, variable: Variable) {
        self.inputs.push(variable);
    }

    pub fn insert_input_variable(&mut self, index: usize, variable: Variable) -> EngineResult<()> {
        if index > self.inputs.len() {
            return Err(self.out_of_range(index, self.inputs.len()));
        }
        self.inputs.insert(index, variable);
        Ok(())
    }

    /// Replace the variable at `index`, returning the previous one.
    pub fn replace_input_variable(
        &mut self,
        index: usize,
        variable: Variable,
    ) -> EngineResult<Variable> {
        let len = self.inputs.len();
        let slot = self
            .inputs
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, variable))
    }

    pub fn input_variable(&self, index: usize) -> EngineResult<&Variable> {
        self.inputs
            .get(index)
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.inputs.len(),
            })
    }

    pub fn input_variable_mut(&mut self, index: usize) -> EngineResult<&mut Variable> {
        let len = self.inputs.len();
        self.inputs
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })
    }

    pub fn input_variable_by_name(&self, name: &str) -> EngineResult<&Variable> {
        self.inputs
            .iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| EngineError::InputVariableNotFound {
                name: name.to_string(),
            })
    }

    pub fn remove_input_variable(&mut self, index: usize) -> EngineResult<Variable> {
        if index >= self.inputs.len() {
            return Err(self.out_of_range(index, self.inputs.len()));
        }
        Ok(self.inputs.remove(index))
    }

    pub fn remove_input_variable_by_name(&mut self, name: &str) -> EngineResult<Variable> {
        match self.inputs.iter().position(|v| v.name() == name) {
            Some(index) => Ok(self.inputs.remove(index)),
            None => Err(EngineError::InputVariableNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn has_input_variable(&self, name: &str) -> bool {
        self.inputs.iter().any(|v| v.name() == name)
    }

    pub fn input_variables(&self) -> &[Variable] {
        &self.inputs
    }

    pub fn num_input_variables(&self) -> usize {
        self.inputs.len()
    }

    // ---- output variables -----------------------------------------------

    pub fn add_output_variable(&mut self, variable: Variable) {
        self.outputs.push(variable);
    }

    pub fn insert_output_variable(&mut self, index: usize, variable: Variable) -> EngineResult<()> {
        if index > self.outputs.len() {
            return Err(self.out_of_range(index, self.outputs.len()));
        }
        self.outputs.insert(index, variable);
        Ok(())
    }

    pub fn replace_output_variable(
        &mut self,
        index: usize,
        variable: Variable,
    ) -> EngineResult<Variable> {
        let len = self.outputs.len();
        let slot = self
            .outputs
            .get_mut(index)
            .ok_or(EngineError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, variable))
    }

    pub fn output_variable(&self, index: usize) -> EngineResult<&Variable> {
        self.outputs
            .get(index)
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.outputs.len(),
            })
    }

    pub fn output_variable_by_name(&self, name: &str) -> EngineResult<&Variable> {
        self.outputs
            .iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| EngineError::OutputVariableNotFound {
                name: name.to_string(),
            })
    }

    pub fn remove_output_variable(&mut self, index: usize) -> EngineResult<Variable> {
        if index >= self.outputs.len() {
            return Err(self.out_of_range(index, self.outputs.len()));
        }
        Ok(self.outputs.remove(index))
    }

    pub fn remove_output_variable_by_name(&mut self, name: &str) -> EngineResult<Variable> {
        match self.outputs.iter().position(|v| v.name() == name) {
            Some(index) => Ok(self.outputs.remove(index)),
            None => Err(EngineError::OutputVariableNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn has_output_variable(&self, name: &str) -> bool {
        self.outputs.iter().any(|v| v.name() == name)
    }

    pub fn output_variables(&self) -> &[Variable] {
        &self.outputs
    }

    pub fn num_output_variables(&self) -> usize {
        self.outputs.len()
    }

    // ---- rule blocks ----------------------------------------------------

    pub fn add_rule_block(&mut self, block: RuleBlock) {
        self.rule_blocks.push(block);
    }

    pub fn insert_rule_block(&mut self, index: usize, block: RuleBlock) -> EngineResult<()> {
        if index > self.rule_blocks.len() {
            return Err(self.out_of_range(index, self.rule_blocks.len()));
        }
        self.rule_blocks.insert(index, block);
        Ok(())
    }

    pub fn rule_block(&self, index: usize) -> EngineResult<&RuleBlock> {
        self.rule_blocks
            .get(index)
            .ok_or(EngineError::IndexOutOfRange {
                index,
                len: self.rule_blocks.len(),
            })
    }

    pub fn rule_block_by_name(&self, name: &str) -> EngineResult<&RuleBlock> {
        self.rule_blocks
            .iter()
            .find(|b| b.name() == name)
            .ok_or_else(|| EngineError::RuleBlockNotFound {
                name: name.to_string(),
            })
    }

    pub fn remove_rule_block(&mut self, index: usize) -> EngineResult<RuleBlock> {
        if index >= self.rule_blocks.len() {
            return Err(self.out_of_range(index, self.rule_blocks.len()));
        }
        Ok(self.rule_blocks.remove(index))
    }

    pub fn remove_rule_block_by_name(&mut self, name: &str) -> EngineResult<RuleBlock> {
        match self.rule_blocks.iter().position(|b| b.name() == name) {
            Some(index) => Ok(self.rule_blocks.remove(index)),
            None => Err(EngineError::RuleBlockNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn has_rule_block(&self, name: &str) -> bool {
        self.rule_blocks.iter().any(|b| b.name() == name)
    }

    pub fn rule_blocks(&self) -> &[RuleBlock] {
        &self.rule_blocks
    }

    pub fn num_rule_blocks(&self) -> usize {
        self.rule_blocks.len()
    }

    // ---- crisp values ---------------------------------------------------

    pub fn set_input_value(&mut self, name: &str, value: f64) -> EngineResult<()> {
        let variable = self
            .inputs
            .iter_mut()
            .find(|v| v.name() == name)
            .ok_or_else(|| EngineError::InputVariableNotFound {
                name: name.to_string(),
            })?;
        variable.set_value(value);
        Ok(())
    }

    /// Set all input values at once, in variable order.
    pub fn set_input_values(&mut self, values: &[f64]) -> EngineResult<()> {
        if values.len() != self.inputs.len() {
            return Err(EngineError::InputArity {
                expected: self.inputs.len(),
                got: values.len(),
            });
        }
        for (variable, &value) in self.inputs.iter_mut().zip(values) {
            variable.set_value(value);
        }
        Ok(())
    }

    pub fn input_values(&self) -> Vec<f64> {
        self.inputs.iter().map(Variable::value).collect()
    }

    pub fn output_value(&self, name: &str) -> EngineResult<f64> {
        Ok(self.output_variable_by_name(name)?.value())
    }

    // ---- graph construction ---------------------------------------------

    /// Structural validation: exactly one output variable, exactly one
    /// conclusion per enabled rule, and (opt-in) uniform consequent order.
    pub fn check(&self) -> EngineResult<()> {
        if self.outputs.len() != 1 {
            return Err(EngineError::OutputVariableCount {
                found: self.outputs.len(),
            });
        }
        let mut index = 0;
        for block in self.rule_blocks.iter().filter(|b| b.is_enabled()) {
            for rule in block.rules() {
                if rule.conclusions().len() != 1 {
                    return Err(EngineError::ConclusionCount {
                        rule: index,
                        found: rule.conclusions().len(),
                    });
                }
                index += 1;
            }
        }
        if self.check_uniform_consequent_order {
            let mut order = None;
            for term in self.outputs[0].terms() {
                let this = match term.kind() {
                    TermKind::Constant { .. } => Some(0u8),
                    TermKind::Linear { .. } => Some(1),
                    _ => None,
                };
                match (order, this) {
                    (None, Some(o)) => order = Some(o),
                    (Some(prev), Some(o)) if prev != o => {
                        return Err(EngineError::MixedConsequentOrder)
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Build the layered graph from the variables and rule blocks.
    ///
    /// Any previously built graph is discarded first; on failure the
    /// partially built graph is destroyed before the error propagates.
    pub fn build(&mut self) -> EngineResult<()> {
        self.clear();
        if let Err(e) = self.try_build() {
            self.clear();
            return Err(e);
        }
        Ok(())
    }

    fn try_build(&mut self) -> EngineResult<()> {
        self.check()?;

        let pending = self.resolve_rules()?;

        let mut term_node: HashMap<(usize, usize), NodeId> = HashMap::new();
        let mut hedge_node: HashMap<(usize, usize), NodeId> = HashMap::new();

        // Layer 0: one node per input variable.
        let mut var_node = Vec::with_capacity(self.inputs.len());
        for variable in 0..self.inputs.len() {
            let id = self.add_node(NodeKind::Input { variable });
            self.input_nodes.push(id);
            var_node.push(id);
        }

        // Layer 1: one node per term of each input variable.
        for variable in 0..self.inputs.len() {
            for term in 0..self.inputs[variable].terms().len() {
                let id = self.add_node(NodeKind::Term { variable, term });
                self.term_nodes.push(id);
                term_node.insert((variable, term), id);
                self.connect(var_node[variable], id);
            }
        }

        // Layer 2: the complement of every term node, materialized even
        // when unused so term indices stay stable.
        for variable in 0..self.inputs.len() {
            for term in 0..self.inputs[variable].terms().len() {
                let id = self.add_node(NodeKind::Hedge { hedge: Hedge::Not });
                self.hedge_nodes.push(id);
                hedge_node.insert((variable, term), id);
                self.connect(term_node[&(variable, term)], id);
            }
        }

        // Layer 3: one firing-strength node per rule, fed in flattened
        // antecedent order, switching to the complement when negated.
        for rule in &pending {
            let id = self.add_node(NodeKind::FiringStrength { norm: rule.norm });
            self.strength_nodes.push(id);
            for &(variable, term, negated) in &rule.triples {
                let from = if negated {
                    hedge_node[&(variable, term)]
                } else {
                    term_node[&(variable, term)]
                };
                self.connect(from, id);
            }
        }

        // Layer 4: one implication node per rule.
        for (r, rule) in pending.iter().enumerate() {
            let id = self.add_node(NodeKind::Implication {
                rule: r,
                activation: rule.activation,
            });
            self.implication_nodes.push(id);
            self.connect(self.strength_nodes[r], id);
        }

        for (r, rule) in pending.iter().enumerate() {
            self.rules.push(RuleTopology {
                strength_node: self.strength_nodes[r],
                implication_node: self.implication_nodes[r],
                term_nodes: rule
                    .triples
                    .iter()
                    .map(|&(v, t, _)| term_node[&(v, t)])
                    .collect(),
                negated: rule.triples.iter().map(|&(_, _, n)| n).collect(),
                norm: rule.norm,
                activation: rule.activation,
                consequent_term: rule.consequent_term,
            });
        }

        // Layer 5: the sum of the implications, then the sum of the
        // firing strengths, each aggregating in creation order.
        let sum_implications = self.add_node(NodeKind::Sum);
        self.sum_nodes.push(sum_implications);
        for r in 0..self.implication_nodes.len() {
            self.connect(self.implication_nodes[r], sum_implications);
        }
        let sum_strengths = self.add_node(NodeKind::Sum);
        self.sum_nodes.push(sum_strengths);
        for r in 0..self.strength_nodes.len() {
            self.connect(self.strength_nodes[r], sum_strengths);
        }

        // Layer 6: the normalization node.
        let normalization = self.add_node(NodeKind::Normalization);
        self.normalization_nodes.push(normalization);
        self.connect(sum_implications, normalization);
        self.connect(sum_strengths, normalization);

        Ok(())
    }

    fn resolve_rules(&self) -> EngineResult<Vec<PendingRule>> {
        let mut pending = Vec::new();
        for block in self.rule_blocks.iter().filter(|b| b.is_enabled()) {
            for rule in block.rules() {
                let flat = flatten(rule.antecedent())?;
                let norm = match flat.connective {
                    Connective::And => Norm::T(block.conjunction()),
                    Connective::Or => Norm::S(block.disjunction()),
                };
                let mut triples = Vec::with_capacity(flat.len());
                for (var_name, term_name, negated) in flat.iter() {
                    let variable = self
                        .inputs
                        .iter()
                        .position(|v| v.name() == var_name)
                        .ok_or_else(|| EngineError::InputVariableNotFound {
                            name: var_name.to_string(),
                        })?;
                    let term = self.inputs[variable].term_index(term_name).ok_or_else(|| {
                        EngineError::TermNotFound {
                            variable: var_name.to_string(),
                            term: term_name.to_string(),
                        }
                    })?;
                    triples.push((variable, term, negated));
                }

                let conclusion = &rule.conclusions()[0];
                let output = &self.outputs[0];
                if conclusion.variable != output.name() {
                    return Err(EngineError::OutputVariableNotFound {
                        name: conclusion.variable.clone(),
                    });
                }
                let consequent_term = output.term_index(&conclusion.term).ok_or_else(|| {
                    EngineError::TermNotFound {
                        variable: conclusion.variable.clone(),
                        term: conclusion.term.clone(),
                    }
                })?;

                pending.push(PendingRule {
                    norm,
                    activation: block.activation(),
                    triples,
                    consequent_term,
                });
            }
        }
        Ok(pending)
    }

    /// Drop every node and all adjacency; the rule base is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.preds.clear();
        self.succs.clear();
        self.input_nodes.clear();
        self.term_nodes.clear();
        self.hedge_nodes.clear();
        self.strength_nodes.clear();
        self.implication_nodes.clear();
        self.sum_nodes.clear();
        self.normalization_nodes.clear();
        self.rules.clear();
    }

    pub fn is_built(&self) -> bool {
        !self.normalization_nodes.is_empty()
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.push_node(kind);
        id
    }

    fn push_node(&mut self, kind: NodeKind) {
        self.nodes.push(Node::new(kind));
        self.preds.push(Vec::new());
        self.succs.push(Vec::new());
    }

    /// Append `from` to `to`'s predecessors and `to` to `from`'s
    /// successors.
    fn connect(&mut self, from: NodeId, to: NodeId) {
        self.preds[to].push(from);
        self.succs[from].push(to);
    }

    fn out_of_range(&self, index: usize, len: usize) -> EngineError {
        EngineError::IndexOutOfRange { index, len }
    }

    // ---- graph inspection -----------------------------------------------

    pub fn layer_nodes(&self, layer: Layer) -> &[NodeId] {
        match layer {
            Layer::Input => &self.input_nodes,
            Layer::Term => &self.term_nodes,
            Layer::Hedge => &self.hedge_nodes,
            Layer::FiringStrength => &self.strength_nodes,
            Layer::Implication => &self.implication_nodes,
            Layer::Sum => &self.sum_nodes,
            Layer::Normalization => &self.normalization_nodes,
        }
    }

    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        &self.preds[id]
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.succs[id]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Cached value of a node; NaN for an unknown handle.
    pub fn node_value(&self, id: NodeId) -> f64 {
        self.nodes.get(id).map_or(f64::NAN, Node::value)
    }

    /// The (variable, term) indices behind a term-layer node.
    pub fn term_node_location(&self, id: NodeId) -> Option<(usize, usize)> {
        match self.nodes.get(id).map(Node::kind) {
            Some(NodeKind::Term { variable, term }) => Some((variable, term)),
            _ => None,
        }
    }

    /// Wiring of the enabled rules, in creation order.
    pub fn rule_topology(&self) -> &[RuleTopology] {
        &self.rules
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn input_term(&self, variable: usize, term: usize) -> EngineResult<&Term> {
        let v = self.input_variable(variable)?;
        v.term(term).ok_or(EngineError::IndexOutOfRange {
            index: term,
            len: v.terms().len(),
        })
    }

    pub fn input_term_mut(&mut self, variable: usize, term: usize) -> EngineResult<&mut Term> {
        let v = self.input_variable_mut(variable)?;
        let len = v.terms().len();
        v.term_mut(term)
            .ok_or(EngineError::IndexOutOfRange { index: term, len })
    }

    pub fn output_term(&self, term: usize) -> EngineResult<&Term> {
        let output = self
            .outputs
            .first()
            .ok_or(EngineError::OutputVariableCount { found: 0 })?;
        output.term(term).ok_or(EngineError::IndexOutOfRange {
            index: term,
            len: output.terms().len(),
        })
    }

    pub fn output_term_mut(&mut self, term: usize) -> EngineResult<&mut Term> {
        let output = self
            .outputs
            .first_mut()
            .ok_or(EngineError::OutputVariableCount { found: 0 })?;
        let len = output.terms().len();
        output
            .term_mut(term)
            .ok_or(EngineError::IndexOutOfRange { index: term, len })
    }

    /// The rule's Sugeno consequent evaluated at the current inputs.
    pub fn consequent_value(&self, rule: usize) -> EngineResult<f64> {
        let topology = self.rules.get(rule).ok_or(EngineError::IndexOutOfRange {
            index: rule,
            len: self.rules.len(),
        })?;
        let term = self.output_term(topology.consequent_term)?;
        Ok(self.consequent_value_of(term))
    }

    fn consequent_value_of(&self, term: &Term) -> f64 {
        let inputs = self.input_values();
        term.kind().consequent_value(&inputs)
    }

    // ---- evaluation -----------------------------------------------------

    /// Evaluate every node of one layer in insertion order and return
    /// their outputs.
    pub fn eval_layer(&mut self, layer: Layer) -> Vec<f64> {
        let ids = self.layer_nodes(layer).to_vec();
        ids.into_iter().map(|id| self.eval_node(id)).collect()
    }

    /// Full forward pass: evaluate layers 0..6 in order, project the
    /// normalization output onto the output variable, and return the
    /// normalization layer's outputs.
    pub fn eval(&mut self) -> Vec<f64> {
        self.eval_layer(Layer::Input);
        self.eval_layer(Layer::Term);
        self.eval_layer(Layer::Hedge);
        self.eval_layer(Layer::FiringStrength);
        self.eval_layer(Layer::Implication);
        self.eval_layer(Layer::Sum);
        let out = self.eval_layer(Layer::Normalization);

        let value = out.first().copied().unwrap_or(f64::NAN);
        if value.is_nan() {
            debug!("engine '{}': zero firing-strength sum, output is NaN", self.name);
        }
        if let Some(output) = self.outputs.first_mut() {
            output.set_value(value);
        }
        out
    }

    fn eval_node(&mut self, id: NodeId) -> f64 {
        let value = match self.nodes[id].kind() {
            NodeKind::Input { variable } => self.inputs[variable].value(),
            NodeKind::Term { variable, term } => {
                let x = self.nodes[self.preds[id][0]].value();
                self.inputs[variable].terms()[term].membership(x)
            }
            NodeKind::Hedge { hedge } => hedge.apply(self.nodes[self.preds[id][0]].value()),
            NodeKind::FiringStrength { norm } => {
                let inputs: Vec<f64> = self.preds[id]
                    .iter()
                    .map(|&p| self.nodes[p].value())
                    .collect();
                fold_strength(norm, &inputs)
            }
            NodeKind::Implication { rule, activation } => {
                let strength = self.nodes[self.preds[id][0]].value();
                let term = &self.outputs[0].terms()[self.rules[rule].consequent_term];
                activation.compute(strength, self.consequent_value_of(term))
            }
            NodeKind::Sum => self.preds[id].iter().map(|&p| self.nodes[p].value()).sum(),
            NodeKind::Normalization => {
                let numerator = self.nodes[self.preds[id][0]].value();
                let denominator = self.nodes[self.preds[id][1]].value();
                normalize(numerator, denominator)
            }
        };
        self.nodes[id].set_value(value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use neurofuzz_ir::{Conclusion, Expr, Rule, TermKind};

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

    fn identity_engine() -> Engine {
        let x = Variable::new("x", 0.0, 1.0)
            .with_term(bell("low", 0.0))
            .with_term(bell("high", 1.0));
        let y = Variable::new("y", 0.0, 1.0)
            .with_term(Term::new("cl", TermKind::Constant { value: 0.0 }))
            .with_term(Term::new("ch", TermKind::Constant { value: 1.0 }));
        let block = RuleBlock::new("rules")
            .with_rule(Rule::new(Expr::prop("x", "low"), Conclusion::new("y", "cl")))
            .with_rule(Rule::new(Expr::prop("x", "high"), Conclusion::new("y", "ch")));
        Engine::new("identity")
            .with_input_variable(x)
            .with_output_variable(y)
            .with_rule_block(block)
    }

    #[test]
    fn build_creates_expected_layer_sizes() {
        let mut engine = identity_engine();
        engine.build().unwrap();

        assert_eq!(engine.layer_nodes(Layer::Input).len(), 1);
        assert_eq!(engine.layer_nodes(Layer::Term).len(), 2);
        assert_eq!(engine.layer_nodes(Layer::Hedge).len(), 2);
        assert_eq!(engine.layer_nodes(Layer::FiringStrength).len(), 2);
        assert_eq!(engine.layer_nodes(Layer::Implication).len(), 2);
        assert_eq!(engine.layer_nodes(Layer::Sum).len(), 2);
        assert_eq!(engine.layer_nodes(Layer::Normalization).len(), 1);
    }

    #[test]
    fn eval_interpolates_between_consequents() {
        let mut engine = identity_engine();
        engine.build().unwrap();

        engine.set_input_value("x", 0.5).unwrap();
        let out = engine.eval();
        assert_relative_eq!(out[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(engine.output_value("y").unwrap(), 0.5, epsilon = 1e-12);

        engine.set_input_value("x", 0.0).unwrap();
        let out = engine.eval();
        assert!(out[0] < 0.1);
    }

    #[test]
    fn multiple_outputs_rejected() {
        let mut engine = identity_engine();
        engine.add_output_variable(Variable::new("z", 0.0, 1.0));
        assert!(matches!(
            engine.build(),
            Err(EngineError::OutputVariableCount { found: 2 })
        ));
        assert!(!engine.is_built());
    }

    #[test]
    fn mixed_connectives_rejected_at_build() {
        let mut engine = identity_engine();
        let mixed = Rule::new(
            Expr::prop("x", "low")
                .and(Expr::prop("x", "high"))
                .or(Expr::prop("x", "low")),
            Conclusion::new("y", "cl"),
        );
        let block = RuleBlock::new("mixed").with_rule(mixed);
        engine.add_rule_block(block);

        let err = engine.build().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Ir(neurofuzz_ir::IrError::MixedConnectives)
        ));
        // the partial graph was torn down
        assert!(!engine.is_built());
        assert_eq!(engine.layer_nodes(Layer::Input).len(), 0);
    }

    #[test]
    fn unknown_term_rejected_at_build() {
        let mut engine = identity_engine();
        let bogus = Rule::new(Expr::prop("x", "medium"), Conclusion::new("y", "cl"));
        let block = RuleBlock::new("bogus").with_rule(bogus);
        engine.add_rule_block(block);
        assert!(matches!(
            engine.build(),
            Err(EngineError::TermNotFound { .. })
        ));
    }

    #[test]
    fn negated_proposition_uses_complement_node() {
        let x = Variable::new("x", 0.0, 1.0).with_term(bell("low", 0.0));
        let y = Variable::new("y", 0.0, 1.0)
            .with_term(Term::new("c", TermKind::Constant { value: 1.0 }));
        let block = RuleBlock::new("rules").with_rule(Rule::new(
            Expr::not_prop("x", "low"),
            Conclusion::new("y", "c"),
        ));
        let mut engine = Engine::new("neg")
            .with_input_variable(x)
            .with_output_variable(y)
            .with_rule_block(block);
        engine.build().unwrap();

        let strength = engine.layer_nodes(Layer::FiringStrength)[0];
        let hedge = engine.layer_nodes(Layer::Hedge)[0];
        assert_eq!(engine.predecessors(strength), &[hedge]);

        engine.set_input_value("x", 0.0).unwrap();
        engine.eval();
        // membership(0) = 1, so the complement fires at 0
        assert_relative_eq!(engine.node_value(strength), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn disabled_rule_block_contributes_no_nodes() {
        let mut engine = identity_engine();
        let mut extra = RuleBlock::new("off").with_rule(Rule::new(
            Expr::prop("x", "low"),
            Conclusion::new("y", "cl"),
        ));
        extra.set_enabled(false);
        engine.add_rule_block(extra);
        engine.build().unwrap();
        assert_eq!(engine.num_rules(), 2);
    }

    #[test]
    fn uniform_consequent_order_check_is_opt_in() {
        let mut engine = identity_engine();
        engine
            .output_term_mut(1)
            .map(|t| {
                *t.kind_mut() = TermKind::Linear {
                    coefficients: vec![1.0, 0.0],
                }
            })
            .unwrap();

        engine.build().unwrap();

        engine.set_check_uniform_consequent_order(true);
        assert!(matches!(
            engine.build(),
            Err(EngineError::MixedConsequentOrder)
        ));
    }

    #[test]
    fn rebuild_is_stable() {
        let mut engine = identity_engine();
        engine.build().unwrap();
        let first: Vec<Vec<NodeId>> = engine
            .rule_topology()
            .iter()
            .map(|r| r.term_nodes.clone())
            .collect();
        engine.build().unwrap();
        let second: Vec<Vec<NodeId>> = engine
            .rule_topology()
            .iter()
            .map(|r| r.term_nodes.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn crud_round_trip() {
        let mut engine = Engine::new("crud");
        engine.add_input_variable(Variable::new("a", 0.0, 1.0));
        engine.add_input_variable(Variable::new("c", 0.0, 1.0));
        engine
            .insert_input_variable(1, Variable::new("b", 0.0, 1.0))
            .unwrap();
        assert_eq!(engine.num_input_variables(), 3);
        assert_eq!(engine.input_variable(1).unwrap().name(), "b");

        let old = engine
            .replace_input_variable(2, Variable::new("d", 0.0, 1.0))
            .unwrap();
        assert_eq!(old.name(), "c");

        let removed = engine.remove_input_variable_by_name("b").unwrap();
        assert_eq!(removed.name(), "b");
        assert!(!engine.has_input_variable("b"));
        assert!(matches!(
            engine.input_variable_by_name("b"),
            Err(EngineError::InputVariableNotFound { .. })
        ));
        assert!(matches!(
            engine.input_variable(7),
            Err(EngineError::IndexOutOfRange { index: 7, .. })
        ));
    }
}
