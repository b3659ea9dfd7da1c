//! Trigger evaluation engine.
//!
//! Evaluates every rule of every stage against one snapshot, marks stages
//! whose triggered count reaches their activation threshold as active, and
//! selects the most severe active stage as the current one.

use std::collections::BTreeSet;

use crate::domain::rule_eval::is_triggered;
use crate::domain::snapshot::IndicatorSnapshot;
use crate::domain::stage::{Stage, StageDefinition};

#[derive(Debug, Clone, PartialEq)]
pub struct RuleStatus {
    pub stage: Stage,
    pub label: String,
    pub triggered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageTally {
    pub stage: Stage,
    pub triggered: usize,
    pub total: usize,
    pub activation_threshold: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub active: BTreeSet<Stage>,
    pub current: Stage,
    /// One entry per rule, in stage then rule order.
    pub rules: Vec<RuleStatus>,
    pub tallies: Vec<StageTally>,
}

impl StageResult {
    pub fn is_active(&self, stage: Stage) -> bool {
        self.active.contains(&stage)
    }

    pub fn triggered_count(&self) -> usize {
        self.rules.iter().filter(|r| r.triggered).count()
    }
}

pub fn evaluate(snapshot: &IndicatorSnapshot, stages: &[StageDefinition]) -> StageResult {
    let mut rules = Vec::new();
    let mut tallies = Vec::with_capacity(stages.len());
    let mut active = BTreeSet::new();

    for definition in stages {
        let mut triggered = 0;
        for rule in &definition.rules {
            let fired = is_triggered(&rule.condition, snapshot);
            if fired {
                triggered += 1;
            }
            rules.push(RuleStatus {
                stage: definition.stage,
                label: rule.label.clone(),
                triggered: fired,
            });
        }

        let is_active = triggered >= definition.activation_threshold;
        if is_active {
            active.insert(definition.stage);
        }
        tallies.push(StageTally {
            stage: definition.stage,
            triggered,
            total: definition.rules.len(),
            activation_threshold: definition.activation_threshold,
            active: is_active,
        });
    }

    let current = active.iter().next_back().copied().unwrap_or(Stage::Complacency);

    StageResult {
        active,
        current,
        rules,
        tallies,
    }
}
