//! Crisis stages and the built-in trigger table.

use std::fmt;

use crate::domain::indicator::{Indicator, group_thousands};
use crate::domain::rule::{Condition, TriggerRule};

/// Rules that must hold at once for a stage to count as active.
pub const DEFAULT_ACTIVATION_THRESHOLD: usize = 3;

/// Level (in billions) below which aggregate foreign Treasury holdings count
/// as a Near-stage trigger. Placeholder value; override via
/// `[stages] foreign_holdings_floor`.
pub const DEFAULT_FOREIGN_HOLDINGS_FLOOR: f64 = 8500.0;

/// Crisis stages ordered by severity: `Complacency < Pre < Near < InIt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Complacency,
    Pre,
    Near,
    InIt,
}

impl Stage {
    /// Least to most severe.
    pub const ALL: [Stage; 4] = [Stage::Complacency, Stage::Pre, Stage::Near, Stage::InIt];

    pub fn title(self) -> &'static str {
        match self {
            Stage::Complacency => "Complacency",
            Stage::Pre => "Pre — Cracks Visible",
            Stage::Near => "Near — Tipping Point",
            Stage::InIt => "In It — Acute Crisis",
        }
    }

    /// Config section holding rule overrides for this stage. Complacency is
    /// the absence of an active stage and has no rules to override.
    pub fn config_section(self) -> Option<&'static str> {
        match self {
            Stage::Complacency => None,
            Stage::Pre => Some("stage_pre"),
            Stage::Near => Some("stage_near"),
            Stage::InIt => Some("stage_in_it"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Complacency => "Complacency",
            Stage::Pre => "Pre",
            Stage::Near => "Near",
            Stage::InIt => "In It",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageDefinition {
    pub stage: Stage,
    pub rules: Vec<TriggerRule>,
    pub activation_threshold: usize,
}

impl StageDefinition {
    pub fn new(stage: Stage, rules: Vec<TriggerRule>, activation_threshold: usize) -> Self {
        Self {
            stage,
            rules,
            activation_threshold,
        }
    }
}

/// Knobs for the built-in trigger table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageParams {
    pub activation_threshold: usize,
    pub foreign_holdings_floor: f64,
}

impl Default for StageParams {
    fn default() -> Self {
        Self {
            activation_threshold: DEFAULT_ACTIVATION_THRESHOLD,
            foreign_holdings_floor: DEFAULT_FOREIGN_HOLDINGS_FLOOR,
        }
    }
}

pub fn default_rules(stage: Stage, params: &StageParams) -> Vec<TriggerRule> {
    use Indicator::*;

    match stage {
        Stage::Complacency => Vec::new(),
        Stage::Pre => vec![
            TriggerRule::new("10y > 4.5%", Condition::above(TreasuryYield10y, 4.5)),
            TriggerRule::new("Breakeven > 3.0%", Condition::above(Breakeven10y, 3.0)),
            TriggerRule::new("Gold > $3,200", Condition::above(Gold, 3200.0)),
            TriggerRule::new(
                "Foreign Treasury holdings declining MoM",
                Condition::below(ForeignHoldingsChange, 0.0),
            ),
        ],
        Stage::Near => vec![
            TriggerRule::new("10y > 5.5% despite Fed", Condition::above(TreasuryYield10y, 5.5)),
            TriggerRule::new("Breakeven > 3.5%", Condition::above(Breakeven10y, 3.5)),
            TriggerRule::new("Gold > $3,500", Condition::above(Gold, 3500.0)),
            TriggerRule::new("DXY < 95", Condition::below(Dxy, 95.0)),
            TriggerRule::new(
                format!(
                    "Foreign Treasury holdings < ${}B",
                    group_thousands(params.foreign_holdings_floor, 0)
                ),
                Condition::below(ForeignHoldings, params.foreign_holdings_floor),
            ),
        ],
        Stage::InIt => vec![
            TriggerRule::new("10y spike > 7%", Condition::above(TreasuryYield10y, 7.0)),
            TriggerRule::new("Breakeven > 6%", Condition::above(Breakeven10y, 6.0)),
            TriggerRule::new("Gold > $5,000", Condition::above(Gold, 5000.0)),
            TriggerRule::new("Bitcoin > $400k", Condition::above(Bitcoin, 400_000.0)),
        ],
    }
}

/// Every stage that carries rules, with its built-in triggers.
pub fn default_stages(params: &StageParams) -> Vec<StageDefinition> {
    Stage::ALL
        .into_iter()
        .filter(|stage| stage.config_section().is_some())
        .map(|stage| {
            StageDefinition::new(stage, default_rules(stage, params), params.activation_threshold)
        })
        .collect()
}
