//! Trigger rule data structures.
//!
//! A [`TriggerRule`] pairs a human-readable label with a [`Condition`] over
//! snapshot indicators. Conditions are plain data so rule tables can be
//! declared, loaded from config and inspected without touching evaluation.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::indicator::Indicator;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Above {
        indicator: Indicator,
        threshold: f64,
    },
    Below {
        indicator: Indicator,
        threshold: f64,
    },
    Between {
        indicator: Indicator,
        lower: f64,
        upper: f64,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn above(indicator: Indicator, threshold: f64) -> Self {
        Condition::Above {
            indicator,
            threshold,
        }
    }

    pub fn below(indicator: Indicator, threshold: f64) -> Self {
        Condition::Below {
            indicator,
            threshold,
        }
    }

    /// Every indicator this condition reads.
    pub fn indicators(&self) -> BTreeSet<Indicator> {
        let mut out = BTreeSet::new();
        self.collect_indicators(&mut out);
        out
    }

    fn collect_indicators(&self, out: &mut BTreeSet<Indicator>) {
        match self {
            Condition::Above { indicator, .. }
            | Condition::Below { indicator, .. }
            | Condition::Between { indicator, .. } => {
                out.insert(*indicator);
            }
            Condition::And(children) | Condition::Or(children) => {
                for child in children {
                    child.collect_indicators(out);
                }
            }
            Condition::Not(child) => child.collect_indicators(out),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Above {
                indicator,
                threshold,
            } => write!(f, "ABOVE({}, {})", indicator, threshold),
            Condition::Below {
                indicator,
                threshold,
            } => write!(f, "BELOW({}, {})", indicator, threshold),
            Condition::Between {
                indicator,
                lower,
                upper,
            } => write!(f, "BETWEEN({}, {}, {})", indicator, lower, upper),
            Condition::And(children) => write_list(f, "AND", children),
            Condition::Or(children) => write_list(f, "OR", children),
            Condition::Not(child) => write!(f, "NOT({})", child),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, children: &[Condition]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerRule {
    pub label: String,
    pub condition: Condition,
}

impl TriggerRule {
    pub fn new(label: impl Into<String>, condition: Condition) -> Self {
        Self {
            label: label.into(),
            condition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_comparisons() {
        assert_eq!(
            Condition::above(Indicator::TreasuryYield10y, 4.5).to_string(),
            "ABOVE(TNX, 4.5)"
        );
        assert_eq!(
            Condition::below(Indicator::Dxy, 95.0).to_string(),
            "BELOW(DXY, 95)"
        );
        let between = Condition::Between {
            indicator: Indicator::Gold,
            lower: 3000.0,
            upper: 3500.5,
        };
        assert_eq!(between.to_string(), "BETWEEN(GOLD, 3000, 3500.5)");
    }

    #[test]
    fn display_composites() {
        let cond = Condition::And(vec![
            Condition::above(Indicator::Gold, 3200.0),
            Condition::Not(Box::new(Condition::below(Indicator::ForeignHoldingsChange, 0.0))),
        ]);
        assert_eq!(cond.to_string(), "AND(ABOVE(GOLD, 3200), NOT(BELOW(TIC_MOM, 0)))");
    }

    #[test]
    fn indicators_are_collected_recursively() {
        let cond = Condition::Or(vec![
            Condition::above(Indicator::Gold, 3200.0),
            Condition::And(vec![
                Condition::below(Indicator::Dxy, 95.0),
                Condition::above(Indicator::Gold, 3500.0),
            ]),
        ]);
        let found: Vec<Indicator> = cond.indicators().into_iter().collect();
        assert_eq!(found, vec![Indicator::Gold, Indicator::Dxy]);
    }

    #[test]
    fn trigger_rule_new() {
        let rule = TriggerRule::new("DXY < 95", Condition::below(Indicator::Dxy, 95.0));
        assert_eq!(rule.label, "DXY < 95");
        assert!(matches!(rule.condition, Condition::Below { .. }));
    }
}
