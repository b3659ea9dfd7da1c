//! Condition evaluation against an indicator snapshot.
//!
//! # Evaluation Semantics
//!
//! Evaluation is three-valued: `Some(true)`, `Some(false)`, or `None` when an
//! indicator the result depends on is unavailable.
//!
//! - Comparisons: `None` if the indicator is unavailable
//! - `AND`: `Some(false)` if any child is false, else `None` if any child is
//!   unknown, else `Some(true)`
//! - `OR`: `Some(true)` if any child is true, else `None` if any child is
//!   unknown, else `Some(false)`
//! - `NOT`: inverts a known result; unknown stays unknown
//!
//! [`is_triggered`] is stricter: a rule fires only when every indicator it
//! reads is available. `OR(ABOVE(BTC, 400000), ABOVE(GOLD, 3000))` with BTC
//! missing stays quiet even though the `GOLD` branch holds.

use crate::domain::rule::Condition;
use crate::domain::snapshot::IndicatorSnapshot;

pub fn evaluate(condition: &Condition, snapshot: &IndicatorSnapshot) -> Option<bool> {
    match condition {
        Condition::Above {
            indicator,
            threshold,
        } => snapshot.get(*indicator).map(|v| v > *threshold),
        Condition::Below {
            indicator,
            threshold,
        } => snapshot.get(*indicator).map(|v| v < *threshold),
        Condition::Between {
            indicator,
            lower,
            upper,
        } => snapshot
            .get(*indicator)
            .map(|v| v >= *lower && v <= *upper),
        Condition::And(children) => {
            let mut unknown = false;
            for child in children {
                match evaluate(child, snapshot) {
                    Some(false) => return Some(false),
                    None => unknown = true,
                    Some(true) => {}
                }
            }
            if unknown { None } else { Some(true) }
        }
        Condition::Or(children) => {
            let mut unknown = false;
            for child in children {
                match evaluate(child, snapshot) {
                    Some(true) => return Some(true),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            if unknown { None } else { Some(false) }
        }
        Condition::Not(child) => evaluate(child, snapshot).map(|v| !v),
    }
}

pub fn is_triggered(condition: &Condition, snapshot: &IndicatorSnapshot) -> bool {
    let inputs_available = condition
        .indicators()
        .into_iter()
        .all(|indicator| snapshot.is_available(indicator));
    inputs_available && evaluate(condition, snapshot) == Some(true)
}
