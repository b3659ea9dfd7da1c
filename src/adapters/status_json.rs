//! JSON view of an evaluation cycle, shared by `status --json` and the web API.

use serde_json::{Map, Value, json};

use crate::domain::cycle::Cycle;
use crate::domain::indicator::Indicator;

pub fn cycle_json(cycle: &Cycle) -> Value {
    let indicators: Map<String, Value> = Indicator::ALL
        .iter()
        .map(|ind| (ind.key().to_string(), json!(cycle.snapshot.get(*ind))))
        .collect();

    let rules: Vec<Value> = cycle
        .stages
        .rules
        .iter()
        .map(|r| {
            json!({
                "stage": r.stage.to_string(),
                "label": r.label,
                "triggered": r.triggered,
            })
        })
        .collect();

    let stages: Vec<Value> = cycle
        .stages
        .tallies
        .iter()
        .map(|t| {
            json!({
                "stage": t.stage.to_string(),
                "title": t.stage.title(),
                "triggered": t.triggered,
                "total": t.total,
                "activation_threshold": t.activation_threshold,
                "active": t.active,
            })
        })
        .collect();

    let (portfolio, portfolio_error) = match &cycle.portfolio {
        Ok(state) => (
            json!({
                "total_value": state.total_value,
                "initial_total": state.initial_total,
                "gain": state.gain,
                "gain_pct": state.gain_pct,
                "positions": state.positions.iter().map(|p| json!({
                    "instrument": p.instrument.key(),
                    "quantity": p.quantity,
                    "current_price": p.current_price,
                    "value": p.value,
                    "gain": p.gain,
                })).collect::<Vec<_>>(),
            }),
            Value::Null,
        ),
        Err(e) => (Value::Null, json!(e.to_string())),
    };

    json!({
        "evaluated_at": cycle.evaluated_at.to_rfc3339(),
        "current_stage": cycle.stages.current.to_string(),
        "current_title": cycle.stages.current.title(),
        "active_stages": cycle.stages.active.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "indicators": indicators,
        "stages": stages,
        "rules": rules,
        "portfolio": portfolio,
        "portfolio_error": portfolio_error,
        "failures": cycle.failures.iter().map(|f| json!({
            "source": f.source,
            "error": f.error.to_string(),
        })).collect::<Vec<_>>(),
    })
}
