//! Fixed-allocation portfolio valuation.

use std::collections::HashSet;

use crate::domain::error::{CrisisWatchError, ValuationError};
use crate::domain::indicator::Indicator;
use crate::domain::snapshot::IndicatorSnapshot;

/// Positions tracked when no `[portfolio] positions` key is configured:
/// 50% BTC / 40% URA / 10% CCJ of $4,000, opened 2025-12-06.
pub const DEFAULT_POSITIONS: &str = "BTC:2000:89500, URA:1600:49, CCJ:400:93";
pub const DEFAULT_START_DATE: &str = "2025-12-06";

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPosition {
    instrument: Indicator,
    initial_allocation: f64,
    reference_price: f64,
    quantity: f64,
}

impl PortfolioPosition {
    pub fn new(
        instrument: Indicator,
        initial_allocation: f64,
        reference_price: f64,
    ) -> Result<Self, CrisisWatchError> {
        if !initial_allocation.is_finite() || initial_allocation <= 0.0 {
            return Err(CrisisWatchError::InvalidPosition {
                instrument: instrument.to_string(),
                reason: "allocation must be positive".into(),
            });
        }
        if !reference_price.is_finite() || reference_price <= 0.0 {
            return Err(CrisisWatchError::InvalidPosition {
                instrument: instrument.to_string(),
                reason: "reference price must be positive".into(),
            });
        }
        Ok(Self {
            instrument,
            initial_allocation,
            reference_price,
            quantity: initial_allocation / reference_price,
        })
    }

    pub fn instrument(&self) -> Indicator {
        self.instrument
    }

    pub fn initial_allocation(&self) -> f64 {
        self.initial_allocation
    }

    pub fn reference_price(&self) -> f64 {
        self.reference_price
    }

    /// Units held; fixed when the position is opened.
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionValue {
    pub instrument: Indicator,
    pub quantity: f64,
    pub current_price: f64,
    pub value: f64,
    pub gain: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub total_value: f64,
    pub initial_total: f64,
    pub gain: f64,
    pub gain_pct: f64,
    pub positions: Vec<PositionValue>,
}

/// Value `positions` at the prices in `prices`.
///
/// Fails on the first held instrument without a current price rather than
/// reporting a total that silently omits it.
pub fn value(
    positions: &[PortfolioPosition],
    prices: &IndicatorSnapshot,
) -> Result<PortfolioState, ValuationError> {
    let mut valued = Vec::with_capacity(positions.len());
    for position in positions {
        let current_price =
            prices
                .get(position.instrument)
                .ok_or(ValuationError::PriceUnavailable {
                    instrument: position.instrument,
                })?;
        let value = position.market_value(current_price);
        valued.push(PositionValue {
            instrument: position.instrument,
            quantity: position.quantity,
            current_price,
            value,
            gain: value - position.initial_allocation,
        });
    }

    let total_value: f64 = valued.iter().map(|p| p.value).sum();
    let initial_total: f64 = positions.iter().map(|p| p.initial_allocation).sum();
    let gain = total_value - initial_total;
    let gain_pct = if initial_total > 0.0 {
        gain / initial_total * 100.0
    } else {
        0.0
    };

    Ok(PortfolioState {
        total_value,
        initial_total,
        gain,
        gain_pct,
        positions: valued,
    })
}

/// Parse `KEY:allocation:reference_price` entries separated by commas.
pub fn parse_positions(input: &str) -> Result<Vec<PortfolioPosition>, CrisisWatchError> {
    let mut positions = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid_positions("empty entry in position list"));
        }
        let parts: Vec<&str> = token.split(':').map(str::trim).collect();
        let [key, allocation, price] = parts.as_slice() else {
            return Err(invalid_positions(&format!(
                "'{}' is not KEY:allocation:reference_price",
                token
            )));
        };

        let instrument = key
            .parse::<Indicator>()
            .map_err(|e| invalid_positions(&e.to_string()))?;
        if !seen.insert(instrument) {
            return Err(invalid_positions(&format!("duplicate instrument {}", instrument)));
        }
        let allocation: f64 = allocation
            .parse()
            .map_err(|_| invalid_positions(&format!("invalid allocation '{}'", allocation)))?;
        let price: f64 = price
            .parse()
            .map_err(|_| invalid_positions(&format!("invalid reference price '{}'", price)))?;

        positions.push(PortfolioPosition::new(instrument, allocation, price)?);
    }

    Ok(positions)
}

fn invalid_positions(reason: &str) -> CrisisWatchError {
    CrisisWatchError::ConfigInvalid {
        section: "portfolio".into(),
        key: "positions".into(),
        reason: reason.to_string(),
    }
}
