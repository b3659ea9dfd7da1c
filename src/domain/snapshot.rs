//! Indicator snapshot and the fragments fetchers contribute to it.

use std::collections::BTreeMap;

use crate::domain::history::PriceHistory;
use crate::domain::indicator::Indicator;

/// Every indicator value as of one evaluation cycle.
///
/// An indicator that is absent from the map is unavailable. Non-finite
/// values are never stored, so `get` returning `Some` always means a usable
/// number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    values: BTreeMap<Indicator, f64>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, indicator: Indicator, value: f64) -> Self {
        self.set(indicator, value);
        self
    }

    pub fn set(&mut self, indicator: Indicator, value: f64) {
        if value.is_finite() {
            self.values.insert(indicator, value);
        } else {
            self.values.remove(&indicator);
        }
    }

    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.values.get(&indicator).copied()
    }

    pub fn is_available(&self, indicator: Indicator) -> bool {
        self.values.contains_key(&indicator)
    }

    pub fn unavailable(&self) -> Vec<Indicator> {
        Indicator::ALL
            .into_iter()
            .filter(|ind| !self.is_available(*ind))
            .collect()
    }

    /// Overlay every value from `fragment`; later fragments win.
    pub fn merge(&mut self, fragment: &SnapshotFragment) {
        for (indicator, value) in &fragment.values {
            self.set(*indicator, *value);
        }
    }
}

/// What one source contributes to a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotFragment {
    pub values: Vec<(Indicator, f64)>,
    pub history: Option<PriceHistory>,
}

impl SnapshotFragment {
    pub fn from_values(values: Vec<(Indicator, f64)>) -> Self {
        Self {
            values,
            history: None,
        }
    }
}

/// Round to two decimal places, matching the precision the quote and macro
/// sources publish.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
