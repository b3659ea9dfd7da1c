//! Date-indexed closing price table.
//!
//! Rows are the union of trading dates across instruments; an instrument that
//! did not trade on a date has `None` in that row (crypto trades on weekends,
//! equities do not).

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::indicator::Indicator;

#[derive(Debug, Clone, PartialEq)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub dates: Vec<NaiveDate>,
    pub columns: BTreeMap<Indicator, Vec<Option<f64>>>,
}

impl PriceHistory {
    /// Align per-instrument series on a shared, ascending date index.
    pub fn from_series(series: Vec<(Indicator, Vec<ClosePoint>)>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, BTreeMap<Indicator, f64>> = BTreeMap::new();
        let mut instruments = Vec::with_capacity(series.len());

        for (indicator, points) in series {
            instruments.push(indicator);
            for point in points {
                if point.close.is_finite() {
                    by_date
                        .entry(point.date)
                        .or_default()
                        .insert(indicator, point.close);
                }
            }
        }

        let dates: Vec<NaiveDate> = by_date.keys().copied().collect();
        let columns = instruments
            .into_iter()
            .map(|indicator| {
                let column = by_date
                    .values()
                    .map(|row| row.get(&indicator).copied())
                    .collect();
                (indicator, column)
            })
            .collect();

        Self { dates, columns }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn instruments(&self) -> impl Iterator<Item = Indicator> + '_ {
        self.columns.keys().copied()
    }

    /// Most recent non-missing close for `indicator`.
    pub fn latest(&self, indicator: Indicator) -> Option<ClosePoint> {
        let column = self.columns.get(&indicator)?;
        column
            .iter()
            .zip(&self.dates)
            .rev()
            .find_map(|(value, date)| {
                value.map(|close| ClosePoint {
                    date: *date,
                    close,
                })
            })
    }

    /// Date of the newest row across all instruments.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}
