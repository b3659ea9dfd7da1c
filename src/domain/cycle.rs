//! One evaluation cycle: fetch every source in turn, build the snapshot, then
//! run the trigger engine and the portfolio valuator over it.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::error::{FetchError, ValuationError};
use crate::domain::history::PriceHistory;
use crate::domain::portfolio::{self, PortfolioPosition, PortfolioState};
use crate::domain::snapshot::IndicatorSnapshot;
use crate::domain::stage::StageDefinition;
use crate::domain::stage_eval::{self, StageResult};
use crate::ports::source_port::IndicatorSource;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: String,
    pub error: FetchError,
}

#[derive(Debug, Clone, Default)]
pub struct CollectedSnapshot {
    pub snapshot: IndicatorSnapshot,
    pub history: PriceHistory,
    pub failures: Vec<SourceFailure>,
}

/// Fetch each source sequentially and merge what succeeded.
///
/// A failing source is logged and recorded; the indicators it would have
/// supplied stay unavailable.
pub fn collect_snapshot<S: IndicatorSource>(sources: &[S]) -> CollectedSnapshot {
    let mut collected = CollectedSnapshot::default();

    for source in sources {
        match source.fetch() {
            Ok(fragment) => {
                debug!(
                    source = source.name(),
                    values = fragment.values.len(),
                    "source fetched"
                );
                collected.snapshot.merge(&fragment);
                if collected.history.is_empty() {
                    if let Some(history) = fragment.history {
                        collected.history = history;
                    }
                }
            }
            Err(error) => {
                warn!(source = source.name(), error = %error, "source unavailable");
                collected.failures.push(SourceFailure {
                    source: source.name().to_string(),
                    error,
                });
            }
        }
    }

    collected
}

#[derive(Debug, Clone)]
pub struct Cycle {
    pub evaluated_at: DateTime<Utc>,
    pub snapshot: IndicatorSnapshot,
    pub history: PriceHistory,
    pub failures: Vec<SourceFailure>,
    pub stages: StageResult,
    pub portfolio: Result<PortfolioState, ValuationError>,
}

pub fn run_cycle<S: IndicatorSource>(
    sources: &[S],
    stages: &[StageDefinition],
    positions: &[PortfolioPosition],
) -> Cycle {
    let collected = collect_snapshot(sources);
    evaluate_collected(collected, stages, positions)
}

/// Pure half of a cycle, for callers that already hold a snapshot.
pub fn evaluate_collected(
    collected: CollectedSnapshot,
    stages: &[StageDefinition],
    positions: &[PortfolioPosition],
) -> Cycle {
    let stage_result = stage_eval::evaluate(&collected.snapshot, stages);
    let valuation = portfolio::value(positions, &collected.snapshot);

    info!(
        stage = %stage_result.current,
        triggered = stage_result.triggered_count(),
        unavailable = collected.snapshot.unavailable().len(),
        "cycle evaluated"
    );
    if let Err(e) = &valuation {
        warn!(error = %e, "portfolio valuation failed");
    }

    Cycle {
        evaluated_at: Utc::now(),
        snapshot: collected.snapshot,
        history: collected.history,
        failures: collected.failures,
        stages: stage_result,
        portfolio: valuation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::Indicator;
    use crate::domain::snapshot::SnapshotFragment;
    use crate::domain::stage::{Stage, StageParams, default_stages};
    use std::cell::Cell;

    struct Fixed {
        name: &'static str,
        result: Result<SnapshotFragment, FetchError>,
        calls: Cell<usize>,
    }

    impl Fixed {
        fn ok(name: &'static str, values: Vec<(Indicator, f64)>) -> Self {
            Self {
                name,
                result: Ok(SnapshotFragment::from_values(values)),
                calls: Cell::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                result: Err(FetchError::Network {
                    source_name: name.into(),
                    reason: "timed out".into(),
                }),
                calls: Cell::new(0),
            }
        }
    }

    impl IndicatorSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.result.clone()
        }
    }

    #[test]
    fn failed_source_leaves_its_fields_unavailable() {
        let sources = vec![
            Fixed::ok("quotes", vec![(Indicator::Gold, 3300.0)]),
            Fixed::failing("fred"),
        ];
        let collected = collect_snapshot(&sources);
        assert_eq!(collected.snapshot.get(Indicator::Gold), Some(3300.0));
        assert!(!collected.snapshot.is_available(Indicator::Breakeven10y));
        assert_eq!(collected.failures.len(), 1);
        assert_eq!(collected.failures[0].source, "fred");
        assert!(sources.iter().all(|s| s.calls.get() == 1));
    }

    #[test]
    fn cycle_with_every_source_down_still_evaluates() {
        let sources = vec![Fixed::failing("quotes"), Fixed::failing("tic")];
        let positions = crate::domain::portfolio::parse_positions("BTC:2000:89500").unwrap();
        let cycle = run_cycle(&sources, &default_stages(&StageParams::default()), &positions);

        assert_eq!(cycle.stages.current, Stage::Complacency);
        assert_eq!(cycle.stages.rules.len(), 13);
        assert!(cycle.portfolio.is_err());
        assert_eq!(cycle.failures.len(), 2);
    }

    #[test]
    fn first_history_is_kept() {
        use crate::domain::history::ClosePoint;
        use chrono::NaiveDate;

        let history = PriceHistory::from_series(vec![(
            Indicator::Gold,
            vec![ClosePoint {
                date: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
                close: 3300.0,
            }],
        )]);
        let with_history = Fixed {
            name: "quotes",
            result: Ok(SnapshotFragment {
                values: vec![(Indicator::Gold, 3300.0)],
                history: Some(history.clone()),
            }),
            calls: Cell::new(0),
        };
        let collected = collect_snapshot(&[with_history, Fixed::ok("fred", vec![])]);
        assert_eq!(collected.history, history);
    }
}
