//! CLI integration tests: config files on disk through the builders that the
//! commands use, and the console summary.

mod common;

use common::*;
use crisiswatch::adapters::file_config_adapter::FileConfigAdapter;
use crisiswatch::cli::{self, Monitor, SourceMode, SourceSettings};
use crisiswatch::domain::cycle::run_cycle;
use crisiswatch::domain::error::CrisisWatchError;
use crisiswatch::domain::rule::Condition;
use crisiswatch::domain::snapshot::SnapshotFragment;
use crisiswatch::domain::stage::Stage;
use crisiswatch::ports::source_port::IndicatorSource;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

/// ExitCode has no PartialEq, so compare the Debug form.
fn assert_exit(code: ExitCode, expected: u8) {
    assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::from(expected)));
}

mod config_loading {
    use super::*;

    #[test]
    fn no_path_means_defaults() {
        let adapter = cli::load_config(None).unwrap();
        let stages = cli::build_stages(&adapter).unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].rules.len(), 4);
        assert_eq!(stages[1].rules.len(), 5);
        assert_eq!(stages[2].rules.len(), 4);
        assert!(stages.iter().all(|s| s.activation_threshold == 3));
    }

    #[test]
    fn missing_file_is_config_error() {
        let code = cli::load_config(Some(&PathBuf::from("/nonexistent/crisiswatch.ini")))
            .err()
            .unwrap();
        assert_exit(code, 2);
    }

    #[test]
    fn file_on_disk_is_read() {
        let file = write_temp_file("[stages]\nactivation_threshold = 2\n");
        let adapter = cli::load_config(Some(&file.path().to_path_buf())).unwrap();
        let stages = cli::build_stages(&adapter).unwrap();
        assert!(stages.iter().all(|s| s.activation_threshold == 2));
    }
}

mod stage_overrides {
    use super::*;

    #[test]
    fn triggers_replace_builtin_rules() {
        let adapter = config(
            "[stage_near]\nthreshold = 1\ntrigger1 = Dollar slump | BELOW(DXY, 90)\ntrigger2 = Gold or BTC | OR(ABOVE(GOLD, 4000), ABOVE(BTC, 150000))\n",
        );
        let stages = cli::build_stages(&adapter).unwrap();
        let near = &stages[1];

        assert_eq!(near.stage, Stage::Near);
        assert_eq!(near.activation_threshold, 1);
        assert_eq!(near.rules.len(), 2);
        assert_eq!(near.rules[0].label, "Dollar slump");
        assert_eq!(near.rules[0].condition, Condition::below(Indicator::Dxy, 90.0));
        assert_eq!(stages[0].rules.len(), 4);
    }

    #[test]
    fn triggers_stop_at_first_gap() {
        let adapter = config(
            "[stage_pre]\nthreshold = 1\ntrigger1 = a | ABOVE(TNX, 4)\ntrigger3 = c | ABOVE(TNX, 5)\n",
        );
        let stages = cli::build_stages(&adapter).unwrap();
        assert_eq!(stages[0].rules.len(), 1);
    }

    #[test]
    fn floor_override_flows_into_default_label() {
        let adapter = config("[stages]\nforeign_holdings_floor = 9000\n");
        let stages = cli::build_stages(&adapter).unwrap();
        assert!(
            stages[1]
                .rules
                .iter()
                .any(|r| r.label == "Foreign Treasury holdings < $9,000B")
        );
    }

    #[test]
    fn malformed_condition_reports_location() {
        let adapter = config("[stage_pre]\ntrigger1 = broken | ABOVE(TNX 4.5)\n");
        match cli::build_stages(&adapter).unwrap_err() {
            CrisisWatchError::RuleParse {
                section,
                key,
                context,
            } => {
                assert_eq!(section, "stage_pre");
                assert_eq!(key, "trigger1");
                assert!(context.contains('^'));
            }
            other => panic!("expected RuleParse, got {other:?}"),
        }
    }

    #[test]
    fn missing_separator_is_rule_invalid() {
        let adapter = config("[stage_pre]\ntrigger1 = ABOVE(TNX, 4.5)\n");
        assert!(matches!(
            cli::build_stages(&adapter).unwrap_err(),
            CrisisWatchError::RuleInvalid { .. }
        ));
    }

    #[test]
    fn unreachable_threshold_rejected() {
        let adapter = config("[stage_in_it]\nthreshold = 5\n");
        let err = cli::build_stages(&adapter).unwrap_err();
        assert_exit(ExitCode::from(&err), 4);
    }
}

mod portfolio_config {
    use super::*;

    #[test]
    fn default_positions_when_unset() {
        let positions = cli::build_positions(&config("")).unwrap();
        let keys: Vec<&str> = positions.iter().map(|p| p.instrument().key()).collect();
        assert_eq!(keys, vec!["BTC", "URA", "CCJ"]);
    }

    #[test]
    fn configured_positions_parsed() {
        let positions =
            cli::build_positions(&config("[portfolio]\npositions = GOLD:1000:3300\n")).unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].instrument(), Indicator::Gold);
    }

    #[test]
    fn dashboard_options_carry_start_date() {
        let options =
            cli::build_dashboard_options(&config("[portfolio]\nstart_date = 2026-01-15\n")).unwrap();
        assert_eq!(
            options.portfolio_start,
            chrono::NaiveDate::from_ymd_opt(2026, 1, 15)
        );
        assert!(options.show_chart);
    }

    #[test]
    fn report_section_sets_title_and_chart() {
        let options =
            cli::build_dashboard_options(&config("[report]\ntitle = Desk View\nchart = no\n"))
                .unwrap();
        assert_eq!(options.title, "Desk View");
        assert!(!options.show_chart);
    }
}

mod sources {
    use super::*;

    #[test]
    fn live_defaults() {
        let settings = SourceSettings::from_config(&config("")).unwrap();
        assert_eq!(settings.mode, SourceMode::Live);
        assert_eq!(settings.market_ttl, Duration::from_secs(600));
        assert_eq!(settings.holdings_ttl, Duration::from_secs(86_400));
        assert_eq!(settings.history_range, "2y");
        assert_eq!(settings.breakeven_series, "T10YIE");
    }

    #[test]
    fn live_mode_builds_three_cached_sources() {
        let settings = SourceSettings::from_config(&config("")).unwrap();
        let sources = cli::build_sources(&settings).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["quotes", "fred", "tic"]);
    }

    #[test]
    fn offline_requires_data_dir() {
        let err = SourceSettings::from_config(&config("[sources]\nmode = offline\n")).unwrap_err();
        assert!(matches!(err, CrisisWatchError::ConfigMissing { .. }));
    }

    #[test]
    fn offline_monitor_runs_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("TNX.csv", "date,close\n2025-12-05,7.2\n"),
            ("BREAKEVEN.csv", "date,close\n2025-12-05,6.4\n"),
            ("GOLD.csv", "date,close\n2025-12-05,5100\n"),
            ("DXY.csv", "date,close\n2025-12-05,91\n"),
            ("BTC.csv", "date,close\n2025-12-05,95000\n"),
            ("URA.csv", "date,close\n2025-12-05,60\n"),
            ("CCJ.csv", "date,close\n2025-12-05,100\n"),
        ] {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let adapter = config(&format!(
            "[sources]\nmode = offline\ndata_dir = {}\n",
            dir.path().display()
        ));

        let monitor = Monitor::from_config(&adapter).unwrap();
        let cycle = monitor.evaluate();

        assert_eq!(cycle.stages.current, Stage::InIt);
        assert!(cycle.stages.is_active(Stage::Near));
        assert!(cycle.portfolio.is_ok());
        assert!(cycle.failures.is_empty());
    }

    #[test]
    fn invalid_config_stops_monitor_construction() {
        let err = Monitor::from_config(&config("[sources]\nmode = carrier-pigeon\n"))
            .err()
            .unwrap();
        assert_exit(ExitCode::from(&err), 2);
    }
}

mod console_summary {
    use super::*;

    #[test]
    fn summary_lists_stage_rules_and_portfolio() {
        let sources = vec![
            MockSource::with_values("quotes", &pre_stage_values()),
            MockSource::failing("fred"),
        ];
        let adapter = config("");
        let stages = cli::build_stages(&adapter).unwrap();
        let positions = cli::build_positions(&adapter).unwrap();
        let cycle = run_cycle(&sources, &stages, &positions);

        let summary = cli::format_summary(&cycle);
        assert!(summary.starts_with("Current stage: Pre — Cracks Visible"));
        assert!(summary.contains("[x] 10y > 4.5%"));
        assert!(summary.contains("[ ] DXY < 95"));
        assert!(summary.contains("Total 4000.00 on 4000.00 invested"));
        assert!(summary.contains("fred: network error: connection refused"));
        assert!(!summary.contains("Prices as of"));
    }

    #[test]
    fn summary_dates_the_price_history() {
        let mut fragment = SnapshotFragment::from_values(pre_stage_values());
        fragment.history = Some(history_for(
            Indicator::Bitcoin,
            "2025-12-01",
            &[88_000.0, 89_000.0, 89_500.0],
        ));
        let sources = vec![MockSource::with_fragment("quotes", fragment)];
        let adapter = config("");
        let cycle = run_cycle(
            &sources,
            &cli::build_stages(&adapter).unwrap(),
            &cli::build_positions(&adapter).unwrap(),
        );

        assert!(cli::format_summary(&cycle).contains("Prices as of:  2025-12-03"));
    }
}
