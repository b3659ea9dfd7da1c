//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::adapters::cached_source::CachedSource;
use crate::adapters::csv_adapter::CsvQuoteSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fred_adapter::{self, FredSeriesSource};
use crate::adapters::html_report_adapter::{DashboardOptions, HtmlReportAdapter};
use crate::adapters::http;
use crate::adapters::status_json::cycle_json;
use crate::adapters::tic_adapter::{self, TicHoldingsSource};
use crate::adapters::yahoo_adapter::{self, YahooQuoteSource};
use crate::domain::config_validation::validate_config;
use crate::domain::cycle::{Cycle, run_cycle};
use crate::domain::error::CrisisWatchError;
use crate::domain::indicator::Indicator;
use crate::domain::portfolio::{self, PortfolioPosition};
use crate::domain::rule::TriggerRule;
use crate::domain::rule_parser;
use crate::domain::stage::{StageDefinition, StageParams, default_stages};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::source_port::SharedSource;

const DEFAULT_OUTPUT: &str = "crisiswatch.html";
const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
const DEFAULT_MARKET_TTL_SECS: i64 = 600;
const DEFAULT_HOLDINGS_TTL_SECS: i64 = 86_400;

#[derive(Parser, Debug)]
#[command(name = "crisiswatch", version, about = "Macro-financial crisis stage monitor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate once and print the stage summary
    Status {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the cycle as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Evaluate once and write the HTML dashboard
    Render {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a configuration and print the rule table without fetching
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Serve the dashboard over HTTP
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        listen: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Status { config, json } => run_status(config.as_ref(), json),
        Command::Render { config, output } => run_render(config.as_ref(), output.as_ref()),
        Command::Validate { config } => run_validate(config.as_ref()),
        Command::Serve { config, listen } => run_serve(config.as_ref(), listen.as_deref()),
    }
}

/// Load the INI file at `path`, or an empty config (all defaults) when no
/// path is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let loaded = match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path).map_err(|e| CrisisWatchError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        }
        None => FileConfigAdapter::from_string("").map_err(|reason| CrisisWatchError::ConfigParse {
            file: "<defaults>".into(),
            reason,
        }),
    };
    loaded.map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Everything one evaluation needs, built from config.
pub struct Monitor {
    pub sources: Vec<SharedSource>,
    pub stages: Vec<StageDefinition>,
    pub positions: Vec<PortfolioPosition>,
    pub options: DashboardOptions,
}

impl Monitor {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CrisisWatchError> {
        validate_config(config)?;
        let stages = build_stages(config)?;
        let positions = build_positions(config)?;
        let options = build_dashboard_options(config)?;
        let sources = build_sources(&SourceSettings::from_config(config)?)?;
        Ok(Self {
            sources,
            stages,
            positions,
            options,
        })
    }

    pub fn evaluate(&self) -> Cycle {
        run_cycle(&self.sources, &self.stages, &self.positions)
    }
}

pub fn build_stage_params(config: &dyn ConfigPort) -> StageParams {
    let defaults = StageParams::default();
    StageParams {
        activation_threshold: config
            .get_int("stages", "activation_threshold", defaults.activation_threshold as i64)
            .max(0) as usize,
        foreign_holdings_floor: config.get_double(
            "stages",
            "foreign_holdings_floor",
            defaults.foreign_holdings_floor,
        ),
    }
}

/// Parse one `label | CONDITION` trigger entry.
pub fn parse_trigger(section: &str, key: &str, raw: &str) -> Result<TriggerRule, CrisisWatchError> {
    let Some((label, expr)) = raw.split_once('|') else {
        return Err(CrisisWatchError::RuleInvalid {
            reason: format!("[{}] {}: expected '<label> | <condition>'", section, key),
        });
    };
    let (label, expr) = (label.trim(), expr.trim());
    if label.is_empty() {
        return Err(CrisisWatchError::RuleInvalid {
            reason: format!("[{}] {}: empty label", section, key),
        });
    }
    let condition = rule_parser::parse(expr).map_err(|e| CrisisWatchError::RuleParse {
        section: section.to_string(),
        key: key.to_string(),
        context: e.display_with_context(expr),
    })?;
    Ok(TriggerRule::new(label, condition))
}

/// Built-in stages, with `[stage_*]` sections replacing a stage's rules or
/// threshold where present. Triggers are read as `trigger1`, `trigger2`, ...
/// up to the first gap.
pub fn build_stages(config: &dyn ConfigPort) -> Result<Vec<StageDefinition>, CrisisWatchError> {
    let params = build_stage_params(config);
    let mut stages = default_stages(&params);

    for def in &mut stages {
        let Some(section) = def.stage.config_section() else {
            continue;
        };

        let mut rules = Vec::new();
        for n in 1.. {
            let key = format!("trigger{}", n);
            let Some(raw) = config.get_string(section, &key) else {
                break;
            };
            rules.push(parse_trigger(section, &key, &raw)?);
        }
        if !rules.is_empty() {
            def.rules = rules;
        }

        let threshold = config
            .get_int(section, "threshold", def.activation_threshold as i64)
            .max(0) as usize;
        if threshold > def.rules.len() {
            return Err(CrisisWatchError::RuleInvalid {
                reason: format!(
                    "[{}] threshold {} exceeds its {} rules; the stage could never activate",
                    section,
                    threshold,
                    def.rules.len()
                ),
            });
        }
        def.activation_threshold = threshold;
    }

    Ok(stages)
}

pub fn build_positions(config: &dyn ConfigPort) -> Result<Vec<PortfolioPosition>, CrisisWatchError> {
    let raw = config
        .get_string("portfolio", "positions")
        .unwrap_or_else(|| portfolio::DEFAULT_POSITIONS.to_string());
    portfolio::parse_positions(&raw)
}

pub fn build_dashboard_options(config: &dyn ConfigPort) -> Result<DashboardOptions, CrisisWatchError> {
    let start = config
        .get_string("portfolio", "start_date")
        .unwrap_or_else(|| portfolio::DEFAULT_START_DATE.to_string());
    let portfolio_start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d").map_err(|_| {
        CrisisWatchError::ConfigInvalid {
            section: "portfolio".into(),
            key: "start_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;
    Ok(DashboardOptions {
        title: config
            .get_string("report", "title")
            .unwrap_or_else(|| DashboardOptions::default().title),
        portfolio_start: Some(portfolio_start),
        show_chart: config.get_bool("report", "chart", true),
        live: false,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceMode {
    Live,
    Offline { data_dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub mode: SourceMode,
    pub timeout: Duration,
    pub quote_base_url: String,
    pub history_range: String,
    pub fred_base_url: String,
    pub breakeven_series: String,
    pub holdings_url: String,
    pub market_ttl: Duration,
    pub holdings_ttl: Duration,
}

impl SourceSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CrisisWatchError> {
        let string_or = |key: &str, default: &str| {
            config
                .get_string("sources", key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secs = |key: &str, default: i64| {
            Duration::from_secs(config.get_int("sources", key, default).max(0) as u64)
        };

        let mode = match string_or("mode", "live").to_lowercase().as_str() {
            "live" => SourceMode::Live,
            "offline" => SourceMode::Offline {
                data_dir: PathBuf::from(config.get_string("sources", "data_dir").ok_or_else(
                    || CrisisWatchError::ConfigMissing {
                        section: "sources".into(),
                        key: "data_dir".into(),
                    },
                )?),
            },
            other => {
                return Err(CrisisWatchError::ConfigInvalid {
                    section: "sources".into(),
                    key: "mode".into(),
                    reason: format!("'{}' is not one of live, offline", other),
                });
            }
        };

        Ok(Self {
            mode,
            timeout: secs("timeout_secs", http::DEFAULT_TIMEOUT.as_secs() as i64),
            quote_base_url: string_or("quote_base_url", yahoo_adapter::DEFAULT_BASE_URL),
            history_range: string_or("history_range", yahoo_adapter::DEFAULT_RANGE),
            fred_base_url: string_or("fred_base_url", fred_adapter::DEFAULT_BASE_URL),
            breakeven_series: string_or("breakeven_series", fred_adapter::BREAKEVEN_SERIES),
            holdings_url: string_or("holdings_url", tic_adapter::DEFAULT_REPORT_URL),
            market_ttl: secs("market_ttl_secs", DEFAULT_MARKET_TTL_SECS),
            holdings_ttl: secs("holdings_ttl_secs", DEFAULT_HOLDINGS_TTL_SECS),
        })
    }
}

/// Construct the source list for `settings`.
///
/// Live sources hold a blocking HTTP client, so this must run outside any
/// async runtime.
pub fn build_sources(settings: &SourceSettings) -> Result<Vec<SharedSource>, CrisisWatchError> {
    match &settings.mode {
        SourceMode::Offline { data_dir } => {
            info!(dir = %data_dir.display(), "using offline data");
            Ok(vec![Arc::new(CsvQuoteSource::new(
                data_dir.clone(),
                Indicator::ALL.to_vec(),
            ))])
        }
        SourceMode::Live => {
            let client = http::build_client(settings.timeout)?;
            let quotes = YahooQuoteSource::new(
                client.clone(),
                settings.quote_base_url.clone(),
                settings.history_range.clone(),
                Indicator::QUOTED.to_vec(),
            );
            let breakeven = FredSeriesSource::new(
                client.clone(),
                settings.fred_base_url.clone(),
                settings.breakeven_series.clone(),
                Indicator::Breakeven10y,
            );
            let holdings = TicHoldingsSource::new(client, settings.holdings_url.clone());
            Ok(vec![
                Arc::new(CachedSource::new(quotes, settings.market_ttl)),
                Arc::new(CachedSource::new(breakeven, settings.market_ttl)),
                Arc::new(CachedSource::new(holdings, settings.holdings_ttl)),
            ])
        }
    }
}

/// Plain-text summary of a cycle for the terminal.
pub fn format_summary(cycle: &Cycle) -> String {
    let mut out = String::new();
    out.push_str(&format!("Current stage: {}\n", cycle.stages.current.title()));
    out.push_str(&format!(
        "Evaluated:     {}\n",
        cycle.evaluated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(date) = cycle.history.last_date() {
        out.push_str(&format!("Prices as of:  {}\n", date));
    }
    out.push('\n');

    out.push_str("Indicators\n");
    for ind in Indicator::ALL {
        let value = cycle
            .snapshot
            .get(ind)
            .map(|v| ind.format_value(v))
            .unwrap_or_else(|| "unavailable".into());
        out.push_str(&format!("  {:<32} {}\n", ind.label(), value));
    }

    for tally in &cycle.stages.tallies {
        out.push_str(&format!(
            "\n{} [{}/{} triggered, {} needed]{}\n",
            tally.stage.title(),
            tally.triggered,
            tally.total,
            tally.activation_threshold,
            if tally.active { " ACTIVE" } else { "" }
        ));
        for rule in cycle.stages.rules.iter().filter(|r| r.stage == tally.stage) {
            let mark = if rule.triggered { "x" } else { " " };
            out.push_str(&format!("  [{}] {}\n", mark, rule.label));
        }
    }

    out.push_str("\nPortfolio\n");
    match &cycle.portfolio {
        Ok(state) => {
            for p in &state.positions {
                out.push_str(&format!(
                    "  {:<4} {:>12.6} units @ {:<14} = {:>12.2} ({:+.2})\n",
                    p.instrument.key(),
                    p.quantity,
                    p.instrument.format_value(p.current_price),
                    p.value,
                    p.gain
                ));
            }
            out.push_str(&format!(
                "  Total {:.2} on {:.2} invested ({:+.2}, {:+.2}%)\n",
                state.total_value, state.initial_total, state.gain, state.gain_pct
            ));
        }
        Err(e) => out.push_str(&format!("  not valued: {}\n", e)),
    }

    if !cycle.failures.is_empty() {
        out.push_str("\nUnavailable sources\n");
        for failure in &cycle.failures {
            out.push_str(&format!("  {}\n", failure.error));
        }
    }

    out
}

fn prepare(config_path: Option<&PathBuf>) -> Result<(FileConfigAdapter, Monitor), ExitCode> {
    let config = load_config(config_path)?;
    match Monitor::from_config(&config) {
        Ok(monitor) => Ok((config, monitor)),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

fn run_status(config_path: Option<&PathBuf>, json: bool) -> ExitCode {
    let (_, monitor) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let cycle = monitor.evaluate();

    if json {
        match serde_json::to_string_pretty(&cycle_json(&cycle)) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        print!("{}", format_summary(&cycle));
    }
    ExitCode::SUCCESS
}

fn run_render(config_path: Option<&PathBuf>, output: Option<&PathBuf>) -> ExitCode {
    let (config, monitor) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let output_path = output
        .map(|p| p.display().to_string())
        .or_else(|| config.get_string("report", "output"))
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let cycle = monitor.evaluate();
    let adapter = HtmlReportAdapter::new(monitor.options.clone());
    if let Err(e) = adapter.write(&cycle, &output_path) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!(
        "Stage: {}. Dashboard written to {}",
        cycle.stages.current.title(),
        Path::new(&output_path).display()
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: Option<&PathBuf>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let checked = validate_config(&config)
        .and_then(|_| SourceSettings::from_config(&config))
        .and_then(|settings| {
            let stages = build_stages(&config)?;
            let positions = build_positions(&config)?;
            build_dashboard_options(&config)?;
            Ok((settings, stages, positions))
        });
    let (settings, stages, positions) = match checked {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match &settings.mode {
        SourceMode::Live => println!("Sources: live"),
        SourceMode::Offline { data_dir } => {
            println!("Sources: offline ({})", data_dir.display())
        }
    }
    for def in &stages {
        println!(
            "\n{} (active at {} of {})",
            def.stage.title(),
            def.activation_threshold,
            def.rules.len()
        );
        for rule in &def.rules {
            let reads: Vec<&str> = rule.condition.indicators().into_iter().map(|i| i.key()).collect();
            println!(
                "  {:<44} {}  [reads {}]",
                rule.label,
                rule.condition,
                reads.join(", ")
            );
        }
    }
    println!("\nPortfolio");
    for p in &positions {
        println!(
            "  {:<4} {:>10.2} at {:>12.2} ({:.6} units)",
            p.instrument().key(),
            p.initial_allocation(),
            p.reference_price(),
            p.quantity()
        );
    }
    println!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_serve(config_path: Option<&PathBuf>, listen: Option<&str>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;

        let (config, monitor) = match prepare(config_path) {
            Ok(p) => p,
            Err(code) => return code,
        };

        let listen = listen
            .map(str::to_string)
            .or_else(|| config.get_string("web", "listen"))
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let addr: SocketAddr = match listen.parse() {
            Ok(a) => a,
            Err(_) => {
                let err = CrisisWatchError::ConfigInvalid {
                    section: "web".into(),
                    key: "listen".into(),
                    reason: format!("'{}' is not a socket address", listen),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        };

        let state = Arc::new(AppState {
            sources: monitor.sources,
            stages: monitor.stages,
            positions: monitor.positions,
            options: monitor.options,
        });
        let router = build_router(Arc::clone(&state));

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("error: failed to start runtime: {e}");
                return ExitCode::from(1);
            }
        };

        eprintln!("Starting web server on {}", addr);
        let served = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
        });
        drop(runtime);
        // Blocking HTTP clients must not be dropped inside the runtime.
        drop(state);

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                let err = CrisisWatchError::Io(e);
                eprintln!("error: {err}");
                (&err).into()
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config_path, listen, DEFAULT_LISTEN);
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
