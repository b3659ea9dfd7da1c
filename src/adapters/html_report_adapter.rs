//! HTML dashboard adapter implementing ReportPort.
//!
//! Renders one evaluation cycle through Askama templates with an inline SVG
//! chart. The web server reuses [`render_dashboard`] for its index page.

use std::fs;
use std::path::Path;

use askama::Template;
use chrono::NaiveDate;

use crate::adapters::chart_svg::format_history_chart;
use crate::domain::cycle::Cycle;
use crate::domain::error::CrisisWatchError;
use crate::domain::indicator::{Indicator, group_thousands};
use crate::domain::portfolio::PortfolioState;
use crate::domain::stage::Stage;
use crate::ports::report_port::ReportPort;

/// Indicators shown as cards, in display order.
const METRIC_CARDS: [Indicator; 7] = [
    Indicator::Bitcoin,
    Indicator::Gold,
    Indicator::TreasuryYield10y,
    Indicator::Dxy,
    Indicator::Breakeven10y,
    Indicator::ForeignHoldings,
    Indicator::UraniumEtf,
];

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub title: String,
    pub portfolio_start: Option<NaiveDate>,
    /// Embed the history chart; off keeps the page small for slow links.
    pub show_chart: bool,
    /// Page is served by the web adapter, so it gets a refresh control.
    pub live: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            title: "Crisis Watch".into(),
            portfolio_start: None,
            show_chart: true,
            live: false,
        }
    }
}

struct MetricCard {
    label: &'static str,
    value: String,
    note: String,
}

struct RuleRow {
    label: String,
    triggered: bool,
}

struct StageSection {
    title: &'static str,
    triggered: usize,
    total: usize,
    threshold: usize,
    active: bool,
    rules: Vec<RuleRow>,
}

struct PositionRow {
    key: &'static str,
    label: &'static str,
    quantity: String,
    price: String,
    value: String,
    gain: String,
    up: bool,
}

struct PortfolioView {
    total: String,
    initial: String,
    gain: String,
    gain_pct: String,
    up: bool,
    positions: Vec<PositionRow>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    title: String,
    generated_at: String,
    live: bool,
    stage_title: &'static str,
    stage_class: &'static str,
    metrics: Vec<MetricCard>,
    chart_svg: String,
    stages: Vec<StageSection>,
    portfolio: Option<PortfolioView>,
    portfolio_error: String,
    portfolio_start: String,
    failures: Vec<String>,
}

pub fn stage_css_class(stage: Stage) -> &'static str {
    match stage {
        Stage::Complacency => "stage-complacency",
        Stage::Pre => "stage-pre",
        Stage::Near => "stage-near",
        Stage::InIt => "stage-in-it",
    }
}

fn money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(value.abs(), 2))
}

fn signed_money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "+" };
    format!("{}${}", sign, group_thousands(value.abs(), 2))
}

fn metric_cards(cycle: &Cycle) -> Vec<MetricCard> {
    METRIC_CARDS
        .iter()
        .map(|&ind| {
            let value = cycle
                .snapshot
                .get(ind)
                .map(|v| ind.format_value(v))
                .unwrap_or_else(|| "unavailable".into());
            let note = match ind {
                Indicator::ForeignHoldings => cycle
                    .snapshot
                    .get(Indicator::ForeignHoldingsChange)
                    .map(|v| Indicator::ForeignHoldingsChange.format_value(v))
                    .unwrap_or_default(),
                _ => String::new(),
            };
            MetricCard {
                label: ind.label(),
                value,
                note,
            }
        })
        .collect()
}

fn stage_sections(cycle: &Cycle) -> Vec<StageSection> {
    cycle
        .stages
        .tallies
        .iter()
        .map(|tally| StageSection {
            title: tally.stage.title(),
            triggered: tally.triggered,
            total: tally.total,
            threshold: tally.activation_threshold,
            active: tally.active,
            rules: cycle
                .stages
                .rules
                .iter()
                .filter(|r| r.stage == tally.stage)
                .map(|r| RuleRow {
                    label: r.label.clone(),
                    triggered: r.triggered,
                })
                .collect(),
        })
        .collect()
}

fn portfolio_view(state: &PortfolioState) -> PortfolioView {
    PortfolioView {
        total: money(state.total_value),
        initial: money(state.initial_total),
        gain: signed_money(state.gain),
        gain_pct: format!("{:+.2}%", state.gain_pct),
        up: state.gain >= 0.0,
        positions: state
            .positions
            .iter()
            .map(|p| PositionRow {
                key: p.instrument.key(),
                label: p.instrument.label(),
                quantity: format!("{:.6}", p.quantity),
                price: p.instrument.format_value(p.current_price),
                value: money(p.value),
                gain: signed_money(p.gain),
                up: p.gain >= 0.0,
            })
            .collect(),
    }
}

/// Render the full dashboard page for `cycle`.
pub fn render_dashboard(cycle: &Cycle, options: &DashboardOptions) -> Result<String, CrisisWatchError> {
    let (portfolio, portfolio_error) = match &cycle.portfolio {
        Ok(state) => (Some(portfolio_view(state)), String::new()),
        Err(e) => (None, e.to_string()),
    };

    let template = DashboardTemplate {
        title: options.title.clone(),
        generated_at: cycle.evaluated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        live: options.live,
        stage_title: cycle.stages.current.title(),
        stage_class: stage_css_class(cycle.stages.current),
        metrics: metric_cards(cycle),
        chart_svg: if options.show_chart {
            format_history_chart(&cycle.history, &Indicator::CHARTED)
        } else {
            String::new()
        },
        stages: stage_sections(cycle),
        portfolio,
        portfolio_error,
        portfolio_start: options
            .portfolio_start
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_default(),
        failures: cycle.failures.iter().map(|f| f.error.to_string()).collect(),
    };

    template.render().map_err(|e| CrisisWatchError::Render {
        reason: e.to_string(),
    })
}

pub struct HtmlReportAdapter {
    options: DashboardOptions,
}

impl HtmlReportAdapter {
    pub fn new(options: DashboardOptions) -> Self {
        Self { options }
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, cycle: &Cycle, output_path: &str) -> Result<(), CrisisWatchError> {
        let html = render_dashboard(cycle, &self.options)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;

        Ok(())
    }
}
