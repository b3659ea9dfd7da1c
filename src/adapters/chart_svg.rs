//! SVG price chart for the dashboard.
//!
//! Each series is rebased to 100 at its first observation so instruments
//! with very different price levels share one axis.

use crate::domain::history::PriceHistory;
use crate::domain::indicator::Indicator;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 320.0;
const PADDING: f64 = 40.0;
const LEGEND_HEIGHT: f64 = 24.0;
const PALETTE: [&str; 6] = ["#f7931a", "#d4af37", "#1f77b4", "#2ca02c", "#9467bd", "#8c564b"];

/// Series values divided by the first non-missing value, times 100.
pub fn rebase(column: &[Option<f64>]) -> Vec<Option<f64>> {
    let Some(base) = column.iter().flatten().copied().find(|v| *v != 0.0) else {
        return vec![None; column.len()];
    };
    column.iter().map(|v| v.map(|v| v / base * 100.0)).collect()
}

pub fn format_history_chart(history: &PriceHistory, instruments: &[Indicator]) -> String {
    let series: Vec<(Indicator, Vec<Option<f64>>)> = instruments
        .iter()
        .filter_map(|ind| history.columns.get(ind).map(|col| (*ind, rebase(col))))
        .filter(|(_, col)| col.iter().any(Option::is_some))
        .collect();

    if history.is_empty() || series.is_empty() {
        return format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}"><text x="{x:.0}" y="{y:.0}" text-anchor="middle" font-family="sans-serif" font-size="14" fill="#666">No price history available.</text></svg>"##,
            w = WIDTH,
            h = HEIGHT,
            x = WIDTH / 2.0,
            y = HEIGHT / 2.0
        );
    }

    let (min, max) = series
        .iter()
        .flat_map(|(_, col)| col.iter().flatten().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING - LEGEND_HEIGHT;
    let range = max - min;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if history.len() > 1 {
        plot_width / (history.len() - 1) as f64
    } else {
        0.0
    };
    let bottom = HEIGHT - PADDING;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="sans-serif" font-size="11">"#,
        w = WIDTH,
        h = HEIGHT
    );
    svg.push_str(&format!(
        r##"<line x1="{p:.0}" y1="{top:.0}" x2="{p:.0}" y2="{b:.0}" stroke="#999"/><line x1="{p:.0}" y1="{b:.0}" x2="{r:.0}" y2="{b:.0}" stroke="#999"/>"##,
        p = PADDING,
        top = PADDING + LEGEND_HEIGHT,
        b = bottom,
        r = WIDTH - PADDING
    ));
    svg.push_str(&format!(
        r##"<text x="{x:.0}" y="{y:.1}" text-anchor="end" fill="#666">{max:.0}</text><text x="{x:.0}" y="{b:.1}" text-anchor="end" fill="#666">{min:.0}</text>"##,
        x = PADDING - 4.0,
        y = PADDING + LEGEND_HEIGHT + 4.0,
        b = bottom,
        max = max,
        min = min
    ));
    if let (Some(first), Some(last)) = (history.dates.first(), history.dates.last()) {
        svg.push_str(&format!(
            r##"<text x="{l:.0}" y="{y:.0}" fill="#666">{first}</text><text x="{r:.0}" y="{y:.0}" text-anchor="end" fill="#666">{last}</text>"##,
            l = PADDING,
            r = WIDTH - PADDING,
            y = bottom + 16.0,
        ));
    }

    for (idx, (indicator, column)) in series.iter().enumerate() {
        let colour = PALETTE[idx % PALETTE.len()];
        let points: Vec<String> = column
            .iter()
            .enumerate()
            .filter_map(|(i, v)| {
                v.map(|v| {
                    let x = PADDING + i as f64 * scale_x;
                    let y = bottom - (v - min) * scale_y;
                    format!("{:.1},{:.1}", x, y)
                })
            })
            .collect();
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
            colour,
            points.join(" ")
        ));

        let legend_x = PADDING + idx as f64 * 150.0;
        svg.push_str(&format!(
            r#"<rect x="{x:.0}" y="{y:.0}" width="12" height="12" fill="{c}"/><text x="{tx:.0}" y="{ty:.0}">{label}</text>"#,
            x = legend_x,
            y = PADDING - 8.0,
            c = colour,
            tx = legend_x + 16.0,
            ty = PADDING + 2.0,
            label = indicator.label()
        ));
    }

    svg.push_str("</svg>");
    svg
}
