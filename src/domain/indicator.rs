//! Indicator catalogue.
//!
//! Every value the dashboard tracks is one of a fixed set of [`Indicator`]s.
//! Each carries a short key (used in config files and rule conditions), a
//! display label, an optional quote-provider ticker, and a value formatter.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    Bitcoin,
    Gold,
    TreasuryYield10y,
    Dxy,
    Breakeven10y,
    ForeignHoldings,
    ForeignHoldingsChange,
    UraniumEtf,
    Cameco,
}

impl Indicator {
    pub const ALL: [Indicator; 9] = [
        Indicator::Bitcoin,
        Indicator::Gold,
        Indicator::TreasuryYield10y,
        Indicator::Dxy,
        Indicator::Breakeven10y,
        Indicator::ForeignHoldings,
        Indicator::ForeignHoldingsChange,
        Indicator::UraniumEtf,
        Indicator::Cameco,
    ];

    /// Instruments fetched from the quote provider.
    pub const QUOTED: [Indicator; 6] = [
        Indicator::Bitcoin,
        Indicator::Gold,
        Indicator::TreasuryYield10y,
        Indicator::Dxy,
        Indicator::UraniumEtf,
        Indicator::Cameco,
    ];

    /// Series drawn on the core indicators chart.
    pub const CHARTED: [Indicator; 4] = [
        Indicator::Bitcoin,
        Indicator::Gold,
        Indicator::TreasuryYield10y,
        Indicator::Dxy,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Indicator::Bitcoin => "BTC",
            Indicator::Gold => "GOLD",
            Indicator::TreasuryYield10y => "TNX",
            Indicator::Dxy => "DXY",
            Indicator::Breakeven10y => "BREAKEVEN",
            Indicator::ForeignHoldings => "TIC",
            Indicator::ForeignHoldingsChange => "TIC_MOM",
            Indicator::UraniumEtf => "URA",
            Indicator::Cameco => "CCJ",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::Bitcoin => "Bitcoin",
            Indicator::Gold => "Gold Spot",
            Indicator::TreasuryYield10y => "10y Treasury Yield",
            Indicator::Dxy => "DXY",
            Indicator::Breakeven10y => "10-Year Breakeven Inflation",
            Indicator::ForeignHoldings => "Foreign Holdings of Treasuries",
            Indicator::ForeignHoldingsChange => "Foreign Holdings MoM Change",
            Indicator::UraniumEtf => "Uranium ETF URA",
            Indicator::Cameco => "Cameco CCJ",
        }
    }

    /// Quote-provider symbol, if this indicator is a quoted instrument.
    pub fn ticker(self) -> Option<&'static str> {
        match self {
            Indicator::Bitcoin => Some("BTC-USD"),
            Indicator::Gold => Some("GC=F"),
            Indicator::TreasuryYield10y => Some("^TNX"),
            Indicator::Dxy => Some("DX-Y.NYB"),
            Indicator::UraniumEtf => Some("URA"),
            Indicator::Cameco => Some("CCJ"),
            Indicator::Breakeven10y
            | Indicator::ForeignHoldings
            | Indicator::ForeignHoldingsChange => None,
        }
    }

    pub fn format_value(self, value: f64) -> String {
        match self {
            Indicator::Bitcoin | Indicator::Gold => format!("${}", group_thousands(value, 0)),
            Indicator::TreasuryYield10y | Indicator::Breakeven10y => format!("{:.2}%", value),
            Indicator::Dxy => format!("{:.2}", value),
            Indicator::ForeignHoldings => format!("${}B", group_thousands(value, 1)),
            Indicator::ForeignHoldingsChange => format!("{:+.1}B MoM", value),
            Indicator::UraniumEtf | Indicator::Cameco => {
                format!("${}", group_thousands(value, 2))
            }
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator '{0}'")]
pub struct UnknownIndicator(pub String);

impl FromStr for Indicator {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Indicator::ALL
            .into_iter()
            .find(|ind| ind.key() == wanted)
            .ok_or_else(|| UnknownIndicator(s.trim().to_string()))
    }
}

/// Format `value` with `decimals` places and comma-grouped thousands.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
