//! Data models for the PSX dashboard

use serde::{Deserialize, Serialize};

/// Registered user (the password is only ever held as a hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Precomputed analysis figures for one stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub current_price: f64,
    #[serde(rename = "52_week_high")]
    pub week_52_high: f64,
    #[serde(rename = "52_week_low")]
    pub week_52_low: f64,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
    pub rsi: f64,
    pub volume: i64,
    pub pe_ratio: f64,
    pub dividend_yield: f64,
    pub last_updated: String,
}

/// Stock record keyed by ticker symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub analysis: StockAnalysis,
}

/// Short listing entry for stock selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSummary {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub current_price: f64,
}

impl From<&StockRecord> for StockSummary {
    fn from(record: &StockRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            name: record.name.clone(),
            sector: record.sector.clone(),
            current_price: record.analysis.current_price,
        }
    }
}

/// Result of a CSV import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: usize,
    pub symbols: Vec<String>,
}

/// Kind of report requested from the language model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisType {
    #[default]
    #[serde(rename = "All Analysis")]
    All,
    #[serde(rename = "Support & Resistance Only")]
    SupportResistance,
    #[serde(rename = "Price Forecast Only")]
    PriceForecast,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 3] = [
        AnalysisType::All,
        AnalysisType::SupportResistance,
        AnalysisType::PriceForecast,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::All => "All Analysis",
            AnalysisType::SupportResistance => "Support & Resistance Only",
            AnalysisType::PriceForecast => "Price Forecast Only",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == s.trim())
    }

    /// Report sections the model is asked to produce for this type
    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            AnalysisType::All => &[
                "current_market_data",
                "support_resistance_levels",
                "expected_price_movement",
                "technical_indicator_summary",
                "market_considerations",
            ],
            AnalysisType::SupportResistance => &[
                "current_market_data",
                "support_resistance_levels",
                "market_considerations",
            ],
            AnalysisType::PriceForecast => &[
                "current_market_data",
                "expected_price_movement",
                "technical_indicator_summary",
                "market_considerations",
            ],
        }
    }
}
