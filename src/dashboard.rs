//! Display-ready views of a stock record
//!
//! Everything here is pure: metrics formatting, the synthetic price line and the
//! support/resistance listing. The price line is NOT historical data, it is a
//! straight ramp from 95% to 105% of the stored current price.

use serde::{Deserialize, Serialize};

use crate::models::StockRecord;

/// Number of points on the synthetic price chart
pub const SERIES_POINTS: usize = 30;
const SERIES_START: f64 = 0.95;
const SERIES_END: f64 = 1.05;

/// One labeled figure on the metrics panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub day: usize,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsView {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

/// Everything the dashboard shows for one stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockView {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub metrics: Vec<Metric>,
    pub price_series: Vec<PricePoint>,
    pub levels: LevelsView,
}

impl StockView {
    pub fn from_record(record: &StockRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            name: record.name.clone(),
            sector: record.sector.clone(),
            metrics: metrics(record),
            price_series: price_series(record.analysis.current_price),
            levels: levels(record),
        }
    }
}

fn metric(label: &str, value: String) -> Metric {
    Metric {
        label: label.to_string(),
        value,
    }
}

pub fn metrics(record: &StockRecord) -> Vec<Metric> {
    let a = &record.analysis;
    vec![
        metric("Current Price", format_pkr(a.current_price)),
        metric("52W High", format_pkr(a.week_52_high)),
        metric("52W Low", format_pkr(a.week_52_low)),
        metric("RSI", format!("{:.1}", a.rsi)),
        metric("Volume", group_thousands(&a.volume.to_string())),
        metric("P/E Ratio", format!("{:.2}", a.pe_ratio)),
        metric("Dividend Yield", format!("{:.1}%", a.dividend_yield)),
        metric("Last Updated", a.last_updated.clone()),
    ]
}

/// Linear ramp from 0.95 * price to 1.05 * price, both ends included
pub fn price_series(current_price: f64) -> Vec<PricePoint> {
    let start = current_price * SERIES_START;
    let end = current_price * SERIES_END;
    let step = (end - start) / (SERIES_POINTS - 1) as f64;

    (0..SERIES_POINTS)
        .map(|i| PricePoint {
            day: i + 1,
            price: start + step * i as f64,
        })
        .collect()
}

pub fn levels(record: &StockRecord) -> LevelsView {
    LevelsView {
        support: record.analysis.support_levels.clone(),
        resistance: record.analysis.resistance_levels.clone(),
    }
}

/// `1234.5` -> `PKR 1,234.50`
pub fn format_pkr(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("PKR {}{}.{}", sign, group_thousands(whole), frac)
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{}{}", sign, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_stocks;

    #[test]
    fn test_price_series_ramp() {
        let p = 875.5;
        let series = price_series(p);
        assert_eq!(series.len(), SERIES_POINTS);
        assert!((series[0].price - 0.95 * p).abs() < 1e-9);
        assert!((series[SERIES_POINTS - 1].price - 1.05 * p).abs() < 1e-6);
        assert!(series.windows(2).all(|w| w[1].price > w[0].price));
        assert_eq!(series[0].day, 1);
        assert_eq!(series[29].day, 30);
    }

    #[test]
    fn test_format_pkr() {
        assert_eq!(format_pkr(1234.5), "PKR 1,234.50");
        assert_eq!(format_pkr(72.354), "PKR 72.35");
        assert_eq!(format_pkr(1_000_000.0), "PKR 1,000,000.00");
        assert_eq!(format_pkr(-5.0), "PKR -5.00");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1250000"), "1,250,000");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("-1000"), "-1,000");
    }

    #[test]
    fn test_stock_view_for_seed() {
        let luck = seed_stocks().into_iter().find(|s| s.symbol == "LUCK").unwrap();
        let view = StockView::from_record(&luck);

        assert_eq!(view.metrics[0], metric("Current Price", "PKR 875.50".into()));
        let volume = view.metrics.iter().find(|m| m.label == "Volume").unwrap();
        assert_eq!(volume.value, "1,250,000");
        assert_eq!(view.levels.support, vec![850.0, 820.0, 790.0]);
        assert_eq!(view.price_series.len(), 30);
    }
}
