//! Literal stock records every new session starts with

use crate::models::{StockAnalysis, StockRecord};

/// Date stamped on seeded records
pub const SEED_DATE: &str = "2024-01-15";

struct Seed {
    symbol: &'static str,
    name: &'static str,
    sector: &'static str,
    price: f64,
    high: f64,
    low: f64,
    support: [f64; 3],
    resistance: [f64; 3],
    rsi: f64,
    volume: i64,
    pe_ratio: f64,
    dividend_yield: f64,
}

const SEEDS: [Seed; 5] = [
    Seed {
        symbol: "LUCK",
        name: "Lucky Cement Limited",
        sector: "Cement",
        price: 875.50,
        high: 950.00,
        low: 620.25,
        support: [850.00, 820.00, 790.00],
        resistance: [900.00, 925.00, 950.00],
        rsi: 58.4,
        volume: 1_250_000,
        pe_ratio: 7.8,
        dividend_yield: 2.1,
    },
    Seed {
        symbol: "TRG",
        name: "TRG Pakistan Limited",
        sector: "Technology",
        price: 72.35,
        high: 145.80,
        low: 61.10,
        support: [70.00, 66.50, 62.00],
        resistance: [76.00, 81.50, 88.00],
        rsi: 42.7,
        volume: 8_400_000,
        pe_ratio: 4.3,
        dividend_yield: 0.0,
    },
    Seed {
        symbol: "ENGRO",
        name: "Engro Corporation Limited",
        sector: "Fertilizer",
        price: 312.80,
        high: 345.00,
        low: 255.40,
        support: [305.00, 295.00, 282.00],
        resistance: [320.00, 332.00, 345.00],
        rsi: 51.2,
        volume: 640_000,
        pe_ratio: 6.9,
        dividend_yield: 9.6,
    },
    Seed {
        symbol: "HBL",
        name: "Habib Bank Limited",
        sector: "Banking",
        price: 112.45,
        high: 125.90,
        low: 68.30,
        support: [108.00, 103.50, 98.00],
        resistance: [116.00, 121.00, 126.00],
        rsi: 63.8,
        volume: 2_150_000,
        pe_ratio: 3.6,
        dividend_yield: 11.4,
    },
    Seed {
        symbol: "OGDC",
        name: "Oil & Gas Development Company Limited",
        sector: "Oil & Gas Exploration",
        price: 118.20,
        high: 132.75,
        low: 76.90,
        support: [114.00, 109.50, 104.00],
        resistance: [122.50, 127.00, 132.75],
        rsi: 67.1,
        volume: 5_900_000,
        pe_ratio: 3.2,
        dividend_yield: 8.7,
    },
];

/// Build the seed records
pub fn seed_stocks() -> Vec<StockRecord> {
    SEEDS
        .iter()
        .map(|s| StockRecord {
            symbol: s.symbol.to_string(),
            name: s.name.to_string(),
            sector: s.sector.to_string(),
            analysis: StockAnalysis {
                current_price: s.price,
                week_52_high: s.high,
                week_52_low: s.low,
                support_levels: s.support.to_vec(),
                resistance_levels: s.resistance.to_vec(),
                rsi: s.rsi,
                volume: s.volume,
                pe_ratio: s.pe_ratio,
                dividend_yield: s.dividend_yield,
                last_updated: SEED_DATE.to_string(),
            },
        })
        .collect()
}
