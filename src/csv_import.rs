//! CSV import and export of stock records
//!
//! Required columns: `symbol, name, sector, current_price`. Optional columns:
//! `52_week_high, 52_week_low, support_levels, resistance_levels, rsi, volume,
//! pe_ratio, dividend_yield`. Level columns hold a JSON array inside the cell,
//! e.g. `"[850.0, 820.0, 790.0]"`.

use std::collections::HashMap;

use chrono::Utc;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::db::Database;
use crate::error::{DashboardError, Result};
use crate::models::{ImportResult, StockAnalysis, StockRecord};

pub const REQUIRED_COLUMNS: [&str; 4] = ["symbol", "name", "sector", "current_price"];

pub const OPTIONAL_COLUMNS: [&str; 8] = [
    "52_week_high",
    "52_week_low",
    "support_levels",
    "resistance_levels",
    "rsi",
    "volume",
    "pe_ratio",
    "dividend_yield",
];

const DEFAULT_RSI: f64 = 50.0;

/// Parse and upsert every row. Nothing is written unless every row parses.
pub fn import_csv(db: &mut Database, csv_content: &str) -> Result<ImportResult> {
    let imported_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let records = parse_stock_csv(csv_content, &imported_at)?;

    db.upsert_stocks(&records)?;

    // A symbol repeated in one file is one key: the last row wins
    let mut symbols: Vec<String> = Vec::with_capacity(records.len());
    for record in records {
        if !symbols.contains(&record.symbol) {
            symbols.push(record.symbol);
        }
    }
    let imported = symbols.len();
    log::info!("Imported {} stocks from CSV: {}", imported, symbols.join(", "));

    Ok(ImportResult { imported, symbols })
}

/// Parse CSV text into stock records stamped with `imported_at`
pub fn parse_stock_csv(csv_content: &str, imported_at: &str) -> Result<Vec<StockRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(csv_content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h, i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.contains_key(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let parsed = RowReader {
            row: &row,
            columns: &columns,
            row_number: i + 1,
        };
        records.push(parsed.to_stock(imported_at)?);
    }

    Ok(records)
}

struct RowReader<'a> {
    row: &'a StringRecord,
    columns: &'a HashMap<&'a str, usize>,
    row_number: usize,
}

impl RowReader<'_> {
    /// Cell text, `None` when the column is absent or the cell is blank
    fn cell(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|&idx| self.row.get(idx))
            .filter(|v| !v.is_empty())
    }

    fn malformed(&self, column: &str, value: &str) -> DashboardError {
        DashboardError::MalformedField {
            row: self.row_number,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    fn float(&self, column: &str) -> Result<Option<f64>> {
        match self.cell(column) {
            None => Ok(None),
            Some(raw) => raw
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| self.malformed(column, raw)),
        }
    }

    fn integer(&self, column: &str) -> Result<Option<i64>> {
        match self.cell(column) {
            None => Ok(None),
            Some(raw) => {
                let cleaned = raw.replace(',', "");
                if let Ok(v) = cleaned.parse::<i64>() {
                    return Ok(Some(v));
                }
                cleaned
                    .parse::<f64>()
                    .ok()
                    .map(f64::round)
                    .filter(|v| (i64::MIN as f64..i64::MAX as f64).contains(v))
                    .map(|v| Some(v as i64))
                    .ok_or_else(|| self.malformed(column, raw))
            }
        }
    }

    fn levels(&self, column: &str) -> Result<Vec<f64>> {
        match self.cell(column) {
            None => Ok(Vec::new()),
            Some(raw) => {
                serde_json::from_str::<Vec<f64>>(raw).map_err(|_| self.malformed(column, raw))
            }
        }
    }

    fn text(&self, column: &str) -> Result<String> {
        self.cell(column)
            .map(str::to_string)
            .ok_or_else(|| self.malformed(column, ""))
    }

    fn to_stock(&self, imported_at: &str) -> Result<StockRecord> {
        let symbol = self.text("symbol")?.to_uppercase();
        let current_price = self
            .float("current_price")?
            .ok_or_else(|| self.malformed("current_price", ""))?;

        Ok(StockRecord {
            symbol,
            name: self.text("name")?,
            sector: self.text("sector")?,
            analysis: StockAnalysis {
                current_price,
                week_52_high: self.float("52_week_high")?.unwrap_or(current_price),
                week_52_low: self.float("52_week_low")?.unwrap_or(current_price),
                support_levels: self.levels("support_levels")?,
                resistance_levels: self.levels("resistance_levels")?,
                rsi: self.float("rsi")?.unwrap_or(DEFAULT_RSI),
                volume: self.integer("volume")?.unwrap_or(0),
                pe_ratio: self.float("pe_ratio")?.unwrap_or(0.0),
                dividend_yield: self.float("dividend_yield")?.unwrap_or(0.0),
                last_updated: imported_at.to_string(),
            },
        })
    }
}

/// Write records in the import format
pub fn export_csv(stocks: &[StockRecord]) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let header: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .chain(OPTIONAL_COLUMNS.iter())
        .copied()
        .collect();
    writer.write_record(&header)?;

    for stock in stocks {
        let a = &stock.analysis;
        writer.write_record([
            stock.symbol.clone(),
            stock.name.clone(),
            stock.sector.clone(),
            a.current_price.to_string(),
            a.week_52_high.to_string(),
            a.week_52_low.to_string(),
            serde_json::to_string(&a.support_levels)?,
            serde_json::to_string(&a.resistance_levels)?,
            a.rsi.to_string(),
            a.volume.to_string(),
            a.pe_ratio.to_string(),
            a.dividend_yield.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::InvalidInput(e.to_string()))
}

/// Reference template: full header plus one example row
pub fn csv_template() -> Result<String> {
    let example: Vec<StockRecord> = crate::seed::seed_stocks().into_iter().take(1).collect();
    export_csv(&example)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROWS: &str = "symbol,name,sector,current_price,support_levels,volume\n\
        mebl,Meezan Bank,Banking,210.5,\"[200.0, 195.5, 190.0]\",\"1,500,000\"\n\
        SYS,Systems Limited,Technology,410,,\n";

    #[test]
    fn test_parse_two_rows_with_defaults() {
        let stocks = parse_stock_csv(TWO_ROWS, "2024-06-01 10:00:00").unwrap();
        assert_eq!(stocks.len(), 2);

        let mebl = &stocks[0];
        assert_eq!(mebl.symbol, "MEBL");
        assert_eq!(mebl.analysis.support_levels, vec![200.0, 195.5, 190.0]);
        assert_eq!(mebl.analysis.volume, 1_500_000);
        assert_eq!(mebl.analysis.week_52_high, 210.5);
        assert_eq!(mebl.analysis.last_updated, "2024-06-01 10:00:00");

        let sys = &stocks[1];
        assert!(sys.analysis.resistance_levels.is_empty());
        assert_eq!(sys.analysis.rsi, DEFAULT_RSI);
        assert_eq!(sys.analysis.volume, 0);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "symbol,name,sector\nLUCK,Lucky,Cement\n";
        match parse_stock_csv(csv, "now") {
            Err(DashboardError::MissingColumns(cols)) => assert_eq!(cols, vec!["current_price"]),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_price_reports_row() {
        let csv = "symbol,name,sector,current_price\nA,A,X,1.0\nB,B,X,abc\n";
        match parse_stock_csv(csv, "now") {
            Err(DashboardError::MalformedField { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "current_price");
            }
            other => panic!("expected MalformedField, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_levels() {
        let csv = "symbol,name,sector,current_price,support_levels\nA,A,X,1.0,\"[1.0, two]\"\n";
        assert!(matches!(
            parse_stock_csv(csv, "now"),
            Err(DashboardError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_out_of_range_volume_rejected() {
        let csv = "symbol,name,sector,current_price,volume\nA,A,X,1.0,1e30\n";
        match parse_stock_csv(csv, "now") {
            Err(DashboardError::MalformedField { column, value, .. }) => {
                assert_eq!(column, "volume");
                assert_eq!(value, "1e30");
            }
            other => panic!("expected MalformedField, got {:?}", other),
        }

        let csv = "symbol,name,sector,current_price,volume\nA,A,X,1.0,2500.6\n";
        assert_eq!(parse_stock_csv(csv, "now").unwrap()[0].analysis.volume, 2501);
    }

    #[test]
    fn test_level_cells_parse_exactly() {
        let cell = serde_json::to_string(&vec![900.0 * 1.1, 0.1 + 0.2]).unwrap();
        let csv = format!(
            "symbol,name,sector,current_price,resistance_levels\nA,A,X,1.0,\"{}\"\n",
            cell
        );
        let stocks = parse_stock_csv(&csv, "now").unwrap();
        assert_eq!(stocks[0].analysis.resistance_levels, vec![900.0 * 1.1, 0.1 + 0.2]);
    }

    #[test]
    fn test_repeated_symbol_counts_once() {
        let mut db = Database::open_in_memory().unwrap();
        let csv = "symbol,name,sector,current_price\n\
            luck,Lucky Cement,Cement,800\n\
            LUCK,Lucky Cement,Cement,810\n\
            TRG,TRG Pakistan,Technology,70\n";

        let result = import_csv(&mut db, csv).unwrap();
        assert_eq!(result.imported, 2);
        assert_eq!(result.symbols, vec!["LUCK", "TRG"]);
        let luck = db.get_stock("LUCK").unwrap().unwrap();
        assert_eq!(luck.analysis.current_price, 810.0);
    }

    #[test]
    fn test_template_parses_back() {
        let template = csv_template().unwrap();
        let header = template.lines().next().unwrap();
        assert!(header.starts_with("symbol,name,sector,current_price,52_week_high"));

        let stocks = parse_stock_csv(&template, "now").unwrap();
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].symbol, "LUCK");
        assert_eq!(stocks[0].analysis.support_levels.len(), 3);
    }

    #[test]
    fn test_import_failure_leaves_store_untouched() {
        let mut db = Database::with_seed_data().unwrap();
        let before = db.get_stocks().unwrap();

        let csv = "symbol,name,sector\nLUCK,Changed,Cement\n";
        assert!(import_csv(&mut db, csv).is_err());
        assert_eq!(db.get_stocks().unwrap(), before);
    }
}
