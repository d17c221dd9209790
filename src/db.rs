//! In-memory SQLite store for user accounts and stock records
//!
//! Every session owns one `Database`. Nothing is written to disk, so all
//! accounts and imported stocks disappear with the session.

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

use crate::error::{DashboardError, Result};
use crate::models::{StockAnalysis, StockRecord, UserAccount};

macro_rules! stock_params {
    ($stock:expr, $support:expr, $resistance:expr) => {
        params![
            $stock.symbol,
            $stock.name,
            $stock.sector,
            $stock.analysis.current_price,
            $stock.analysis.week_52_high,
            $stock.analysis.week_52_low,
            $support,
            $resistance,
            $stock.analysis.rsi,
            $stock.analysis.volume,
            $stock.analysis.pe_ratio,
            $stock.analysis.dividend_yield,
            $stock.analysis.last_updated,
        ]
    };
}

/// Database wrapper for session-scoped dashboard state
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open an empty in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database preloaded with the literal seed stocks
    pub fn with_seed_data() -> Result<Self> {
        let mut db = Self::open_in_memory()?;
        let seeded = db.upsert_stocks(&crate::seed::seed_stocks())?;
        log::debug!("Seeded {} stocks", seeded);
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Insert a new user. Fails if the email is already taken.
    pub fn insert_user(&self, user: &UserAccount) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (email, name, password_hash) VALUES (?1, ?2, ?3)",
            params![user.email, user.name, user.password_hash],
        )?;

        if inserted == 0 {
            return Err(DashboardError::AlreadyRegistered(user.email.clone()));
        }
        Ok(())
    }

    pub fn get_user(&self, email: &str) -> Result<Option<UserAccount>> {
        let user = self
            .conn
            .query_row(
                "SELECT email, name, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserAccount {
                        email: row.get(0)?,
                        name: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    // ========================================================================
    // Stocks
    // ========================================================================

    /// Insert or wholesale-replace a stock record
    pub fn upsert_stock(&self, stock: &StockRecord) -> Result<()> {
        let (support, resistance) = encode_levels(stock)?;
        self.conn.execute(UPSERT_STOCK_SQL, stock_params!(stock, support, resistance))?;
        Ok(())
    }

    /// Upsert many records in one transaction. Either all rows land or none do.
    pub fn upsert_stocks(&mut self, stocks: &[StockRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;

        {
            let mut stmt = tx.prepare(UPSERT_STOCK_SQL)?;
            for stock in stocks {
                let (support, resistance) = encode_levels(stock)?;
                stmt.execute(stock_params!(stock, support, resistance))?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    pub fn get_stock(&self, symbol: &str) -> Result<Option<StockRecord>> {
        let stock = self
            .conn
            .query_row(
                &format!("{} WHERE symbol = ?1", SELECT_STOCK_SQL),
                params![symbol],
                map_stock_row,
            )
            .optional()?;
        Ok(stock)
    }

    /// All stocks ordered by symbol
    pub fn get_stocks(&self) -> Result<Vec<StockRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY symbol", SELECT_STOCK_SQL))?;
        let stocks = stmt
            .query_map([], map_stock_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(stocks)
    }
}

fn encode_levels(stock: &StockRecord) -> Result<(String, String)> {
    Ok((
        serde_json::to_string(&stock.analysis.support_levels)?,
        serde_json::to_string(&stock.analysis.resistance_levels)?,
    ))
}

fn decode_levels(idx: usize, raw: &str) -> SqliteResult<Vec<f64>> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_stock_row(row: &rusqlite::Row) -> SqliteResult<StockRecord> {
    let support: String = row.get(6)?;
    let resistance: String = row.get(7)?;

    Ok(StockRecord {
        symbol: row.get(0)?,
        name: row.get(1)?,
        sector: row.get(2)?,
        analysis: StockAnalysis {
            current_price: row.get(3)?,
            week_52_high: row.get(4)?,
            week_52_low: row.get(5)?,
            support_levels: decode_levels(6, &support)?,
            resistance_levels: decode_levels(7, &resistance)?,
            rsi: row.get(8)?,
            volume: row.get(9)?,
            pe_ratio: row.get(10)?,
            dividend_yield: row.get(11)?,
            last_updated: row.get(12)?,
        },
    })
}

const UPSERT_STOCK_SQL: &str = r#"
    INSERT OR REPLACE INTO stocks
    (symbol, name, sector, current_price, week_52_high, week_52_low,
     support_levels, resistance_levels, rsi, volume, pe_ratio, dividend_yield, last_updated)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
"#;

const SELECT_STOCK_SQL: &str = r#"
    SELECT symbol, name, sector, current_price, week_52_high, week_52_low,
           support_levels, resistance_levels, rsi, volume, pe_ratio, dividend_yield, last_updated
    FROM stocks
"#;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    email TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS stocks (
    symbol TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sector TEXT NOT NULL,
    current_price REAL NOT NULL,
    week_52_high REAL NOT NULL,
    week_52_low REAL NOT NULL,
    -- JSON arrays
    support_levels TEXT NOT NULL DEFAULT '[]',
    resistance_levels TEXT NOT NULL DEFAULT '[]',
    rsi REAL NOT NULL,
    volume INTEGER NOT NULL,
    pe_ratio REAL NOT NULL,
    dividend_yield REAL NOT NULL,
    last_updated TEXT NOT NULL
);
"#;
