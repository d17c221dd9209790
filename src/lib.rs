//! PSX Dashboard
//!
//! Building blocks for a small Pakistan Stock Exchange dashboard:
//! - Prompt-driven analysis: a ticker and analysis type are templated into a
//!   prompt and sent to Google Gemini; the raw text comes back as the report
//! - Session-scoped stock records: every session gets its own in-memory SQLite
//!   store seeded with a few PSX stocks, behind a register/login gate
//! - CSV import/export of stock records and display views (metrics, a synthetic
//!   price line, support/resistance levels)
//!
//! # Example
//!
//! ```no_run
//! use psx_dashboard::{SessionContext, StockView};
//!
//! let mut session = SessionContext::new().unwrap();
//! session.register("ali@example.pk", "Ali", "secret").unwrap();
//! session.login("ali@example.pk", "secret").unwrap();
//!
//! let view: StockView = session.stock_view("LUCK").unwrap();
//! println!("{}: {}", view.symbol, view.metrics[0].value);
//! ```

pub mod analysis;
pub mod auth;
pub mod config;
pub mod csv_import;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod gemini;
pub mod models;
pub mod prompt;
pub mod seed;
pub mod session;

// Re-exports for convenience
pub use analysis::{run_analysis, AnalysisReport, AnalysisRequest};
pub use auth::{hash_password, verify_password};
pub use config::Settings;
pub use csv_import::{csv_template, export_csv, import_csv, parse_stock_csv};
pub use dashboard::{price_series, LevelsView, Metric, PricePoint, StockView};
pub use db::Database;
pub use error::{DashboardError, Result};
pub use gemini::{GeminiClient, TextGenerator};
pub use models::{AnalysisType, ImportResult, StockAnalysis, StockRecord, StockSummary, UserAccount};
pub use prompt::build_prompt;
pub use session::{SessionContext, SessionRegistry, SessionStatus};
