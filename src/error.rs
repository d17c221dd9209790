//! Error types for the PSX dashboard

use thiserror::Error;

/// Every failure the dashboard can report to a user
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{0}")]
    Config(String),

    #[error("Failed to configure Gemini API: {reason}. Please ensure your API key is correctly saved in `{secrets_file}`.")]
    GeminiUnavailable {
        reason: String,
        secrets_file: String,
    },

    #[error("Email {0} is already registered")]
    AlreadyRegistered(String),

    #[error("Invalid email or password")]
    InvalidLogin,

    #[error("Please log in first")]
    NotAuthenticated,

    #[error("Please enter a company symbol.")]
    EmptySymbol,

    #[error("CSV is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Row {row}: invalid value for '{column}': {value}")]
    MalformedField {
        row: usize,
        column: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("An error occurred while generating the analysis: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl DashboardError {
    /// True for errors caused by what the user sent rather than by the server
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DashboardError::AlreadyRegistered(_)
                | DashboardError::InvalidLogin
                | DashboardError::NotAuthenticated
                | DashboardError::EmptySymbol
                | DashboardError::MissingColumns(_)
                | DashboardError::MalformedField { .. }
                | DashboardError::Csv(_)
                | DashboardError::NotFound(_)
                | DashboardError::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = DashboardError::MissingColumns(vec!["current_price".into(), "sector".into()]);
        assert_eq!(
            err.to_string(),
            "CSV is missing required column(s): current_price, sector"
        );
        assert!(err.is_user_error());
    }

    #[test]
    fn test_gemini_unavailable_message() {
        let err = DashboardError::GeminiUnavailable {
            reason: "GEMINI_API_KEY not found".into(),
            secrets_file: ".psx/secrets.toml".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to configure Gemini API: GEMINI_API_KEY not found. \
             Please ensure your API key is correctly saved in `.psx/secrets.toml`."
        );
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_api_error_is_server_side() {
        let err = DashboardError::Api("quota exceeded".into());
        assert!(!err.is_user_error());
        assert!(err.to_string().contains("quota exceeded"));
    }
}
