//! Runtime settings
//!
//! The only secret is the Gemini API key. It is read from a TOML secrets file
//! (`GEMINI_API_KEY = "..."`), falling back to the `GEMINI_API_KEY` environment
//! variable. Everything else comes from the environment with defaults.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::gemini::DEFAULT_MODEL;
use crate::session::DEFAULT_IDLE_TIMEOUT;

pub const DEFAULT_SECRETS_FILE: &str = ".psx/secrets.toml";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const API_KEY_NAME: &str = "GEMINI_API_KEY";

#[derive(Debug, Deserialize)]
struct SecretsFile {
    #[serde(rename = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub model: String,
    pub secrets_file: PathBuf,
    pub session_idle_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            model: DEFAULT_MODEL.to_string(),
            secrets_file: PathBuf::from(DEFAULT_SECRETS_FILE),
            session_idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl Settings {
    /// Read `PSX_BIND_ADDR`, `PSX_GEMINI_MODEL`, `PSX_SECRETS_FILE` and
    /// `PSX_SESSION_IDLE_MINUTES`. Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("PSX_BIND_ADDR").unwrap_or(defaults.bind_addr),
            model: env::var("PSX_GEMINI_MODEL").unwrap_or(defaults.model),
            secrets_file: env::var("PSX_SECRETS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_file),
            session_idle_timeout: env::var("PSX_SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|m| m.trim().parse::<u64>().ok())
                .filter(|m| *m > 0)
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(defaults.session_idle_timeout),
        }
    }

    /// API key from the secrets file, else from the environment
    pub fn api_key(&self) -> Result<String> {
        if self.secrets_file.exists() {
            if let Some(key) = read_secrets_file(&self.secrets_file)? {
                return Ok(key);
            }
        }

        env::var(API_KEY_NAME)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                DashboardError::Config(format!(
                    "{} not found in {} or the environment",
                    API_KEY_NAME,
                    self.secrets_file.display()
                ))
            })
    }
}

/// Parse the secrets file. A file without the key yields `None`.
pub fn read_secrets_file(path: &Path) -> Result<Option<String>> {
    let text = std::fs::read_to_string(path)?;
    parse_secrets(&text)
}

fn parse_secrets(text: &str) -> Result<Option<String>> {
    let secrets: SecretsFile = toml::from_str(text)
        .map_err(|e| DashboardError::Config(format!("invalid secrets file: {}", e)))?;
    Ok(secrets.gemini_api_key.filter(|k| !k.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secrets() {
        let key = parse_secrets("GEMINI_API_KEY = \"abc123\"\n").unwrap();
        assert_eq!(key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_secrets_without_key() {
        assert_eq!(parse_secrets("OTHER = \"x\"\n").unwrap(), None);
        assert_eq!(parse_secrets("GEMINI_API_KEY = \"  \"\n").unwrap(), None);
    }

    #[test]
    fn test_parse_secrets_invalid_toml() {
        let err = parse_secrets("GEMINI_API_KEY = ").unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn test_read_secrets_file() {
        let path = env::temp_dir().join(format!("psx-secrets-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "GEMINI_API_KEY = \"from-file\"\n").unwrap();

        let settings = Settings {
            secrets_file: path.clone(),
            ..Settings::default()
        };
        assert_eq!(settings.api_key().unwrap(), "from-file");

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr, "127.0.0.1:8501");
        assert_eq!(settings.model, "gemini-1.5-pro");
        assert_eq!(settings.session_idle_timeout, Duration::from_secs(1800));
    }
}
