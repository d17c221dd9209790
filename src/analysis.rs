//! Prompt-driven stock analysis
//!
//! The ticker is not checked against any market data. Any non-blank string is
//! placed in the prompt and whatever the model returns is the report.

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::gemini::TextGenerator;
use crate::models::AnalysisType;
use crate::prompt::build_prompt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub company_symbol: String,
    #[serde(default)]
    pub analysis_type: AnalysisType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub analysis_type: AnalysisType,
    pub title: String,
    pub text: String,
    pub model: String,
}

/// Build the prompt and ask the generator for a report.
///
/// A blank symbol fails with [`DashboardError::EmptySymbol`] before any call is
/// made. Generator failures are reported as [`DashboardError::Api`].
pub async fn run_analysis<G: TextGenerator>(
    generator: &G,
    request: &AnalysisRequest,
) -> Result<AnalysisReport> {
    let symbol = request.company_symbol.trim();
    if symbol.is_empty() {
        return Err(DashboardError::EmptySymbol);
    }

    let prompt = build_prompt(symbol, request.analysis_type);
    log::info!(
        "Running {} for {} on {}",
        request.analysis_type.label(),
        symbol,
        generator.model()
    );

    let text = generator.generate(&prompt).await.map_err(|e| match e {
        DashboardError::Api(msg) => DashboardError::Api(msg),
        other => DashboardError::Api(other.to_string()),
    })?;

    Ok(AnalysisReport {
        symbol: symbol.to_string(),
        analysis_type: request.analysis_type,
        title: format!("Analysis for {}", symbol),
        text,
        model: generator.model().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockGenerator {
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
        fail: bool,
    }

    impl MockGenerator {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
                fail,
            }
        }
    }

    impl TextGenerator for MockGenerator {
        fn model(&self) -> &str {
            "mock"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            if self.fail {
                Err(DashboardError::InvalidInput("quota exceeded".into()))
            } else {
                Ok("Support at 850, resistance at 900.".into())
            }
        }
    }

    fn request(symbol: &str) -> AnalysisRequest {
        AnalysisRequest {
            company_symbol: symbol.to_string(),
            analysis_type: AnalysisType::SupportResistance,
        }
    }

    #[tokio::test]
    async fn test_empty_symbol_makes_no_call() {
        let generator = MockGenerator::new(false);
        for symbol in ["", "   "] {
            let err = run_analysis(&generator, &request(symbol)).await.unwrap_err();
            assert!(matches!(err, DashboardError::EmptySymbol));
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            DashboardError::EmptySymbol.to_string(),
            "Please enter a company symbol."
        );
    }

    #[tokio::test]
    async fn test_report_wraps_model_text() {
        let generator = MockGenerator::new(false);
        let report = run_analysis(&generator, &request("LUCK")).await.unwrap();

        assert_eq!(report.title, "Analysis for LUCK");
        assert_eq!(report.text, "Support at 850, resistance at 900.");
        assert_eq!(report.model, "mock");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Support & Resistance Only"));
        assert!(prompt.contains("'LUCK'"));
    }

    #[tokio::test]
    async fn test_generator_failure_becomes_api_error() {
        let generator = MockGenerator::new(true);
        let err = run_analysis(&generator, &request("TRG")).await.unwrap_err();
        assert!(matches!(err, DashboardError::Api(_)));
        assert!(err
            .to_string()
            .starts_with("An error occurred while generating the analysis:"));
    }
}
