//! Prompt template for the PSX analysis request

use serde_json::{json, Value};

use crate::models::AnalysisType;

/// The fixed configuration block embedded in every analysis prompt
pub fn mcp_configuration(company_symbol: &str, analysis_type: AnalysisType) -> Value {
    let labels: Vec<&str> = AnalysisType::ALL.iter().map(|t| t.label()).collect();

    let mut expected_output = serde_json::Map::new();
    for t in AnalysisType::ALL {
        expected_output.insert(t.label().to_string(), json!({ "sections": t.sections() }));
    }

    json!({
        "mcp_configuration": {
            "description": "Configuration for requesting a streamlined price and volume analysis of a PSX stock, providing support/resistance and price movement forecasts.",
            "instructions_for_user": format!(
                "Please fill in the 'company_symbol' with the PSX ticker (e.g., 'LUCK', 'TRG'). For 'analysis_type', choose one of the following: {}.",
                labels.iter().map(|l| format!("'{}'", l)).collect::<Vec<_>>().join(", ")
            ),

            "user_input": {
                "company_symbol": company_symbol,
                "analysis_type": analysis_type.label()
            },

            "default_analysis_parameters": {
                "data_fetch": {
                    "historical_periods_available": ["1_month", "6_months", "1_year"],
                    "default_period_for_analysis": "1_year",
                    "interval": "daily"
                },
                "technical_indicators": {
                    "moving_averages": {
                        "enable": true,
                        "types": ["SMA", "EMA"],
                        "periods": [10, 20, 50, 200]
                    },
                    "rsi": {
                        "enable": true,
                        "period": 14,
                        "overbought_level": 70,
                        "oversold_level": 30
                    },
                    "macd": {
                        "enable": true,
                        "fast_period": 12,
                        "slow_period": 26,
                        "signal_period": 9
                    },
                    "bollinger_bands": {
                        "enable": true,
                        "period": 20,
                        "std_dev_multiplier": 2
                    },
                    "volume_indicators": {
                        "enable": true,
                        "obv": true,
                        "chaikin_oscillator": true
                    }
                },
                "chart_patterns_detection": {
                    "enable": true,
                    "candlestick_patterns": true,
                    "major_chart_patterns": true
                },
                "support_resistance_analysis": {
                    "enable": true,
                    "method": "pivot_points_and_historical_levels"
                },
                "volatility_assessment": {
                    "enable": true,
                    "method": "atr",
                    "atr_period": 14
                }
            },

            "expected_output_structure_based_on_type": expected_output,

            "output_preferences": {
                "report_format": "Structured Text",
                "include_disclaimer": true
            }
        }
    })
}

/// Build the full prompt. The symbol is forwarded verbatim.
pub fn build_prompt(company_symbol: &str, analysis_type: AnalysisType) -> String {
    let config = mcp_configuration(company_symbol, analysis_type);
    // Pretty printing a Value cannot fail
    let config_text = serde_json::to_string_pretty(&config).unwrap_or_else(|_| config.to_string());

    format!(
        "\nYou are a financial analyst specializing in the Pakistan Stock Exchange (PSX).\n\
         Please perform a {} on the stock with the ticker symbol '{}'.\n\
         \n\
         Your analysis should strictly adhere to the following configuration:\n\
         {}\n\
         \n\
         Provide a detailed report in a structured text format based on the above configuration.\n",
        analysis_type.label(),
        company_symbol,
        config_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = build_prompt("LUCK", AnalysisType::PriceForecast);
        assert!(prompt.contains("Please perform a Price Forecast Only on the stock with the ticker symbol 'LUCK'."));
        assert!(prompt.contains("\"company_symbol\": \"LUCK\""));
        assert!(prompt.contains("\"analysis_type\": \"Price Forecast Only\""));
        assert!(prompt.trim_end().ends_with("based on the above configuration."));
    }

    #[test]
    fn test_config_is_pretty_with_two_space_indent() {
        let prompt = build_prompt("TRG", AnalysisType::All);
        assert!(prompt.contains("{\n  \"mcp_configuration\": {\n    \"description\""));
    }

    #[test]
    fn test_config_key_order_preserved() {
        let prompt = build_prompt("TRG", AnalysisType::All);
        let user_input = prompt.find("\"user_input\"").unwrap();
        let defaults = prompt.find("\"default_analysis_parameters\"").unwrap();
        let prefs = prompt.find("\"output_preferences\"").unwrap();
        assert!(user_input < defaults && defaults < prefs);
    }

    #[test]
    fn test_expected_sections_per_type() {
        let config = mcp_configuration("HBL", AnalysisType::All);
        let sections = &config["mcp_configuration"]["expected_output_structure_based_on_type"]
            ["Support & Resistance Only"]["sections"];
        assert_eq!(sections.as_array().unwrap().len(), 3);
        assert_eq!(
            config["mcp_configuration"]["default_analysis_parameters"]["volatility_assessment"]["atr_period"],
            14
        );
    }

    #[test]
    fn test_symbol_forwarded_verbatim() {
        let prompt = build_prompt("not a ticker ?!", AnalysisType::All);
        assert!(prompt.contains("'not a ticker ?!'"));
    }
}
