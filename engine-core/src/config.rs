use anyhow::anyhow;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

use crate::error::EngineError;

/// Engine configuration, loaded from the environment.
#[derive(Deserialize, Clone, Debug)]
pub struct EngineConfig {
    pub service_name: String,
    pub log_level: String,
    pub default_currency: String,
    pub invoice_number_prefix: String,
    pub payment_number_prefix: String,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, EngineError> {
        dotenv().ok();

        let service_name =
            env::var("ENGINE_SERVICE_NAME").unwrap_or_else(|_| "invoicing-engine".to_string());
        let log_level = env::var("ENGINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let default_currency =
            env::var("ENGINE_DEFAULT_CURRENCY").unwrap_or_else(|_| "USD".to_string());
        validate_currency(&default_currency)?;
        let invoice_number_prefix =
            env::var("ENGINE_INVOICE_NUMBER_PREFIX").unwrap_or_else(|_| "INV".to_string());
        let payment_number_prefix =
            env::var("ENGINE_PAYMENT_NUMBER_PREFIX").unwrap_or_else(|_| "RCT".to_string());

        Ok(Self {
            service_name,
            log_level,
            default_currency,
            invoice_number_prefix,
            payment_number_prefix,
        })
    }
}

fn validate_currency(code: &str) -> Result<(), EngineError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        return Ok(());
    }
    Err(EngineError::ConfigError(anyhow!(
        "default currency '{}' is not a three-letter ISO 4217 code",
        code
    )))
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_name: "invoicing-engine".to_string(),
            log_level: "info".to_string(),
            default_currency: "USD".to_string(),
            invoice_number_prefix: "INV".to_string(),
            payment_number_prefix: "RCT".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_code_must_be_three_uppercase_letters() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("EUR").is_ok());
        let lowercase = validate_currency("usd");
        assert!(matches!(lowercase, Err(EngineError::ConfigError(_))));
        let too_long = validate_currency("DOLLARS");
        assert!(matches!(too_long, Err(EngineError::ConfigError(_))));
    }
}
