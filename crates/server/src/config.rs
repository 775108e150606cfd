//! Server configuration

use thiserror::Error;

use crate::ai::client::DEFAULT_MODEL;

/// Configuration problems detected at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ANTHROPIC_API_KEY is not set; the language model cannot be called without it")]
    MissingApiKey,

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub anthropic_api_key: String,
    pub model: String,
    pub model_max_tokens: u32,
    pub model_timeout_secs: u64,
    pub tesseract_path: String,
    /// PDFium shared library for rendering scanned PDFs; `None` searches system paths
    pub pdfium_library_path: Option<String>,
    pub ocr_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let rate_limit_rps = parse_var(&lookup, "RATE_LIMIT_RPS", 10u32)?;
        if rate_limit_rps == 0 {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_RPS",
                value: "0".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec!["*".to_string()]),
            rate_limit_rps,
            anthropic_api_key,
            model: lookup("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL.into()),
            model_max_tokens: parse_var(&lookup, "MODEL_MAX_TOKENS", 4096)?,
            model_timeout_secs: parse_var(&lookup, "MODEL_TIMEOUT_SECS", 60)?,
            tesseract_path: lookup("TESSERACT_PATH").unwrap_or_else(|| "tesseract".into()),
            pdfium_library_path: lookup("PDFIUM_LIBRARY_PATH").filter(|p| !p.trim().is_empty()),
            ocr_timeout_secs: parse_var(&lookup, "OCR_TIMEOUT_SECS", 120)?,
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn missing_api_key_is_an_error() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::MissingApiKey);
        assert_eq!(
            load(&[("ANTHROPIC_API_KEY", "   ")]).unwrap_err(),
            ConfigError::MissingApiKey
        );
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.anthropic_api_key, "sk-test");
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.rate_limit_rps, 10);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.model_timeout_secs, 60);
        assert_eq!(config.tesseract_path, "tesseract");
        assert_eq!(config.pdfium_library_path, None);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn overrides_apply() {
        let config = load(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("MODEL_ID", "claude-haiku"),
            ("MODEL_TIMEOUT_SECS", "15"),
            ("RATE_LIMIT_RPS", "100"),
            ("PDFIUM_LIBRARY_PATH", "/opt/pdfium/lib/libpdfium.so"),
        ])
        .unwrap();

        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.model, "claude-haiku");
        assert_eq!(config.model_timeout_secs, 15);
        assert_eq!(config.rate_limit_rps, 100);
        assert_eq!(
            config.pdfium_library_path.as_deref(),
            Some("/opt/pdfium/lib/libpdfium.so")
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = load(&[("ANTHROPIC_API_KEY", "sk-test"), ("MODEL_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "MODEL_TIMEOUT_SECS", .. }));

        let err = load(&[("ANTHROPIC_API_KEY", "sk-test"), ("RATE_LIMIT_RPS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "RATE_LIMIT_RPS", .. }));
    }
}
