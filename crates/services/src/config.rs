use std::env;
use std::time::Duration;

use quiz_core::model::PassingThreshold;

use crate::error::ConfigError;

pub const DB_URL_VAR: &str = "TEACHCERT_DB_URL";
pub const GATEWAY_URL_VAR: &str = "TEACHCERT_GATEWAY_URL";
pub const API_TOKEN_VAR: &str = "TEACHCERT_API_TOKEN";
pub const PASSING_SCORE_VAR: &str = "TEACHCERT_PASSING_SCORE";
pub const HTTP_TIMEOUT_VAR: &str = "TEACHCERT_HTTP_TIMEOUT_SECS";

pub const DEFAULT_DB_URL: &str = "sqlite://dev.sqlite3";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how finished attempts are posted over HTTP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    #[must_use]
    pub fn submit_url(&self) -> String {
        format!("{}/quiz/submit", self.base_url.trim_end_matches('/'))
    }
}

/// Runtime settings for the quiz services.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizConfig {
    pub db_url: String,
    /// When absent, attempts are recorded against local storage.
    pub gateway: Option<GatewayConfig>,
    /// Overrides the threshold carried by each quiz's content.
    pub passing_threshold: Option<PassingThreshold>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.into(),
            gateway: None,
            passing_threshold: None,
        }
    }
}

impl QuizConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_url = match lookup(DB_URL_VAR) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::Empty { var: DB_URL_VAR });
            }
            Some(raw) => raw,
            None => DEFAULT_DB_URL.into(),
        };

        let passing_threshold = lookup(PASSING_SCORE_VAR)
            .map(|raw| parse_passing_score(&raw))
            .transpose()?;

        let timeout = match lookup(HTTP_TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    var: HTTP_TIMEOUT_VAR,
                    raw,
                })?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let gateway = lookup(GATEWAY_URL_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .map(|base_url| {
                if base_url.starts_with("http://") || base_url.starts_with("https://") {
                    Ok(GatewayConfig {
                        base_url,
                        api_token: lookup(API_TOKEN_VAR).filter(|t| !t.trim().is_empty()),
                        timeout,
                    })
                } else {
                    Err(ConfigError::Invalid {
                        var: GATEWAY_URL_VAR,
                        raw: base_url,
                    })
                }
            })
            .transpose()?;

        Ok(Self {
            db_url,
            gateway,
            passing_threshold,
        })
    }
}

/// Parse a passing score in percent, `0..=100`.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` for non-numeric or out-of-range input.
pub fn parse_passing_score(raw: &str) -> Result<PassingThreshold, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|v| PassingThreshold::new(v).ok())
        .ok_or_else(|| ConfigError::Invalid {
            var: PASSING_SCORE_VAR,
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<QuizConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        QuizConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_sqlite() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, QuizConfig::default());
        assert!(cfg.gateway.is_none());
    }

    #[test]
    fn gateway_picks_up_token_and_timeout() {
        let cfg = config(&[
            (GATEWAY_URL_VAR, "https://api.example.test/"),
            (API_TOKEN_VAR, "secret"),
            (HTTP_TIMEOUT_VAR, "3"),
            (PASSING_SCORE_VAR, "80"),
        ])
        .unwrap();
        let gateway = cfg.gateway.unwrap();
        assert_eq!(gateway.submit_url(), "https://api.example.test/quiz/submit");
        assert_eq!(gateway.api_token.as_deref(), Some("secret"));
        assert_eq!(gateway.timeout, Duration::from_secs(3));
        assert_eq!(cfg.passing_threshold.map(PassingThreshold::percent), Some(80.0));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            config(&[(PASSING_SCORE_VAR, "120")]),
            Err(ConfigError::Invalid { var: PASSING_SCORE_VAR, .. })
        ));
        assert!(matches!(
            config(&[(HTTP_TIMEOUT_VAR, "0")]),
            Err(ConfigError::Invalid { var: HTTP_TIMEOUT_VAR, .. })
        ));
        assert!(matches!(
            config(&[(GATEWAY_URL_VAR, "ftp://nope")]),
            Err(ConfigError::Invalid { var: GATEWAY_URL_VAR, .. })
        ));
        assert!(matches!(
            config(&[(DB_URL_VAR, "  ")]),
            Err(ConfigError::Empty { .. })
        ));
    }
}
