//! Limiter configuration structures.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, LimiterError, LimiterOptions};

/// Environment variable holding the concurrency cap.
pub const ENV_LIMIT: &str = "LIMITER_LIMIT";
/// Legacy environment variable for the concurrency cap.
pub const ENV_CONCURRENCY: &str = "LIMITER_CONCURRENCY";
/// Environment variable holding the bail-on-error flag.
pub const ENV_BAIL_ON_ERROR: &str = "LIMITER_BAIL_ON_ERROR";

const fn default_bail_on_error() -> bool {
    true
}

/// Serializable limiter configuration.
///
/// `concurrency` is the older name for `limit`; when set it overrides `limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum concurrent task invocations; absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Legacy alias for `limit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    /// Halt on the first task failure.
    #[serde(default = "default_bail_on_error")]
    pub bail_on_error: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            limit: None,
            concurrency: None,
            bail_on_error: default_bail_on_error(),
        }
    }
}

impl LimiterConfig {
    /// Effective concurrency cap after applying the legacy alias.
    pub fn effective_limit(&self) -> Option<usize> {
        self.concurrency.or(self.limit)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == Some(0) {
            return Err("limit must be greater than 0".into());
        }
        if self.concurrency == Some(0) {
            return Err("concurrency must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse limiter configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `LIMITER_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, LimiterError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LimiterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_count = |name: &str| -> Result<Option<usize>, LimiterError> {
            lookup(name)
                .map(|raw| {
                    raw.trim()
                        .parse::<usize>()
                        .map_err(|e| LimiterError::Config(format!("{name}: {e}")))
                })
                .transpose()
        };

        let bail_on_error = match lookup(ENV_BAIL_ON_ERROR) {
            None => default_bail_on_error(),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(LimiterError::Config(format!(
                        "{ENV_BAIL_ON_ERROR}: expected a boolean, got `{other}`"
                    )))
                }
            },
        };

        let cfg = Self {
            limit: parse_count(ENV_LIMIT)?,
            concurrency: parse_count(ENV_CONCURRENCY)?,
            bail_on_error,
        };
        cfg.validate().map_err(LimiterError::Config)?;
        Ok(cfg)
    }
}

impl TryFrom<&LimiterConfig> for LimiterOptions {
    type Error = LimiterError;

    fn try_from(cfg: &LimiterConfig) -> Result<Self, Self::Error> {
        cfg.validate().map_err(LimiterError::Config)?;
        Ok(Self {
            limit: cfg.effective_limit(),
            bail_on_error: cfg.bail_on_error,
        })
    }
}

/// Load options from the environment, with context for application callers.
pub fn load_from_env() -> AppResult<LimiterOptions> {
    let cfg = LimiterConfig::from_env().context("loading limiter configuration from environment")?;
    let options = LimiterOptions::try_from(&cfg)?;
    tracing::debug!(
        limit = ?options.limit,
        bail_on_error = options.bail_on_error,
        "loaded limiter options"
    );
    Ok(options)
}
