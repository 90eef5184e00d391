//! Configuration loading and representation.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `ACM_LOG` (or `RUST_LOG`) | tracing filter directives | `info` |
//! | `ACM_LOG_FORMAT` | `json` or `pretty` | `json` |
//! | `ACM_RUN_DATE` | business date of the recurring run, `YYYY-MM-DD` | today |

use anyhow::{Context, Result};
use chrono::NaiveDate;

use acm_observability::{LogFormat, LogSettings};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AcmConfig {
    pub log: LogSettings,
    /// Overrides "today" for the recurring invoicing job.
    pub run_date: Option<NaiveDate>,
}

impl AcmConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the process environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(filter) = lookup("ACM_LOG").or_else(|| lookup("RUST_LOG")) {
            config.log.filter = filter;
        }
        if let Some(format) = lookup("ACM_LOG_FORMAT") {
            config.log.format = format
                .parse::<LogFormat>()
                .context("invalid ACM_LOG_FORMAT")?;
        }
        if let Some(raw) = lookup("ACM_RUN_DATE").filter(|v| !v.trim().is_empty()) {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("invalid ACM_RUN_DATE `{raw}` (expected YYYY-MM-DD)"))?;
            config.run_date = Some(date);
        }

        Ok(config)
    }

    pub fn run_date_or(&self, today: NaiveDate) -> NaiveDate {
        self.run_date.unwrap_or(today)
    }
}
