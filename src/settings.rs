use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

use crate::crawler::{CrawlOptions, RetryPolicy};
use crate::parser::extract::DateZone;

/// Runtime settings: built-in defaults overlaid by `ASC_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub output: PathBuf,
    pub page_size: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
    pub date_zone: DateZone,
    pub tunnel_enabled: bool,
    pub tunnel_location: String,
    pub tunnel_settle_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_builder(Config::builder().add_source(
            Environment::with_prefix("ASC").try_parsing(true),
        ))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .set_default("output", "data/asc_ca.xlsx")?
            .set_default("page_size", 10)?
            .set_default("max_retries", 2)?
            .set_default("retry_backoff_ms", 2000)?
            .set_default("request_timeout_secs", 30)?
            .set_default("date_zone", "local")?
            .set_default("tunnel_enabled", true)?
            .set_default("tunnel_location", "canada")?
            .set_default("tunnel_settle_secs", 10)?
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            page_size: self.page_size.max(1),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_backoff: Duration::from_millis(self.retry_backoff_ms),
            },
            max_pages: None,
            date_zone: self.date_zone,
            show_progress: true,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tunnel_settle(&self) -> Duration {
        Duration::from_secs(self.tunnel_settle_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::from_builder(Config::builder()).unwrap();
        assert_eq!(s.output, PathBuf::from("data/asc_ca.xlsx"));
        assert_eq!(s.page_size, 10);
        assert_eq!(s.max_retries, 2);
        assert_eq!(s.date_zone, DateZone::Local);
        assert!(s.tunnel_enabled);
        assert_eq!(s.tunnel_settle(), Duration::from_secs(10));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let builder = Config::builder()
            .set_override("max_retries", 0)
            .unwrap()
            .set_override("date_zone", "utc")
            .unwrap()
            .set_override("tunnel_enabled", false)
            .unwrap();
        let s = Settings::from_builder(builder).unwrap();
        assert_eq!(s.max_retries, 0);
        assert_eq!(s.date_zone, DateZone::Utc);
        assert!(!s.tunnel_enabled);
    }

    #[test]
    fn crawl_options_follow_settings() {
        let s = Settings::from_builder(Config::builder()).unwrap();
        let opts = s.crawl_options();
        assert_eq!(opts.page_size, 10);
        assert_eq!(opts.retry.max_retries, 2);
        assert_eq!(opts.retry.base_backoff, Duration::from_millis(2000));
    }
}
