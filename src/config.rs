// Runtime configuration from environment variables
//
//   PORTAL_BIND        server listen address (default 0.0.0.0:3000)
//   PORTAL_TODAY       YYYY-MM-DD, pins the clock used for seeding and lookups
//   PORTAL_NEWS_LIMIT  number of news items shown (default 3)

use crate::clock::PortalClock;
use crate::db::DEFAULT_NEWS_LIMIT;
use crate::error::{PortalError, Result};
use chrono::NaiveDate;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub bind_addr: String,
    pub today: Option<NaiveDate>,
    pub news_limit: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            today: None,
            news_limit: DEFAULT_NEWS_LIMIT,
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PortalConfig::default();

        if let Some(addr) = non_empty(lookup("PORTAL_BIND")) {
            config.bind_addr = addr;
        }

        if let Some(today) = non_empty(lookup("PORTAL_TODAY")) {
            let date = NaiveDate::parse_from_str(&today, "%Y-%m-%d").map_err(|e| {
                PortalError::Config(format!("PORTAL_TODAY={:?} is not a date: {}", today, e))
            })?;
            config.today = Some(date);
        }

        if let Some(limit) = non_empty(lookup("PORTAL_NEWS_LIMIT")) {
            config.news_limit = limit.parse().map_err(|e| {
                PortalError::Config(format!("PORTAL_NEWS_LIMIT={:?}: {}", limit, e))
            })?;
        }

        Ok(config)
    }

    pub fn clock(&self) -> PortalClock {
        match self.today {
            Some(date) => PortalClock::Fixed(date),
            None => PortalClock::System,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<PortalConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PortalConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, PortalConfig::default());
        assert_eq!(config.clock(), PortalClock::System);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORTAL_BIND", "127.0.0.1:8080"),
            ("PORTAL_TODAY", "2025-08-20"),
            ("PORTAL_NEWS_LIMIT", "5"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.news_limit, 5);
        assert_eq!(
            config.clock(),
            PortalClock::Fixed(NaiveDate::from_ymd_opt(2025, 8, 20).unwrap())
        );
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("PORTAL_TODAY", "  "), ("PORTAL_BIND", "")]).unwrap();
        assert_eq!(config, PortalConfig::default());
    }

    #[test]
    fn test_malformed_values() {
        assert!(matches!(
            config_from(&[("PORTAL_TODAY", "20/08/2025")]),
            Err(PortalError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("PORTAL_NEWS_LIMIT", "three")]),
            Err(PortalError::Config(_))
        ));
    }
}
