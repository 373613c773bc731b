use std::env;
use std::time::Duration;

use crate::fetch::RetryPolicy;

pub const DEFAULT_API_BASE: &str = "https://fantasy.premierleague.com/api";
pub const DEFAULT_MANAGER_ID: u32 = 132645;
pub const MAX_GAMEWEEKS: u8 = 38;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub manager_id: u32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            manager_id: DEFAULT_MANAGER_ID,
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Loads `.env.local` / `.env` if present, then reads `FPL_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_base = lookup("FPL_API_BASE")
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.api_base);
        let manager_id = parse_num::<u32>(&lookup, "FPL_MANAGER_ID")
            .filter(|id| *id > 0)
            .unwrap_or(defaults.manager_id);
        let timeout_secs = parse_num::<u64>(&lookup, "FPL_TIMEOUT_SECS")
            .unwrap_or(10)
            .clamp(1, 120);

        let base_retry = defaults.retry;
        let max_attempts = match parse_num::<u32>(&lookup, "FPL_RETRY_ATTEMPTS") {
            Some(0) => None,
            Some(n) => Some(n),
            None => base_retry.max_attempts,
        };
        let initial_delay = parse_num::<u64>(&lookup, "FPL_RETRY_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(base_retry.initial_delay);
        let max_delay = parse_num::<u64>(&lookup, "FPL_RETRY_MAX_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(base_retry.max_delay)
            .max(initial_delay);
        let max_elapsed = parse_num::<u64>(&lookup, "FPL_RETRY_DEADLINE_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            api_base,
            manager_id,
            request_timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_attempts,
                initial_delay,
                max_delay,
                max_elapsed,
            },
        }
    }
}

fn parse_num<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    lookup(key).and_then(|val| val.trim().parse::<T>().ok())
}
