//! Session tuning knobs

use std::time::Duration;

use anyhow::{Context, Result};

pub const CLOCK_REFRESH_ENV: &str = "TANDEM_CLOCK_REFRESH_MS";
pub const WRITE_ATTEMPTS_ENV: &str = "TANDEM_WRITE_ATTEMPTS";
pub const WRITE_BACKOFF_ENV: &str = "TANDEM_WRITE_BACKOFF_MS";

/// How often the clock offset is read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct ClockPolicy {
    pub refresh_interval: Duration,
}

impl Default for ClockPolicy {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(5),
        }
    }
}

/// Retry schedule for choice writes that fail transiently
#[derive(Debug, Clone, PartialEq)]
pub struct WritePolicy {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

impl WritePolicy {
    /// A policy that gives up after the first failure
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after `delay` failed
    pub(crate) fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    pub clock: ClockPolicy,
    pub write: WritePolicy,
}

impl SessionConfig {
    /// Defaults overridden by `TANDEM_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, CLOCK_REFRESH_ENV)? {
            if ms == 0 {
                anyhow::bail!("{} must be greater than zero", CLOCK_REFRESH_ENV);
            }
            config.clock.refresh_interval = Duration::from_millis(ms);
        }

        if let Some(attempts) = parse_var::<usize, _>(&lookup, WRITE_ATTEMPTS_ENV)? {
            if attempts == 0 {
                anyhow::bail!("{} must be at least 1", WRITE_ATTEMPTS_ENV);
            }
            config.write.max_attempts = attempts;
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, WRITE_BACKOFF_ENV)? {
            config.write.initial_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value {:?} for {}", raw, name))
        })
        .transpose()
}
