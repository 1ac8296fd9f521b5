//! Engine configuration loaded from environment variables.

use std::time::Duration;

/// Tunables for the generation engine.
///
/// All fields have defaults suitable for local development. In
/// production, override via environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Artifact retention window, measured from job completion
    /// (default: 24 hours). `expires_at = completed_at + retention`.
    pub retention: chrono::Duration,
    /// Overall deadline for one generation job (default: 30 minutes).
    /// A pipeline still running at the deadline is forced to `FAILED`.
    pub job_timeout: Duration,
    /// Cadence of the background expiry sweep (default: 1 hour).
    pub sweep_interval: Duration,
}

/// Default retention window in hours.
const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Default overall job deadline in seconds.
const DEFAULT_JOB_TIMEOUT_SECS: u64 = 1800;

/// Default expiry sweep interval in seconds.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention: chrono::Duration::hours(DEFAULT_RETENTION_HOURS),
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `SITEWRIGHT_RETENTION_HOURS`     | `24`    |
    /// | `SITEWRIGHT_JOB_TIMEOUT_SECS`    | `1800`  |
    /// | `SITEWRIGHT_SWEEP_INTERVAL_SECS` | `3600`  |
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let retention_hours = env_parse("SITEWRIGHT_RETENTION_HOURS", DEFAULT_RETENTION_HOURS);
        let job_timeout_secs = env_parse("SITEWRIGHT_JOB_TIMEOUT_SECS", DEFAULT_JOB_TIMEOUT_SECS);
        let sweep_interval_secs =
            env_parse("SITEWRIGHT_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);

        Self {
            retention: chrono::Duration::hours(retention_hours),
            job_timeout: Duration::from_secs(job_timeout_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.retention, chrono::Duration::hours(24));
        assert_eq!(config.job_timeout, Duration::from_secs(1800));
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
    }
}
