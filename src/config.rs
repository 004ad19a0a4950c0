//! Configuration types.

use std::net::SocketAddr;
use std::ops::Range;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::scheduler::DecompositionMode;

/// Default simulated cost range per task, in milliseconds.
pub const DEFAULT_COST_MIN_MS: u64 = 1000;
pub const DEFAULT_COST_MAX_MS: u64 = 6000;

/// Orchestrator (scheduler + HTTP API) configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Simulated per-task cost in milliseconds (upper bound exclusive).
    pub cost_range_ms: Range<u64>,
    /// Decomposition mode used when a request does not pick one.
    pub default_mode: DecompositionMode,
    /// Lease duration for dequeued tasks. `None` disables lease recovery.
    pub lease_timeout: Option<Duration>,
    /// How often expired leases are swept back into the queue.
    pub lease_sweep_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            cost_range_ms: DEFAULT_COST_MIN_MS..DEFAULT_COST_MAX_MS,
            default_mode: DecompositionMode::Pairwise,
            lease_timeout: None,
            lease_sweep_interval: Duration::from_secs(5),
        }
    }
}

impl OrchestratorConfig {
    /// Build from `ARITH_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("ARITH_BIND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.bind_addr);

        let cost_min: u64 = env_parse("ARITH_COST_MIN_MS").unwrap_or(DEFAULT_COST_MIN_MS);
        let cost_max: u64 = env_parse("ARITH_COST_MAX_MS").unwrap_or(DEFAULT_COST_MAX_MS);
        let cost_range_ms = if cost_min <= cost_max {
            cost_min..cost_max
        } else {
            warn!(
                min = cost_min,
                max = cost_max,
                "Invalid simulated cost range, using defaults"
            );
            defaults.cost_range_ms
        };

        let default_mode = match std::env::var("ARITH_DECOMPOSITION") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring ARITH_DECOMPOSITION");
                defaults.default_mode
            }),
            Err(_) => defaults.default_mode,
        };

        let lease_timeout = env_parse::<u64>("ARITH_LEASE_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let lease_sweep_interval = env_parse::<u64>("ARITH_LEASE_SWEEP_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.lease_sweep_interval);

        Self {
            bind_addr,
            cost_range_ms,
            default_mode,
            lease_timeout,
            lease_sweep_interval,
        }
    }
}

/// Worker agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the orchestrator, e.g. `http://localhost:8081`.
    pub orchestrator_url: String,
    /// Number of independent worker loops in this process.
    pub computing_power: usize,
    /// Delay before retrying after an empty queue or a transport error.
    pub backoff: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:8081".to_string(),
            computing_power: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

impl AgentConfig {
    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let orchestrator_url = std::env::var("ARITH_ORCHESTRATOR_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.orchestrator_url);

        let computing_power = env_parse::<usize>("COMPUTING_POWER")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.computing_power);

        let backoff = env_parse::<u64>("ARITH_BACKOFF_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.backoff);

        Self {
            orchestrator_url,
            computing_power,
            backoff,
        }
    }

    /// Reject values the worker loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.orchestrator_url.starts_with("http://")
            || self.orchestrator_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                key: "ARITH_ORCHESTRATOR_URL".into(),
                message: format!("expected an http(s) URL, got {:?}", self.orchestrator_url),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
