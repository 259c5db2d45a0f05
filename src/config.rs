//! Router configuration.
//!
//! [`RouterConfig`] is built with chained setters or deserialized (it is
//! `serde` friendly, missing fields fall back to their defaults).
//!
//! ```
//! use page_router::RouterConfig;
//! use std::time::Duration;
//!
//! let config = RouterConfig::default()
//!     .context_depth(4)
//!     .pop_bind_delay(Duration::ZERO);
//! assert_eq!(config.context_depth, 4);
//!
//! let config = RouterConfig::from_json(r#"{ "pop_bind_delay_ms": 250 }"#).unwrap();
//! assert_eq!(config.pop_bind_duration(), Duration::from_millis(250));
//! assert_eq!(config.context_depth, RouterConfig::DEFAULT_CONTEXT_DEPTH);
//! ```

use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of one [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// How many contexts the router keeps alive, the current one included.
    /// [`Context::previous`](crate::Context::previous) resolves only within
    /// this window. Values below 1 are treated as 1.
    pub context_depth: usize,

    /// Milliseconds after construction during which history pop events are
    /// ignored. Some browsers fire a pop event while the page loads; zero
    /// reacts to every pop.
    pub pop_bind_delay_ms: u64,

    /// Capacity of the compiled pattern cache (feature `cache`).
    pub matcher_cache_capacity: usize,
}

impl RouterConfig {
    pub const DEFAULT_CONTEXT_DEPTH: usize = 8;
    pub const DEFAULT_POP_BIND_DELAY_MS: u64 = 1000;
    pub const DEFAULT_MATCHER_CACHE_CAPACITY: usize = 256;

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RouterError> {
        serde_json::from_str(json).map_err(|err| RouterError::InvalidConfig {
            reason: err.to_string(),
        })
    }

    /// Set how many contexts stay reachable.
    pub fn context_depth(mut self, depth: usize) -> Self {
        self.context_depth = depth;
        self
    }

    /// Set the pop binding delay.
    pub fn pop_bind_delay(mut self, delay: Duration) -> Self {
        self.pop_bind_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the compiled pattern cache capacity.
    pub fn matcher_cache_capacity(mut self, capacity: usize) -> Self {
        self.matcher_cache_capacity = capacity;
        self
    }

    /// Context window size, never below 1.
    pub fn retained_contexts(&self) -> usize {
        self.context_depth.max(1)
    }

    /// The pop binding delay as a [`Duration`].
    pub fn pop_bind_duration(&self) -> Duration {
        Duration::from_millis(self.pop_bind_delay_ms)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            context_depth: Self::DEFAULT_CONTEXT_DEPTH,
            pop_bind_delay_ms: Self::DEFAULT_POP_BIND_DELAY_MS,
            matcher_cache_capacity: Self::DEFAULT_MATCHER_CACHE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.context_depth, 8);
        assert_eq!(config.pop_bind_duration(), Duration::from_secs(1));
        assert_eq!(config.matcher_cache_capacity, 256);
    }

    #[test]
    fn test_retained_contexts_floor() {
        assert_eq!(RouterConfig::default().context_depth(0).retained_contexts(), 1);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = RouterConfig::from_json("{ \"context_depth\": \"many\" }").unwrap_err();
        assert!(matches!(err, RouterError::InvalidConfig { .. }));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = RouterConfig::default().context_depth(3);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(RouterConfig::from_json(&json).unwrap(), config);
    }
}
