//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the evaluation engine. Missing fields take their defaults when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of unpinned entries in the result cache.
    pub result_cache_capacity: usize,
    /// Maximum size in bytes of an in-memory id vector literal.
    pub id_vector_memory_limit: usize,
    /// Rows processed between two polls of the cancellation handle.
    pub cancellation_check_interval: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            result_cache_capacity: 1000,
            id_vector_memory_limit: 64 * 1024 * 1024,
            cancellation_check_interval: 1 << 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.result_cache_capacity, 1000);
        assert!(config.cancellation_check_interval > 0);
        assert!(config.id_vector_memory_limit > 0);
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig {
            result_cache_capacity: 10,
            id_vector_memory_limit: 4096,
            cancellation_check_interval: 128,
        };
        let bytes = bincode::serialize(&config).unwrap();
        let decoded: EngineConfig = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "result_cache_capacity": 5 }"#).unwrap();
        assert_eq!(config.result_cache_capacity, 5);
        assert_eq!(
            config.id_vector_memory_limit,
            EngineConfig::default().id_vector_memory_limit
        );
        assert_eq!(
            config.cancellation_check_interval,
            EngineConfig::default().cancellation_check_interval
        );

        let empty: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, EngineConfig::default());
    }
}
