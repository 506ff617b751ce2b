//! Bridge configuration.

use serde::{Deserialize, Serialize};

/// What a bounded input channel does when it is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backpressure {
    /// Drop the value and log a warning. `accept` never blocks.
    #[default]
    Reject,

    /// Block the calling thread until there is room or the bridge is torn
    /// down. Runtime worker threads are never blocked: called from inside a
    /// tokio runtime, a full channel rejects the value like `Reject`.
    Block,
}

/// Capacity of the input channel a bridge creates per connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelCapacity {
    /// Never blocks or rejects. Memory grows without limit if the
    /// transformation falls behind.
    #[default]
    Unbounded,

    /// Holds at most `capacity` pending inputs.
    Bounded {
        capacity: usize,
        #[serde(default)]
        backpressure: Backpressure,
    },
}

impl ChannelCapacity {
    pub fn bounded(capacity: usize) -> Self {
        ChannelCapacity::Bounded {
            capacity,
            backpressure: Backpressure::default(),
        }
    }
}

/// Serializable bridge settings.
///
/// # Example
///
/// ```rust
/// use mindflow::bridge::{Backpressure, BridgeConfig, ChannelCapacity};
///
/// let config: BridgeConfig = serde_json::from_str(
///     r#"{ "capacity": { "kind": "bounded", "capacity": 64, "backpressure": "block" } }"#,
/// )
/// .unwrap();
///
/// assert_eq!(
///     config.capacity,
///     ChannelCapacity::Bounded { capacity: 64, backpressure: Backpressure::Block }
/// );
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub capacity: ChannelCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        assert_eq!(BridgeConfig::default().capacity, ChannelCapacity::Unbounded);
    }

    #[test]
    fn bounded_defaults_to_reject() {
        assert_eq!(
            ChannelCapacity::bounded(8),
            ChannelCapacity::Bounded {
                capacity: 8,
                backpressure: Backpressure::Reject,
            }
        );
    }

    #[test]
    fn missing_capacity_deserializes_to_default() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn config_serializes_correctly() {
        let config = BridgeConfig {
            capacity: ChannelCapacity::bounded(16),
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: BridgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
