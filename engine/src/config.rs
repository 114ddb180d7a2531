//! Engine configuration.

use splitsettle_common::Address;

/// Per-call input bounds.
///
/// Every operation is linear in its own input; these caps keep that input
/// bounded so that no single call can do unbounded work.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum members in a creation list.
    pub max_initial_members: usize,
    /// Maximum participants in one expense.
    pub max_participants_per_expense: usize,
    /// Maximum edges in one simplification.
    pub max_edges_per_simplification: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_initial_members: 1024,
            max_participants_per_expense: 1024,
            max_edges_per_simplification: 4096,
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address the engine uses as spender on the value ledger.
    ///
    /// Debtors approve this address before settling.
    pub engine_address: Address,
    /// Input bounds.
    pub limits: LimitsConfig,
    /// Capacity of the event broadcast buffer.
    pub event_capacity: usize,
    /// Log level.
    pub log_level: String,
}

/// Default spender address of the engine.
pub const DEFAULT_ENGINE_ADDRESS: Address = Address::new([
    0x5e, 0x77, 0x1e, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x01,
]);

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_address: DEFAULT_ENGINE_ADDRESS,
            limits: LimitsConfig::default(),
            event_capacity: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(address) = std::env::var("SPLITSETTLE_ENGINE_ADDRESS") {
            if let Ok(address) = address.parse() {
                config.engine_address = address;
            }
        }

        if let Ok(max) = std::env::var("SPLITSETTLE_MAX_PARTICIPANTS") {
            if let Ok(max) = max.parse() {
                config.limits.max_participants_per_expense = max;
                config.limits.max_initial_members = max;
            }
        }

        if let Ok(max) = std::env::var("SPLITSETTLE_MAX_EDGES") {
            if let Ok(max) = max.parse() {
                config.limits.max_edges_per_simplification = max;
            }
        }

        if let Ok(capacity) = std::env::var("SPLITSETTLE_EVENT_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.event_capacity = capacity;
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.limits.max_initial_members < 2 {
            return Err("Initial member limit must allow at least 2 members".to_string());
        }

        if self.limits.max_participants_per_expense == 0 {
            return Err("Participant limit cannot be 0".to_string());
        }

        if self.limits.max_edges_per_simplification == 0 {
            return Err("Edge limit cannot be 0".to_string());
        }

        if self.event_capacity == 0 {
            return Err("Event capacity cannot be 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.engine_address.to_string(),
            "0x5e771e0000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_invalid_config() {
        let mut config = EngineConfig::default();
        config.limits.max_initial_members = 1;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.event_capacity = 0;
        assert!(config.validate().is_err());
    }
}
