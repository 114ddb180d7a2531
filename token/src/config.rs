//! Trust token configuration.

/// Configuration of the in-memory trust token.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Token units credited per deposited unit.
    pub mint_rate: u128,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "TrustToken".to_string(),
            symbol: "TRST".to_string(),
            mint_rate: 1,
        }
    }
}

impl TokenConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rate) = std::env::var("TOKEN_MINT_RATE") {
            if let Ok(rate) = rate.parse() {
                config.mint_rate = rate;
            }
        }

        if let Ok(symbol) = std::env::var("TOKEN_SYMBOL") {
            config.symbol = symbol;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.mint_rate == 0 {
            return Err("Mint rate cannot be 0".to_string());
        }

        if self.symbol.is_empty() {
            return Err("Token symbol cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TokenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.symbol, "TRST");
    }

    #[test]
    fn test_invalid_config() {
        let mut config = TokenConfig::default();
        config.mint_rate = 0;
        assert!(config.validate().is_err());
    }
}
