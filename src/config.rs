// 9.0 config.rs: all settings in one place. market, liquidation policy, engine.
// loadable from JSON; presets per environment. validate() before building an engine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::EngineConfig;
use crate::liquidation::LiquidationParams;
use crate::market::MarketConfig;
use crate::types::Address;

// The complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub market: MarketConfig,
    pub liquidation: LiquidationParams,
}

impl Config {
    // Shallow pool so test traders see visible price impact
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.market.name = "vETH-USDC Testnet".to_string();
        config.market.initial_base_reserve = dec!(100);
        config.market.initial_quote_reserve = dec!(200_000);
        config.engine.verbose = true;
        config
    }

    // Deeper pool, tighter leverage cap
    pub fn mainnet_conservative() -> Self {
        let mut config = Self::default();
        config.market.initial_base_reserve = dec!(10_000);
        config.market.initial_quote_reserve = dec!(20_000_000);
        config.market.leverage.max = 5;
        config
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        // market checks
        if self.market.initial_base_reserve <= Decimal::ZERO
            || self.market.initial_quote_reserve <= Decimal::ZERO
        {
            return Err(ConfigError::InvalidMarket {
                reason: "Initial reserves must be positive".to_string(),
            });
        }

        if self.market.scale.cross_exponent().is_err() {
            return Err(ConfigError::InvalidMarket {
                reason: "Decimal scales cannot be combined into a u128 factor".to_string(),
            });
        }

        let market = self.market.build_market().map_err(|e| ConfigError::InvalidMarket {
            reason: e.to_string(),
        })?;
        if market.current_price().map(|p| p.raw() == 0).unwrap_or(true) {
            return Err(ConfigError::InvalidMarket {
                reason: "Initial reserves price to zero".to_string(),
            });
        }

        // leverage checks
        let bounds = self.market.leverage;
        if bounds.min == 0 || bounds.min > bounds.max {
            return Err(ConfigError::InvalidLeverage {
                reason: format!("Bounds {}..={} must start at 1 or above", bounds.min, bounds.max),
            });
        }

        // liquidation checks
        let liq = self.liquidation;
        if liq.threshold_pct == 0 || liq.threshold_pct > 100 {
            return Err(ConfigError::InvalidLiquidation {
                reason: "Threshold must be within 1..=100 percent of margin".to_string(),
            });
        }
        if liq.reward_pct >= liq.threshold_pct {
            return Err(ConfigError::InvalidLiquidation {
                reason: "Reward must be below the liquidation threshold".to_string(),
            });
        }

        // engine checks
        if self.engine.max_events == 0 {
            return Err(ConfigError::InvalidEngine {
                reason: "Event buffer needs room for at least one event".to_string(),
            });
        }
        if self.engine.engine_account == Address::ZERO {
            return Err(ConfigError::InvalidEngine {
                reason: "Engine account cannot be the zero address".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid market config: {reason}")]
    InvalidMarket { reason: String },

    #[error("invalid leverage config: {reason}")]
    InvalidLeverage { reason: String },

    #[error("invalid liquidation config: {reason}")]
    InvalidLiquidation { reason: String },

    #[error("invalid engine config: {reason}")]
    InvalidEngine { reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to read config {path}: {reason}")]
    Io { path: String, reason: String },
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> Config {
        match self {
            Environment::Development => Config::default(),
            Environment::Testnet => Config::testnet(),
            Environment::Mainnet => Config::mainnet_conservative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.liquidation.threshold_pct, 80);
        assert_eq!(config.liquidation.reward_pct, 5);
    }

    #[test]
    fn test_environment_presets() {
        assert!(Environment::Development.config().validate().is_ok());
        assert!(Environment::Testnet.config().validate().is_ok());
        assert!(Environment::Mainnet.config().validate().is_ok());
        assert_eq!(Environment::Mainnet.config().market.leverage.max, 5);
    }

    #[test]
    fn test_invalid_reserves() {
        let mut config = Config::default();
        config.market.initial_base_reserve = Decimal::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMarket { .. })
        ));
    }

    #[test]
    fn test_invalid_leverage_bounds() {
        let mut config = Config::default();
        config.market.leverage.min = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLeverage { .. })
        ));

        config.market.leverage.min = 6;
        config.market.leverage.max = 5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLeverage { .. })
        ));
    }

    #[test]
    fn test_invalid_liquidation() {
        let mut config = Config::default();
        config.liquidation.reward_pct = 90;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLiquidation { .. })
        ));

        config.liquidation.reward_pct = 5;
        config.liquidation.threshold_pct = 101;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLiquidation { .. })
        ));
    }

    #[test]
    fn test_zero_engine_account_rejected() {
        let mut config = Config::default();
        config.engine.engine_account = Address::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEngine { .. })
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::testnet();
        let json = serde_json::to_string(&config).unwrap();
        let back = Config::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_parse_error_reported() {
        let result = Config::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_oversized_decimals_rejected_on_load() {
        let mut config = Config::default();
        config.market.scale.price_decimals = u32::MAX;
        let json = serde_json::to_string(&config).unwrap();

        let result = Config::from_json_str(&json);
        assert!(matches!(result, Err(ConfigError::InvalidMarket { .. })));
    }

    #[test]
    fn test_missing_file_reported() {
        let result = Config::from_path("/nonexistent/vamm-config.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
