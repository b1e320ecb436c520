//! Market configuration and open interest.
//!
//! A market is one synthetic pair backed by a [`VirtualMarket`]. The config
//! holds opening reserves in human units; they are converted to raw
//! fixed-point amounts through the market's [`Scale`] when the engine starts.

use crate::scale::{MathError, Scale};
use crate::types::{BaseAmount, Leverage, QuoteAmount, Side};
use crate::vamm::{MarketError, VirtualMarket};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Inclusive leverage range accepted by `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverageBounds {
    pub min: u8,
    pub max: u8,
}

impl Default for LeverageBounds {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

impl LeverageBounds {
    pub fn check(&self, leverage: u8) -> Option<Leverage> {
        (self.min..=self.max)
            .contains(&leverage)
            .then_some(Leverage(leverage))
    }
}

/// Static market configuration (immutable after creation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Human-readable name (e.g., "vETH-USDC")
    pub name: String,
    pub base_asset: String,
    pub quote_asset: String,
    /// Opening virtual base reserve, in whole base units
    pub initial_base_reserve: Decimal,
    /// Opening virtual quote reserve, in whole quote units
    pub initial_quote_reserve: Decimal,
    pub scale: Scale,
    pub leverage: LeverageBounds,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self::eth_usdc()
    }
}

impl MarketConfig {
    /// 1000 vETH against 2,000,000 USDC: opens at 2000 USDC per vETH
    pub fn eth_usdc() -> Self {
        Self {
            name: "vETH-USDC".to_string(),
            base_asset: "vETH".to_string(),
            quote_asset: "USDC".to_string(),
            initial_base_reserve: dec!(1000),
            initial_quote_reserve: dec!(2_000_000),
            scale: Scale::default(),
            leverage: LeverageBounds::default(),
        }
    }

    pub fn initial_reserves(&self) -> Result<(BaseAmount, QuoteAmount), MathError> {
        Ok((
            self.scale.base_from_decimal(self.initial_base_reserve)?,
            self.scale.quote_from_decimal(self.initial_quote_reserve)?,
        ))
    }

    pub fn build_market(&self) -> Result<VirtualMarket, MarketError> {
        let (base, quote) = self.initial_reserves()?;
        VirtualMarket::new(base, quote, self.scale)
    }
}

/// Total base exposure currently held against the pool, per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInterest {
    pub long: BaseAmount,
    pub short: BaseAmount,
}

impl OpenInterest {
    pub fn add(&mut self, side: Side, amount: BaseAmount) {
        let slot = self.slot(side);
        *slot = BaseAmount(slot.raw().saturating_add(amount.raw()));
    }

    // saturates at zero
    pub fn remove(&mut self, side: Side, amount: BaseAmount) {
        let slot = self.slot(side);
        *slot = BaseAmount(slot.raw().saturating_sub(amount.raw()));
    }

    /// Longs minus shorts. Positive means the pool is net short base.
    pub fn net(&self) -> i128 {
        let long = i128::try_from(self.long.raw()).unwrap_or(i128::MAX);
        let short = i128::try_from(self.short.raw()).unwrap_or(i128::MAX);
        long.saturating_sub(short)
    }

    fn slot(&mut self, side: Side) -> &mut BaseAmount {
        match side {
            Side::Long => &mut self.long,
            Side::Short => &mut self.short,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    #[test]
    fn eth_usdc_defaults() {
        let config = MarketConfig::eth_usdc();
        assert_eq!(config.name, "vETH-USDC");
        assert_eq!(config.leverage, LeverageBounds { min: 1, max: 10 });

        let (base, quote) = config.initial_reserves().unwrap();
        assert_eq!(base, BaseAmount(1_000 * 10u128.pow(18)));
        assert_eq!(quote, QuoteAmount(2_000_000 * 10u128.pow(6)));
    }

    #[test]
    fn build_market_opens_at_configured_price() {
        let market = MarketConfig::eth_usdc().build_market().unwrap();
        assert_eq!(market.current_price().unwrap(), Price(2_000 * 10u128.pow(18)));
    }

    #[test]
    fn zero_reserve_fails_to_build() {
        let mut config = MarketConfig::eth_usdc();
        config.initial_quote_reserve = Decimal::ZERO;
        assert_eq!(config.build_market().unwrap_err(), MarketError::EmptyReserves);
    }

    #[test]
    fn leverage_bounds_inclusive() {
        let bounds = LeverageBounds::default();
        assert_eq!(bounds.check(0), None);
        assert_eq!(bounds.check(1), Some(Leverage(1)));
        assert_eq!(bounds.check(10), Some(Leverage(10)));
        assert_eq!(bounds.check(11), None);
    }

    #[test]
    fn open_interest_tracking() {
        let mut oi = OpenInterest::default();
        oi.add(Side::Long, BaseAmount(5));
        oi.add(Side::Short, BaseAmount(3));
        assert_eq!(oi.net(), 2);

        oi.remove(Side::Long, BaseAmount(7));
        assert_eq!(oi.long, BaseAmount::ZERO);
        assert_eq!(oi.net(), -3);
    }
}
