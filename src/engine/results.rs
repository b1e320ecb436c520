// 8.0.2: result types and errors for engine operations.

use crate::config::ConfigError;
use crate::gateway::TransferError;
use crate::scale::MathError;
use crate::types::{Price, QuoteAmount, Side, SignedQuote, SignedSize, TraderId};
use crate::vamm::MarketError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenResult {
    pub trader: TraderId,
    pub side: Side,
    pub size: SignedSize,
    pub entry_price: Price,
    pub notional: QuoteAmount,
    pub borrowed: QuoteAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseResult {
    pub trader: TraderId,
    pub size: SignedSize,
    /// mark pnl at the pre-close virtual price
    pub mark_pnl: SignedQuote,
    /// quote that moved across the pool when the trade was reversed
    pub exit_notional: QuoteAmount,
    pub realized_pnl: SignedQuote,
    pub payout: QuoteAmount,
    pub shortfall: QuoteAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationResult {
    pub trader: TraderId,
    pub liquidator: TraderId,
    pub size: SignedSize,
    pub pnl: SignedQuote,
    pub reward: QuoteAmount,
    pub forfeited: QuoteAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("leverage {leverage}x outside {min}x..={max}x")]
    InvalidLeverage { leverage: u8, min: u8, max: u8 },

    #[error("margin must be non-zero")]
    ZeroMargin,

    #[error("trader {0} already has an open position")]
    PositionAlreadyOpen(TraderId),

    #[error("trader {0} has no open position")]
    NoOpenPosition(TraderId),

    #[error("insufficient virtual liquidity: requested {requested}, reserve {reserve}")]
    InsufficientVirtualLiquidity { requested: u128, reserve: u128 },

    #[error("{0} cannot liquidate its own position")]
    CannotLiquidateOwnPosition(TraderId),

    #[error("position of {trader} is not at a loss (pnl {pnl})")]
    PositionIsProfitable { trader: TraderId, pnl: SignedQuote },

    #[error("loss {loss} of {trader} below liquidation threshold {threshold}")]
    LossBelowLiquidationThreshold {
        trader: TraderId,
        loss: QuoteAmount,
        threshold: QuoteAmount,
    },

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("re-entrant call rejected while another engine operation is in progress")]
    Reentrancy,

    #[error("market error: {0}")]
    Market(MarketError),

    #[error("math error: {0}")]
    Math(#[from] MathError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<MarketError> for EngineError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::InsufficientVirtualLiquidity { requested, reserve } => {
                EngineError::InsufficientVirtualLiquidity { requested, reserve }
            }
            MarketError::Math(e) => EngineError::Math(e),
            other => EngineError::Market(other),
        }
    }
}
