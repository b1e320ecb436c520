//! Liquidation policy.
//!
//! A position becomes liquidatable once its mark pnl is a loss of at least
//! `threshold_pct` percent of posted margin. The liquidator is paid
//! `reward_pct` percent of margin; the rest of the margin is forfeited.

use crate::position::Position;
use crate::scale::MathError;
use crate::types::{QuoteAmount, SignedQuote};
use serde::{Deserialize, Serialize};

pub const LIQUIDATION_THRESHOLD_PCT: u8 = 80;
pub const LIQUIDATION_REWARD_PCT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationParams {
    pub threshold_pct: u8,
    pub reward_pct: u8,
}

impl Default for LiquidationParams {
    fn default() -> Self {
        Self {
            threshold_pct: LIQUIDATION_THRESHOLD_PCT,
            reward_pct: LIQUIDATION_REWARD_PCT,
        }
    }
}

impl LiquidationParams {
    /// Loss at or beyond which the position can be liquidated.
    pub fn threshold(&self, margin: QuoteAmount) -> Result<QuoteAmount, MathError> {
        margin.percent(self.threshold_pct)
    }

    pub fn reward(&self, margin: QuoteAmount) -> Result<QuoteAmount, MathError> {
        margin.percent(self.reward_pct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationStatus {
    NoPosition,
    Profitable {
        pnl: SignedQuote,
    },
    BelowThreshold {
        loss: QuoteAmount,
        threshold: QuoteAmount,
    },
    Liquidatable {
        loss: QuoteAmount,
        threshold: QuoteAmount,
        reward: QuoteAmount,
    },
}

impl LiquidationStatus {
    pub fn is_liquidatable(&self) -> bool {
        matches!(self, LiquidationStatus::Liquidatable { .. })
    }
}

pub fn evaluate_liquidation(
    position: &Position,
    pnl: SignedQuote,
    params: &LiquidationParams,
) -> Result<LiquidationStatus, MathError> {
    if !position.is_open() {
        return Ok(LiquidationStatus::NoPosition);
    }

    // a flat position is not a loss
    if !pnl.is_negative() {
        return Ok(LiquidationStatus::Profitable { pnl });
    }

    let loss = pnl.unsigned_abs();
    let threshold = params.threshold(position.margin)?;

    if loss < threshold {
        return Ok(LiquidationStatus::BelowThreshold { loss, threshold });
    }

    Ok(LiquidationStatus::Liquidatable {
        loss,
        threshold,
        reward: params.reward(position.margin)?,
    })
}
