//! Liquidation detection and execution.

use super::core::Engine;
use super::results::{EngineError, LiquidationResult};
use crate::events::{EventPayload, PositionLiquidatedEvent};
use crate::gateway::QuoteToken;
use crate::liquidation::{evaluate_liquidation, LiquidationStatus};
use crate::pnl::{calculate_pnl, realized_pnl};
use crate::types::{QuoteAmount, TraderId};
use tracing::{info, warn};

impl<T: QuoteToken> Engine<T> {
    /// Where the trader's position stands against the liquidation threshold.
    pub fn liquidation_status(&self, trader: TraderId) -> Result<LiquidationStatus, EngineError> {
        let Some(position) = self.positions.get(&trader).filter(|p| p.is_open()) else {
            return Ok(LiquidationStatus::NoPosition);
        };
        let pnl = calculate_pnl(position, self.current_price()?, self.market.scale())?;
        Ok(evaluate_liquidation(position, pnl, &self.liquidation)?)
    }

    /// Never fails. Anything that would stop `liquidate` reads as false.
    pub fn can_liquidate(&self, trader: TraderId) -> bool {
        self.liquidation_status(trader)
            .map(|status| status.is_liquidatable())
            .unwrap_or(false)
    }

    /// Close another trader's losing position.
    ///
    /// The liquidator receives the reward; the rest of the margin stays
    /// with the engine and the trader gets nothing.
    pub fn liquidate(
        &mut self,
        trader: TraderId,
        liquidator: TraderId,
    ) -> Result<LiquidationResult, EngineError> {
        if liquidator == trader {
            warn!(trader = %trader, "liquidation rejected: self-liquidation");
            return Err(EngineError::CannotLiquidateOwnPosition(trader));
        }

        let position = self
            .positions
            .get(&trader)
            .filter(|p| p.is_open())
            .cloned()
            .ok_or(EngineError::NoOpenPosition(trader))?;
        let side = position.side().ok_or(EngineError::NoOpenPosition(trader))?;

        let pnl = calculate_pnl(&position, self.current_price()?, self.market.scale())?;
        let reward = match evaluate_liquidation(&position, pnl, &self.liquidation)? {
            LiquidationStatus::Liquidatable { reward, .. } => reward,
            LiquidationStatus::Profitable { pnl } => {
                warn!(
                    trader = %trader,
                    liquidator = %liquidator,
                    pnl = %pnl,
                    "liquidation rejected: position in profit"
                );
                return Err(EngineError::PositionIsProfitable { trader, pnl });
            }
            LiquidationStatus::BelowThreshold { loss, threshold } => {
                warn!(
                    trader = %trader,
                    liquidator = %liquidator,
                    loss = %loss,
                    threshold = %threshold,
                    "liquidation rejected: loss below threshold"
                );
                return Err(EngineError::LossBelowLiquidationThreshold {
                    trader,
                    loss,
                    threshold,
                });
            }
            LiquidationStatus::NoPosition => return Err(EngineError::NoOpenPosition(trader)),
        };

        let update = self.preview_unwind(side, &position)?;
        let realized = realized_pnl(side, position.entry_notional, update.quote_delta)?;
        let forfeited = position.margin.checked_sub(reward)?;
        // loss the kept margin does not cover
        let uncovered = if realized.is_negative() {
            realized.unsigned_abs().saturating_sub(forfeited)
        } else {
            QuoteAmount::ZERO
        };

        self.gateway.pay_out(liquidator, reward)?;

        self.market.commit(&update);
        self.open_interest.remove(side, position.size.abs());
        self.forfeited_margin = self.forfeited_margin.checked_add(forfeited)?;
        self.uncollected_losses = self.uncollected_losses.checked_add(uncovered)?;
        if let Some(record) = self.positions.get_mut(&trader) {
            record.clear();
        }

        if !uncovered.is_zero() {
            warn!(trader = %trader, uncovered = %uncovered, "liquidation left loss uncovered");
        }
        info!(
            trader = %trader,
            liquidator = %liquidator,
            pnl = %pnl,
            reward = %reward,
            "position liquidated"
        );

        self.emit_event(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
            trader,
            liquidator,
            size: position.size,
            pnl,
            reward,
            forfeited,
        }));

        Ok(LiquidationResult {
            trader,
            liquidator,
            size: position.size,
            pnl,
            reward,
            forfeited,
        })
    }
}
