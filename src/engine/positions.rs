//! Opening and closing positions against the virtual pool.
//!
//! Every mutating path follows the same order: validate, preview the reserve
//! change, move real tokens, then commit reserves and the position record. A
//! failed transfer therefore leaves nothing behind.

use super::core::Engine;
use super::results::{CloseResult, EngineError, OpenResult};
use crate::events::{EventPayload, PositionClosedEvent, PositionOpenedEvent};
use crate::gateway::QuoteToken;
use crate::pnl::{calculate_pnl, realized_pnl, settle};
use crate::position::Position;
use crate::scale::MathError;
use crate::types::{QuoteAmount, Side, SignedSize, TraderId};
use crate::vamm::ReserveUpdate;
use tracing::{debug, info};

impl<T: QuoteToken> Engine<T> {
    /// Open a leveraged position of `margin * leverage` notional.
    ///
    /// The trader must have approved the engine account for `margin`.
    pub fn open_position(
        &mut self,
        trader: TraderId,
        margin: QuoteAmount,
        leverage: u8,
        is_long: bool,
    ) -> Result<OpenResult, EngineError> {
        let bounds = self.market_config.leverage;
        let leverage = bounds.check(leverage).ok_or(EngineError::InvalidLeverage {
            leverage,
            min: bounds.min,
            max: bounds.max,
        })?;

        if margin.is_zero() {
            return Err(EngineError::ZeroMargin);
        }

        if self.positions.get(&trader).is_some_and(|p| p.is_open()) {
            return Err(EngineError::PositionAlreadyOpen(trader));
        }

        let side = Side::from_is_long(is_long);
        let notional = QuoteAmount(
            margin
                .raw()
                .checked_mul(u128::from(leverage.value()))
                .ok_or(MathError::Overflow)?,
        );
        // leverage >= 1, so this cannot underflow
        let borrowed = notional.checked_sub(margin)?;

        // entry is the pre-trade price, not the average fill
        let entry_price = self.current_price()?;
        let update = match side {
            Side::Long => self.market.preview_buy_quote(notional)?,
            Side::Short => self.market.preview_sell_quote(notional)?,
        };
        let size = SignedSize::from_side(side, update.base_delta)?;
        debug!(trader = %trader, notional = %notional, base_delta = %update.base_delta, "open previewed");

        self.gateway.pull_margin(trader, margin)?;

        self.market.commit(&update);
        self.positions.insert(
            trader,
            Position {
                trader,
                margin,
                borrowed,
                size,
                entry_price,
                entry_notional: notional,
                leverage,
                opened_at: self.current_time,
            },
        );
        self.open_interest.add(side, update.base_delta);

        info!(
            trader = %trader,
            side = %side,
            margin = %margin,
            leverage = %leverage,
            size = %size,
            entry_price = %entry_price,
            "position opened"
        );

        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            trader,
            side,
            margin,
            leverage,
            notional,
            size,
            entry_price,
        }));

        Ok(OpenResult {
            trader,
            side,
            size,
            entry_price,
            notional,
            borrowed,
        })
    }

    /// Close the trader's whole position and pay out `max(0, margin + pnl)`.
    ///
    /// Settlement uses the pnl realized by reversing the trade through the pool.
    pub fn close_position(&mut self, trader: TraderId) -> Result<CloseResult, EngineError> {
        let position = self
            .positions
            .get(&trader)
            .filter(|p| p.is_open())
            .cloned()
            .ok_or(EngineError::NoOpenPosition(trader))?;
        let side = position.side().ok_or(EngineError::NoOpenPosition(trader))?;

        let mark_pnl = calculate_pnl(&position, self.current_price()?, self.market.scale())?;
        let update = self.preview_unwind(side, &position)?;
        let realized = realized_pnl(side, position.entry_notional, update.quote_delta)?;
        let settlement = settle(position.margin, realized)?;
        debug!(trader = %trader, exit_notional = %update.quote_delta, realized = %realized, "close previewed");

        self.gateway.pay_out(trader, settlement.payout)?;

        self.market.commit(&update);
        self.open_interest.remove(side, position.size.abs());
        self.uncollected_losses = self.uncollected_losses.checked_add(settlement.shortfall)?;
        if let Some(record) = self.positions.get_mut(&trader) {
            record.clear();
        }

        info!(
            trader = %trader,
            realized_pnl = %realized,
            payout = %settlement.payout,
            shortfall = %settlement.shortfall,
            "position closed"
        );

        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            trader,
            size: position.size,
            exit_notional: update.quote_delta,
            realized_pnl: realized,
            payout: settlement.payout,
            shortfall: settlement.shortfall,
        }));

        Ok(CloseResult {
            trader,
            size: position.size,
            mark_pnl,
            exit_notional: update.quote_delta,
            realized_pnl: realized,
            payout: settlement.payout,
            shortfall: settlement.shortfall,
        })
    }

    // reserve change that undoes the position's opening trade
    pub(super) fn preview_unwind(
        &self,
        side: Side,
        position: &Position,
    ) -> Result<ReserveUpdate, EngineError> {
        let size = position.size.abs();
        let update = match side {
            Side::Long => self.market.preview_reverse_short(size)?,
            Side::Short => self.market.preview_reverse_long(size)?,
        };
        Ok(update)
    }
}
