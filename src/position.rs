// 4.0: one position record per trader. size == 0 means no position.
// records are cleared in place, never removed, so an address keeps its slot.

use crate::pnl::calculate_pnl;
use crate::scale::{MathError, Scale};
use crate::types::{Leverage, Price, QuoteAmount, SignedQuote, SignedSize, Side, Timestamp, TraderId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub trader: TraderId,
    pub margin: QuoteAmount,
    /// `margin * (leverage - 1)`. bookkeeping only, never settled.
    pub borrowed: QuoteAmount,
    pub size: SignedSize,
    pub entry_price: Price,
    /// quote traded into the pool at open (`margin * leverage`)
    pub entry_notional: QuoteAmount,
    pub leverage: Leverage,
    pub opened_at: Timestamp,
}

impl Position {
    pub fn empty(trader: TraderId) -> Self {
        Self {
            trader,
            margin: QuoteAmount::ZERO,
            borrowed: QuoteAmount::ZERO,
            size: SignedSize::ZERO,
            entry_price: Price::default(),
            entry_notional: QuoteAmount::ZERO,
            leverage: Leverage::default(),
            opened_at: Timestamp::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.size.is_zero()
    }

    pub fn side(&self) -> Option<Side> {
        self.size.side()
    }

    // 4.1: paper pnl against the given virtual price
    pub fn unrealized_pnl(&self, current_price: Price, scale: &Scale) -> Result<SignedQuote, MathError> {
        calculate_pnl(self, current_price, scale)
    }

    /// Zero every field but the owner.
    pub fn clear(&mut self) {
        *self = Self::empty(self.trader);
    }
}

/// Read-only snapshot returned by `Engine::get_position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub margin: QuoteAmount,
    pub borrowed: QuoteAmount,
    pub size: SignedSize,
    pub entry_price: Price,
    pub pnl: SignedQuote,
}

impl PositionView {
    pub fn from_position(
        position: &Position,
        current_price: Price,
        scale: &Scale,
    ) -> Result<Self, MathError> {
        Ok(Self {
            margin: position.margin,
            borrowed: position.borrowed,
            size: position.size,
            entry_price: position.entry_price,
            pnl: position.unrealized_pnl(current_price, scale)?,
        })
    }

    pub fn empty() -> Self {
        Self {
            margin: QuoteAmount::ZERO,
            borrowed: QuoteAmount::ZERO,
            size: SignedSize::ZERO,
            entry_price: Price::default(),
            pnl: SignedQuote::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, BaseAmount};

    fn long_position() -> Position {
        Position {
            trader: Address::repeat_byte(0x11),
            margin: QuoteAmount(1_000_000_000),
            borrowed: QuoteAmount(4_000_000_000),
            size: SignedSize::from_side(Side::Long, BaseAmount(2_500_000_000_000_000_000)).unwrap(),
            entry_price: Price(2_000_000_000_000_000_000_000),
            entry_notional: QuoteAmount(5_000_000_000),
            leverage: Leverage(5),
            opened_at: Timestamp::from_millis(42),
        }
    }

    #[test]
    fn clear_keeps_owner_only() {
        let mut position = long_position();
        assert!(position.is_open());

        position.clear();

        assert!(!position.is_open());
        assert_eq!(position, Position::empty(Address::repeat_byte(0x11)));
        assert_eq!(position.margin, QuoteAmount::ZERO);
        assert_eq!(position.borrowed, QuoteAmount::ZERO);
    }

    #[test]
    fn view_carries_pnl() {
        let position = long_position();
        let scale = Scale::default();
        // +$4 on 2.5 units = +$10
        let price = Price(2_004_000_000_000_000_000_000);

        let view = PositionView::from_position(&position, price, &scale).unwrap();

        assert_eq!(view.pnl, SignedQuote(10_000_000));
        assert_eq!(view.margin, position.margin);
        assert_eq!(view.entry_price, position.entry_price);
    }
}
