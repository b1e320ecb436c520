// 3.0: pnl math. pure functions only, nothing here touches engine state.
// mark pnl = (current - entry) * size, rescaled from price*base decimals to quote decimals.
// realized pnl = the quote difference between the opening trade and its reversal.

use crate::position::Position;
use crate::scale::{MathError, Scale};
use crate::types::{Price, QuoteAmount, Side, SignedQuote};

// 3.1: mark-to-virtual-price pnl. drives liquidation and the read surface.
pub fn calculate_pnl(
    position: &Position,
    current_price: Price,
    scale: &Scale,
) -> Result<SignedQuote, MathError> {
    let Some(side) = position.side() else {
        return Ok(SignedQuote::ZERO);
    };

    let entry = position.entry_price.raw();
    let current = current_price.raw();
    let size = position.size.abs();

    // long gains when current > entry, short when entry > current
    let (negative, delta) = match side {
        Side::Long => (current < entry, current.abs_diff(entry)),
        Side::Short => (entry < current, entry.abs_diff(current)),
    };

    scale.pnl(negative, delta, size)
}

// 3.2: pnl realized by closing against the pool.
// long: paid entry_notional in, receives exit_notional out.
// short: received entry_notional, pays exit_notional to buy the base back.
pub fn realized_pnl(
    side: Side,
    entry_notional: QuoteAmount,
    exit_notional: QuoteAmount,
) -> Result<SignedQuote, MathError> {
    let (gain, loss) = match side {
        Side::Long => (exit_notional.raw(), entry_notional.raw()),
        Side::Short => (entry_notional.raw(), exit_notional.raw()),
    };
    SignedQuote::from_magnitude(gain < loss, gain.abs_diff(loss))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// `max(0, margin + pnl)`
    pub payout: QuoteAmount,
    /// loss beyond margin that nobody collects
    pub shortfall: QuoteAmount,
}

// 3.3: margin + pnl, floored at zero
pub fn settle(margin: QuoteAmount, pnl: SignedQuote) -> Result<Settlement, MathError> {
    if !pnl.is_negative() {
        return Ok(Settlement {
            payout: margin.checked_add(pnl.unsigned_abs())?,
            shortfall: QuoteAmount::ZERO,
        });
    }

    let loss = pnl.unsigned_abs();
    Ok(Settlement {
        payout: margin.saturating_sub(loss),
        shortfall: loss.saturating_sub(margin),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, BaseAmount, Leverage, SignedSize, Timestamp};

    const ONE_BASE: u128 = 1_000_000_000_000_000_000;

    fn position(side: Side, units: u128, entry: u128) -> Position {
        Position {
            trader: Address::ZERO,
            margin: QuoteAmount(5_000_000_000),
            borrowed: QuoteAmount(45_000_000_000),
            size: SignedSize::from_side(side, BaseAmount(units * ONE_BASE)).unwrap(),
            entry_price: Price(entry * ONE_BASE),
            entry_notional: QuoteAmount(50_000_000_000),
            leverage: Leverage(10),
            opened_at: Timestamp::default(),
        }
    }

    #[test]
    fn long_profit_and_loss() {
        let scale = Scale::default();
        let pos = position(Side::Long, 1, 50_000);

        let up = calculate_pnl(&pos, Price(52_000 * ONE_BASE), &scale).unwrap();
        assert_eq!(up, SignedQuote(2_000_000_000));

        let down = calculate_pnl(&pos, Price(48_000 * ONE_BASE), &scale).unwrap();
        assert_eq!(down, SignedQuote(-2_000_000_000));
    }

    #[test]
    fn short_profits_when_price_drops() {
        let scale = Scale::default();
        let pos = position(Side::Short, 1, 50_000);

        let down = calculate_pnl(&pos, Price(48_000 * ONE_BASE), &scale).unwrap();
        assert_eq!(down, SignedQuote(2_000_000_000));

        let up = calculate_pnl(&pos, Price(51_000 * ONE_BASE), &scale).unwrap();
        assert_eq!(up, SignedQuote(-1_000_000_000));
    }

    #[test]
    fn empty_position_has_zero_pnl() {
        let scale = Scale::default();
        let pos = Position::empty(Address::ZERO);
        let pnl = calculate_pnl(&pos, Price(1), &scale).unwrap();
        assert_eq!(pnl, SignedQuote::ZERO);
    }

    #[test]
    fn realized_pnl_by_side() {
        let entry = QuoteAmount(5_000);
        assert_eq!(realized_pnl(Side::Long, entry, QuoteAmount(5_500)).unwrap(), SignedQuote(500));
        assert_eq!(realized_pnl(Side::Long, entry, QuoteAmount(4_000)).unwrap(), SignedQuote(-1_000));
        assert_eq!(realized_pnl(Side::Short, entry, QuoteAmount(4_000)).unwrap(), SignedQuote(1_000));
        assert_eq!(realized_pnl(Side::Short, entry, entry).unwrap(), SignedQuote::ZERO);
    }

    #[test]
    fn settle_floors_at_zero() {
        let margin = QuoteAmount(1_000);

        let win = settle(margin, SignedQuote(250)).unwrap();
        assert_eq!(win.payout, QuoteAmount(1_250));
        assert_eq!(win.shortfall, QuoteAmount::ZERO);

        let partial = settle(margin, SignedQuote(-400)).unwrap();
        assert_eq!(partial.payout, QuoteAmount(600));

        let wiped = settle(margin, SignedQuote(-1_700)).unwrap();
        assert_eq!(wiped.payout, QuoteAmount::ZERO);
        assert_eq!(wiped.shortfall, QuoteAmount(700));
    }
}
