//! Property-based tests for the pool math and position round trips.
//!
//! These tests verify invariants hold under random inputs.

use proptest::prelude::*;
use vamm_core::*;

const USDC: u128 = 1_000_000;
const ETH: u128 = 1_000_000_000_000_000_000;

// Strategies for generating test data
fn margin_strategy() -> impl Strategy<Value = u128> {
    (1u128..=10_000u128).prop_map(|x| x * USDC) // $1 to $10,000
}

fn leverage_strategy() -> impl Strategy<Value = u8> {
    1u8..=10u8
}

fn notional_strategy() -> impl Strategy<Value = u128> {
    (1u128..=200_000u128).prop_map(|x| x * USDC)
}

fn price_strategy() -> impl Strategy<Value = u128> {
    (1u128..=1_000_000u128).prop_map(|x| x * ETH / 100) // $0.01 to $10,000
}

fn default_market() -> VirtualMarket {
    MarketConfig::eth_usdc().build_market().unwrap()
}

fn funded_engine(traders: &[Address]) -> Engine {
    let config = Config::default();
    let engine_account = config.engine.engine_account;
    let mut token = InMemoryToken::new();
    for trader in traders {
        token.mint(*trader, QuoteAmount(1_000_000 * USDC));
        token.approve(*trader, engine_account, QuoteAmount(u128::MAX));
    }
    Engine::new(config, token).unwrap()
}

fn long_position(size: u128, entry: u128) -> Position {
    Position {
        trader: Address::repeat_byte(0x01),
        margin: QuoteAmount(1_000 * USDC),
        borrowed: QuoteAmount::ZERO,
        size: SignedSize(size as i128),
        entry_price: Price(entry),
        entry_notional: QuoteAmount(1_000 * USDC),
        leverage: Leverage(1),
        opened_at: Timestamp::default(),
    }
}

fn assert_residual_bounded(market: &VirtualMarket) -> Result<(), TestCaseError> {
    let base = U256::from(market.virtual_base().raw());
    let quote = U256::from(market.virtual_quote().raw());
    let product = base * quote;
    prop_assert!(product <= market.invariant_k(), "reserves overshoot k");
    prop_assert!(market.invariant_k() - product < base.max(quote), "residual too large");
    Ok(())
}

proptest! {
    /// After any sequence of trades k - base*quote stays below the larger reserve.
    #[test]
    fn invariant_residual_bounded(
        trades in proptest::collection::vec((notional_strategy(), any::<bool>()), 1..30),
    ) {
        let mut market = default_market();
        for (notional, is_long) in trades {
            // rejected trades leave the pool alone
            let _ = if is_long {
                market.apply_buy_quote(QuoteAmount(notional))
            } else {
                market.apply_sell_quote(QuoteAmount(notional))
            };
            assert_residual_bounded(&market)?;
        }
    }

    /// A trade followed by its reversal restores both reserves exactly.
    #[test]
    fn reversal_restores_reserves(
        notional in notional_strategy(),
        is_long in any::<bool>(),
    ) {
        let mut market = default_market();
        let before = market.state().clone();

        if is_long {
            let base = market.apply_buy_quote(QuoteAmount(notional)).unwrap();
            let returned = market.reverse_short(base).unwrap();
            prop_assert_eq!(returned, QuoteAmount(notional));
        } else {
            let base = market.apply_sell_quote(QuoteAmount(notional)).unwrap();
            let owed = market.reverse_long(base).unwrap();
            prop_assert_eq!(owed, QuoteAmount(notional));
        }

        prop_assert_eq!(market.state(), &before);
        prop_assert_eq!(market.k_residual(), U256::ZERO);
    }

    /// Open then immediately close pays back exactly the margin.
    #[test]
    fn round_trip_returns_margin(
        margin in margin_strategy(),
        leverage in leverage_strategy(),
        is_long in any::<bool>(),
    ) {
        let trader = Address::repeat_byte(0x0a);
        let mut engine = funded_engine(&[trader]);
        let reserves = engine.market().state().clone();
        let balance = engine.token().balance_of(trader);

        engine.open_position(trader, QuoteAmount(margin), leverage, is_long).unwrap();
        let closed = engine.close_position(trader).unwrap();

        prop_assert_eq!(closed.payout, QuoteAmount(margin));
        prop_assert_eq!(closed.shortfall, QuoteAmount::ZERO);
        prop_assert_eq!(engine.market().state(), &reserves);
        prop_assert_eq!(engine.token().balance_of(trader), balance);
        prop_assert_eq!(engine.engine_balance(), QuoteAmount::ZERO);
    }

    /// Longs strictly raise the virtual price, shorts strictly lower it.
    #[test]
    fn price_impact_monotonic(
        margin in margin_strategy(),
        leverage in leverage_strategy(),
        is_long in any::<bool>(),
    ) {
        let trader = Address::repeat_byte(0x0a);
        let mut engine = funded_engine(&[trader]);
        let before = engine.current_price().unwrap();

        engine.open_position(trader, QuoteAmount(margin), leverage, is_long).unwrap();
        let after = engine.current_price().unwrap();

        if is_long {
            prop_assert!(after > before, "long should raise price");
        } else {
            prop_assert!(after < before, "short should lower price");
        }
    }

    /// PnL is zero when the price has not moved.
    #[test]
    fn pnl_zero_at_entry(
        size in 1u128..=1_000u128,
        entry in price_strategy(),
    ) {
        let position = long_position(size * ETH, entry);
        let pnl = calculate_pnl(&position, Price(entry), &Scale::default()).unwrap();
        prop_assert_eq!(pnl, SignedQuote::ZERO);
    }

    /// Long profits when price rises, short profits when it falls.
    #[test]
    fn pnl_sign_matches_side(
        size in 1u128..=1_000u128,
        entry in price_strategy(),
        // at least one cent per base unit
        move_cents in 1u128..=100_000u128,
        up in any::<bool>(),
    ) {
        let delta = move_cents * ETH / 100;
        let current = if up { entry + delta } else { entry.saturating_sub(delta) };
        prop_assume!(current > 0 && current != entry);

        let scale = Scale::default();
        let long = long_position(size * ETH, entry);
        let mut short = long.clone();
        short.size = SignedSize(-short.size.raw());

        let long_pnl = calculate_pnl(&long, Price(current), &scale).unwrap();
        let short_pnl = calculate_pnl(&short, Price(current), &scale).unwrap();

        if current > entry {
            prop_assert!(long_pnl.raw() > 0);
            prop_assert!(short_pnl.raw() < 0);
        } else {
            prop_assert!(long_pnl.raw() < 0);
            prop_assert!(short_pnl.raw() > 0);
        }
        prop_assert_eq!(long_pnl.raw(), -short_pnl.raw());
    }

    /// Settlement never pays out less than zero and never loses track of the loss.
    #[test]
    fn settlement_accounts_for_whole_loss(
        margin in margin_strategy(),
        loss in 0u128..=20_000u128,
    ) {
        let pnl = SignedQuote(-((loss * USDC) as i128));
        let settlement = settle(QuoteAmount(margin), pnl).unwrap();
        prop_assert_eq!(
            settlement.payout.raw() + loss * USDC,
            margin + settlement.shortfall.raw()
        );
        prop_assert!(settlement.payout.raw() == 0 || settlement.shortfall.raw() == 0);
    }
}

#[test]
fn extreme_short_is_rejected_not_overflowed() {
    let mut market = default_market();
    let reserve = market.virtual_quote();
    let result = market.apply_sell_quote(reserve);
    assert!(matches!(
        result,
        Err(MarketError::InsufficientVirtualLiquidity { .. })
    ));
}

#[test]
fn huge_long_stays_representable() {
    let mut market = default_market();
    let base = market
        .apply_buy_quote(QuoteAmount(1_000_000_000 * USDC))
        .unwrap();
    assert!(base < BaseAmount(1_000 * ETH));
    assert!(market.current_price().unwrap() > Price(2_000 * ETH));
}
