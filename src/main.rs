//! Virtual AMM Perpetuals Simulation.
//!
//! Walks the engine through its lifecycle against an in-memory quote token:
//! round trips, price impact, profitable closes, liquidation and re-entrancy.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::EnvFilter;
use vamm_core::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vamm_core=info")),
        )
        .init();

    println!("Virtual AMM Perpetuals Simulation");
    println!("Single Market, Isolated Margin, Virtual Liquidity\n");

    scenario_1_round_trip();
    scenario_2_price_impact();
    scenario_3_profitable_close();
    scenario_4_liquidation();
    scenario_5_reentrancy();

    println!("\nAll simulations completed successfully.");
}

const TRADER_FUNDS: Decimal = dec!(100_000);

fn trader(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Engine on the default vETH-USDC pool with each trader funded and approved.
fn funded_engine(traders: &[Address]) -> Engine {
    let config = Config::default();
    let scale = config.market.scale;
    let engine_account = config.engine.engine_account;

    let mut token = InMemoryToken::new();
    for t in traders {
        token.mint(*t, scale.quote_from_decimal(TRADER_FUNDS).unwrap());
        token.approve(*t, engine_account, QuoteAmount(u128::MAX));
    }
    let mut engine = Engine::new(config, token).unwrap();
    engine.set_time(Timestamp::now());
    engine
}

fn usdc(engine: &Engine, amount: Decimal) -> QuoteAmount {
    engine.market().scale().quote_from_decimal(amount).unwrap()
}

fn show_quote<T: QuoteToken>(engine: &Engine<T>, amount: QuoteAmount) -> Decimal {
    engine.market().scale().quote_to_decimal(amount).unwrap()
}

fn show_pnl<T: QuoteToken>(engine: &Engine<T>, pnl: SignedQuote) -> Decimal {
    engine
        .market()
        .scale()
        .signed_quote_to_decimal(pnl)
        .unwrap()
        .round_dp(2)
}

fn show_price<T: QuoteToken>(engine: &Engine<T>) -> Decimal {
    let price = engine.current_price().unwrap();
    engine
        .market()
        .scale()
        .price_to_decimal(price)
        .unwrap()
        .round_dp(2)
}

fn show_size<T: QuoteToken>(engine: &Engine<T>, size: SignedSize) -> Decimal {
    let scale = engine.market().scale();
    let magnitude = scale.base_to_decimal(size.abs()).unwrap().round_dp(6);
    if size.is_short() {
        -magnitude
    } else {
        magnitude
    }
}

/// Open then immediately close returns exactly the margin.
fn scenario_1_round_trip() {
    println!("Scenario 1: Round Trip\n");

    let alice = trader(0x0a);
    let mut engine = funded_engine(&[alice]);
    println!("  Pool opens at ${}", show_price(&engine));

    let opened = engine
        .open_position(alice, usdc(&engine, dec!(1_000)), 10, true)
        .unwrap();
    println!(
        "  Alice longs 10x on $1,000: {} vETH, price now ${}",
        show_size(&engine, opened.size),
        show_price(&engine)
    );

    let closed = engine.close_position(alice).unwrap();
    println!(
        "  Alice closes: payout ${}, price back to ${}",
        show_quote(&engine, closed.payout),
        show_price(&engine)
    );
    println!("  Invariant residual: {}\n", engine.market().k_residual());
}

/// Longs push the virtual price up, shorts push it down.
fn scenario_2_price_impact() {
    println!("Scenario 2: Price Impact\n");

    let alice = trader(0x0a);
    let bob = trader(0x0b);
    let mut engine = funded_engine(&[alice, bob]);

    engine
        .open_position(alice, usdc(&engine, dec!(1_000)), 5, true)
        .unwrap();
    println!("  Alice longs $5,000 notional: price ${}", show_price(&engine));

    engine
        .open_position(bob, usdc(&engine, dec!(1_000)), 3, false)
        .unwrap();
    println!("  Bob shorts $3,000 notional: price ${}", show_price(&engine));

    let oi = engine.open_interest();
    println!("  Open interest net: {} raw base units\n", oi.net());
}

/// Another trader's buying lifts an earlier long into profit.
fn scenario_3_profitable_close() {
    println!("Scenario 3: Profitable Close\n");

    let alice = trader(0x0a);
    let bob = trader(0x0b);
    let mut engine = funded_engine(&[alice, bob]);

    engine
        .open_position(alice, usdc(&engine, dec!(1_000)), 5, true)
        .unwrap();
    engine
        .open_position(bob, usdc(&engine, dec!(10_000)), 10, true)
        .unwrap();

    let view = engine.get_position(alice).unwrap();
    println!(
        "  After Bob's $100,000 long: price ${}, Alice mark pnl ${}",
        show_price(&engine),
        show_pnl(&engine, view.pnl)
    );

    let closed = engine.close_position(alice).unwrap();
    println!(
        "  Alice closes: realized ${}, payout ${}\n",
        show_pnl(&engine, closed.realized_pnl),
        show_quote(&engine, closed.payout)
    );
}

/// A heavy short pushes a 10x long past the liquidation threshold.
fn scenario_4_liquidation() {
    println!("Scenario 4: Liquidation\n");

    let alice = trader(0x0a);
    let bob = trader(0x0b);
    let keeper = trader(0x0c);
    let mut engine = funded_engine(&[alice, bob, keeper]);

    engine
        .open_position(alice, usdc(&engine, dec!(1_000)), 10, true)
        .unwrap();
    println!("  Alice longs 10x on $1,000 at ${}", show_price(&engine));

    engine
        .open_position(bob, usdc(&engine, dec!(10_000)), 10, false)
        .unwrap();
    let view = engine.get_position(alice).unwrap();
    println!(
        "  Bob shorts $100,000: price ${}, Alice pnl ${}",
        show_price(&engine),
        show_pnl(&engine, view.pnl)
    );
    println!("  Liquidatable: {}", engine.can_liquidate(alice));

    match engine.liquidate(alice, alice) {
        Err(e) => println!("  Self-liquidation attempt: {}", e),
        Ok(_) => println!("  Unexpected self-liquidation"),
    }

    let result = engine.liquidate(alice, keeper).unwrap();
    println!(
        "  Keeper liquidates: reward ${}, forfeited ${}",
        show_quote(&engine, result.reward),
        show_quote(&engine, result.forfeited)
    );
    println!(
        "  Engine holds ${}\n",
        show_quote(&engine, engine.engine_balance())
    );
}

/// Token that tries to call back into the engine while a margin pull is running.
struct CallbackToken {
    ledger: InMemoryToken,
    engine: Arc<OnceLock<SharedEngine<CallbackToken>>>,
    rejected: Arc<Mutex<Option<EngineError>>>,
}

impl QuoteToken for CallbackToken {
    fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        recipient: Address,
        amount: QuoteAmount,
    ) -> Result<(), TransferError> {
        if let Some(engine) = self.engine.get() {
            if let Err(e) = engine.close_position(owner) {
                *self.rejected.lock() = Some(e);
            }
        }
        self.ledger.transfer_from(spender, owner, recipient, amount)
    }

    fn transfer(
        &mut self,
        sender: Address,
        recipient: Address,
        amount: QuoteAmount,
    ) -> Result<(), TransferError> {
        self.ledger.transfer(sender, recipient, amount)
    }

    fn balance_of(&self, owner: Address) -> QuoteAmount {
        self.ledger.balance_of(owner)
    }

    fn allowance(&self, owner: Address, spender: Address) -> QuoteAmount {
        self.ledger.allowance(owner, spender)
    }
}

/// Calls that re-enter through a token callback are turned away.
fn scenario_5_reentrancy() {
    println!("Scenario 5: Re-entrancy Guard\n");

    let alice = trader(0x0a);
    let config = Config::default();
    let engine_account = config.engine.engine_account;

    let mut ledger = InMemoryToken::new();
    ledger.mint(alice, QuoteAmount(10_000_000_000));
    ledger.approve(alice, engine_account, QuoteAmount(u128::MAX));

    let slot = Arc::new(OnceLock::new());
    let rejected = Arc::new(Mutex::new(None));
    let token = CallbackToken {
        ledger,
        engine: Arc::clone(&slot),
        rejected: Arc::clone(&rejected),
    };

    let shared = SharedEngine::new(Engine::new(config, token).unwrap());
    let _ = slot.set(shared.clone());

    shared
        .open_position(alice, QuoteAmount(1_000_000_000), 2, true)
        .unwrap();
    match rejected.lock().take() {
        Some(e) => println!("  Callback during open was rejected: {}", e),
        None => println!("  Callback was not rejected"),
    }
    println!(
        "  Alice still holds a position: {}",
        !shared.get_position(alice).unwrap().size.is_zero()
    );
}
