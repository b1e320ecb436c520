// 8.0 engine/core.rs: main engine. owns the virtual market, every position record,
// and the gateway to the real quote token.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::config::Config;
use crate::events::{Event, EventId, EventPayload};
use crate::gateway::{InMemoryToken, QuoteToken, TransferGateway};
use crate::liquidation::LiquidationParams;
use crate::market::{MarketConfig, OpenInterest};
use crate::position::{Position, PositionView};
use crate::types::{Address, Price, QuoteAmount, Timestamp, TraderId};
use crate::vamm::VirtualMarket;
use std::collections::HashMap;
use tracing::{debug, info};

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine<T = InMemoryToken> {
    pub(super) config: EngineConfig,
    pub(super) market_config: MarketConfig,
    pub(super) liquidation: LiquidationParams,
    pub(super) market: VirtualMarket,
    pub(super) positions: HashMap<TraderId, Position>,
    pub(super) gateway: TransferGateway<T>,
    pub(super) open_interest: OpenInterest,
    // margin kept by the engine after liquidation rewards
    pub(super) forfeited_margin: QuoteAmount,
    // realized losses past what the trader's margin covered
    pub(super) uncollected_losses: QuoteAmount,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl<T: QuoteToken> Engine<T> {
    pub fn new(config: Config, token: T) -> Result<Self, EngineError> {
        config.validate()?;
        let market = config.market.build_market()?;

        info!(
            market = %config.market.name,
            base = %market.virtual_base(),
            quote = %market.virtual_quote(),
            engine_account = %config.engine.engine_account,
            "engine started"
        );

        Ok(Self {
            gateway: TransferGateway::new(token, config.engine.engine_account),
            config: config.engine,
            market_config: config.market,
            liquidation: config.liquidation,
            market,
            positions: HashMap::new(),
            open_interest: OpenInterest::default(),
            forfeited_margin: QuoteAmount::ZERO,
            uncollected_losses: QuoteAmount::ZERO,
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        })
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    /// Virtual price implied by the reserves, quote per base at price decimals.
    pub fn current_price(&self) -> Result<Price, EngineError> {
        Ok(self.market.current_price()?)
    }

    /// Snapshot of a trader's position with pnl at the current price.
    /// Unknown or closed positions come back as all zeroes.
    pub fn get_position(&self, trader: TraderId) -> Result<PositionView, EngineError> {
        match self.positions.get(&trader).filter(|p| p.is_open()) {
            Some(position) => Ok(PositionView::from_position(
                position,
                self.current_price()?,
                self.market.scale(),
            )?),
            None => Ok(PositionView::empty()),
        }
    }

    pub fn position(&self, trader: TraderId) -> Option<&Position> {
        self.positions.get(&trader)
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(|p| p.is_open())
    }

    pub fn market(&self) -> &VirtualMarket {
        &self.market
    }

    pub fn market_config(&self) -> &MarketConfig {
        &self.market_config
    }

    pub fn liquidation_params(&self) -> &LiquidationParams {
        &self.liquidation
    }

    pub fn open_interest(&self) -> OpenInterest {
        self.open_interest
    }

    pub fn engine_account(&self) -> Address {
        self.gateway.engine_account()
    }

    pub fn gateway(&self) -> &TransferGateway<T> {
        &self.gateway
    }

    pub fn token(&self) -> &T {
        self.gateway.token()
    }

    pub fn token_mut(&mut self) -> &mut T {
        self.gateway.token_mut()
    }

    /// Real quote held by the engine account.
    pub fn engine_balance(&self) -> QuoteAmount {
        self.gateway.engine_balance()
    }

    pub fn forfeited_margin(&self) -> QuoteAmount {
        self.forfeited_margin
    }

    pub fn uncollected_losses(&self) -> QuoteAmount {
        self.uncollected_losses
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            info!(event_id = event.id.0, payload = ?event.payload, "event");
        } else {
            debug!(event_id = event.id.0, payload = ?event.payload, "event");
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
