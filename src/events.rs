// 7.0: every committed position transition produces an event. informational only:
// nothing inside the engine reads them back. EventPayload lists all event types.

use crate::types::{
    Leverage, Price, QuoteAmount, Side, SignedQuote, SignedSize, Timestamp, TraderId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),
    PositionLiquidated(PositionLiquidatedEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub trader: TraderId,
    pub side: Side,
    pub margin: QuoteAmount,
    pub leverage: Leverage,
    pub notional: QuoteAmount,
    pub size: SignedSize,
    pub entry_price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub trader: TraderId,
    pub size: SignedSize,
    pub exit_notional: QuoteAmount,
    pub realized_pnl: SignedQuote,
    pub payout: QuoteAmount,
    /// loss past margin that was not collected
    pub shortfall: QuoteAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub trader: TraderId,
    pub liquidator: TraderId,
    pub size: SignedSize,
    pub pnl: SignedQuote,
    pub reward: QuoteAmount,
    /// margin left behind after the reward
    pub forfeited: QuoteAmount,
}

impl EventPayload {
    pub fn trader(&self) -> TraderId {
        match self {
            EventPayload::PositionOpened(e) => e.trader,
            EventPayload::PositionClosed(e) => e.trader,
            EventPayload::PositionLiquidated(e) => e.trader,
        }
    }
}
