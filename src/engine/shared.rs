// 8.3 engine/shared.rs: cloneable handle for callers that share one engine.
// state-changing calls hold the lock for the whole operation. a call that comes
// back in on the same thread while one is running (a token callback, say) is
// rejected with Reentrancy instead of deadlocking or seeing half-applied state.

use super::core::Engine;
use super::results::{CloseResult, EngineError, LiquidationResult, OpenResult};
use crate::gateway::QuoteToken;
use crate::position::PositionView;
use crate::types::{Price, QuoteAmount, TraderId};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::warn;

pub struct SharedEngine<T> {
    inner: Arc<ReentrantMutex<RefCell<Engine<T>>>>,
}

impl<T> Clone for SharedEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: QuoteToken> SharedEngine<T> {
    pub fn new(engine: Engine<T>) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(engine))),
        }
    }

    pub fn open_position(
        &self,
        trader: TraderId,
        margin: QuoteAmount,
        leverage: u8,
        is_long: bool,
    ) -> Result<OpenResult, EngineError> {
        self.with_mut(|engine| engine.open_position(trader, margin, leverage, is_long))
    }

    pub fn close_position(&self, trader: TraderId) -> Result<CloseResult, EngineError> {
        self.with_mut(|engine| engine.close_position(trader))
    }

    pub fn liquidate(
        &self,
        trader: TraderId,
        liquidator: TraderId,
    ) -> Result<LiquidationResult, EngineError> {
        self.with_mut(|engine| engine.liquidate(trader, liquidator))
    }

    pub fn current_price(&self) -> Result<Price, EngineError> {
        self.with(|engine| engine.current_price())?
    }

    pub fn get_position(&self, trader: TraderId) -> Result<PositionView, EngineError> {
        self.with(|engine| engine.get_position(trader))?
    }

    pub fn can_liquidate(&self, trader: TraderId) -> bool {
        self.with(|engine| engine.can_liquidate(trader))
            .unwrap_or(false)
    }

    /// Run a read-only closure against the engine.
    pub fn with<R>(&self, f: impl FnOnce(&Engine<T>) -> R) -> Result<R, EngineError> {
        let guard = self.inner.lock();
        let engine = guard.try_borrow().map_err(|_| EngineError::Reentrancy)?;
        Ok(f(&engine))
    }

    /// Run a closure with exclusive access. Fails if a mutation is already in flight.
    pub fn with_mut<R>(
        &self,
        f: impl FnOnce(&mut Engine<T>) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let guard = self.inner.lock();
        let mut engine = guard.try_borrow_mut().map_err(|_| {
            warn!("re-entrant engine call rejected");
            EngineError::Reentrancy
        })?;
        f(&mut engine)
    }
}
