// 8.0: trading engine. opens, closes and liquidates positions against the
// virtual pool and settles margin through the token gateway.
// deterministic: time only moves when the caller moves it.

mod config;
mod core;
mod liquidations;
mod positions;
mod results;
mod shared;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{CloseResult, EngineError, LiquidationResult, OpenResult};
pub use shared::SharedEngine;
