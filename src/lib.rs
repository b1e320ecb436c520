// vamm-core: leveraged perpetual trading against a virtual constant-product pool.
// the pool holds no real assets. traders post real quote-token margin, take
// leveraged exposure priced by the virtual reserves, and settle margin +/- pnl on close.
// all computation is deterministic integer math with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Address, Side, BaseAmount, QuoteAmount, Price
//   1.5  scale.rs: fixed-point decimals, mul_div over U256
//   2.x  vamm.rs: virtual reserves, x*y=k swaps and reversals
//   3.x  pnl.rs: mark pnl, realized pnl, settlement floor
//   4.x  position.rs: position record and read view
//   5.x  liquidation.rs: threshold and reward policy
//   6.x  gateway.rs: quote token interface + transfer gateway (mocked token)
//   7.x  events.rs: state transition events for audit
//   8.x  engine/: open, close, liquidate, shared handle
//   9.x  config.rs: market, liquidation and engine settings, env presets
//   10.x market.rs: market config + open interest

// core modules
pub mod engine;
pub mod liquidation;
pub mod pnl;
pub mod position;
pub mod scale;
pub mod types;
pub mod vamm;

// integration modules
pub mod config;
pub mod events;
pub mod gateway;
pub mod market;

// re exports for convenience
pub use alloy_primitives::U256;
pub use config::{Config, ConfigError, Environment};
pub use engine::*;
pub use events::*;
pub use gateway::*;
pub use liquidation::*;
pub use market::*;
pub use pnl::*;
pub use position::*;
pub use scale::*;
pub use types::*;
pub use vamm::*;
