//! Engine configuration options.

use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Log every emitted event at info instead of debug.
    pub verbose: bool,
    /// Account the engine holds pooled margin under. Traders approve this address.
    pub engine_account: Address,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            verbose: false,
            engine_account: Address::repeat_byte(0xee),
        }
    }
}
