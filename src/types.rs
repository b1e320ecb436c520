// 1.0: all the primitives live here. amounts are raw integers in their asset's native units.
// base amounts and prices carry 18 decimals, quote amounts 6 (see scale.rs for the rescale math).
// each is a newtype so the compiler catches base/quote mixups.

use crate::scale::MathError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use alloy_primitives::Address;

/// Trader, liquidator and engine identities are plain addresses.
pub type TraderId = Address;

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_is_long(is_long: bool) -> Self {
        if is_long {
            Side::Long
        } else {
            Side::Short
        }
    }

    pub fn sign(&self) -> i128 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

// 1.1: base asset units (18 decimals). reserves and |size| use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BaseAmount(pub u128);

impl BaseAmount {
    pub const ZERO: Self = Self(0);

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BaseAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: quote asset units (6 decimals). margin, notional, payouts, rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct QuoteAmount(pub u128);

impl QuoteAmount {
    pub const ZERO: Self = Self(0);

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: QuoteAmount) -> Result<Self, MathError> {
        self.0.checked_add(other.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(&self, other: QuoteAmount) -> Result<Self, MathError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MathError::Underflow)
    }

    pub fn saturating_sub(&self, other: QuoteAmount) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// `self * pct / 100`, truncating.
    pub fn percent(&self, pct: u8) -> Result<Self, MathError> {
        self.0
            .checked_mul(u128::from(pct))
            .map(|v| Self(v / 100))
            .ok_or(MathError::Overflow)
    }
}

impl fmt::Display for QuoteAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: price in quote per base, always 18 decimals regardless of asset scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Price(pub u128);

impl Price {
    pub fn raw(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.4: signed size: positive = long, negative = short, zero = no position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SignedSize(pub i128);

impl SignedSize {
    pub const ZERO: Self = Self(0);

    pub fn from_side(side: Side, amount: BaseAmount) -> Result<Self, MathError> {
        let magnitude = i128::try_from(amount.0).map_err(|_| MathError::Overflow)?;
        Ok(Self(side.sign() * magnitude))
    }

    pub fn raw(&self) -> i128 {
        self.0
    }

    pub fn abs(&self) -> BaseAmount {
        BaseAmount(self.0.unsigned_abs())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_long(&self) -> bool {
        self.0 > 0
    }

    pub fn is_short(&self) -> bool {
        self.0 < 0
    }

    pub fn side(&self) -> Option<Side> {
        if self.is_long() {
            Some(Side::Long)
        } else if self.is_short() {
            Some(Side::Short)
        } else {
            None
        }
    }
}

impl fmt::Display for SignedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.5: signed quote units. pnl lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SignedQuote(pub i128);

impl SignedQuote {
    pub const ZERO: Self = Self(0);

    pub fn from_magnitude(negative: bool, magnitude: u128) -> Result<Self, MathError> {
        let value = i128::try_from(magnitude).map_err(|_| MathError::Overflow)?;
        Ok(Self(if negative { -value } else { value }))
    }

    pub fn raw(&self) -> i128 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn unsigned_abs(&self) -> QuoteAmount {
        QuoteAmount(self.0.unsigned_abs())
    }
}

impl fmt::Display for SignedQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.6: integer leverage multiplier. bounds are policy, checked by LeverageBounds.
// zero only appears on a cleared position record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Leverage(pub u8);

impl Leverage {
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

// 1.7: millisecond timestamp. the engine clock is set by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}
