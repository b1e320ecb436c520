//! Fixed-point scales and cross-scale arithmetic.
//!
//! Base amounts, quote amounts and prices each carry their own decimal count.
//! Any product that crosses scales (price from reserves, pnl from price times
//! size) goes through [`Scale`] so the rescale factor is derived in exactly one
//! place. Intermediate products are widened to `U256`.

use crate::types::{BaseAmount, Price, QuoteAmount, SignedQuote};
use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest power of ten that still fits in a `u128`.
const MAX_POW10: u32 = 38;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("value cannot be represented at {decimals} decimals")]
    Unrepresentable { decimals: u32 },
}

/// Decimal counts for the two assets and for prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub base_decimals: u32,
    pub quote_decimals: u32,
    pub price_decimals: u32,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            base_decimals: 18,
            quote_decimals: 6,
            price_decimals: 18,
        }
    }
}

impl Scale {
    /// Exponent that moves a `quote / base` ratio onto the price scale, and
    /// equally moves a `price * base` product back down to quote units.
    pub fn cross_exponent(&self) -> Result<u32, MathError> {
        self.price_decimals
            .checked_add(self.base_decimals)
            .and_then(|sum| sum.checked_sub(self.quote_decimals))
            .filter(|exp| *exp <= MAX_POW10)
            .ok_or(MathError::Unrepresentable {
                decimals: self.quote_decimals,
            })
    }

    /// Multiplier applied to `quote` before dividing by `base` in [`Scale::price`].
    pub fn price_factor(&self) -> Result<U256, MathError> {
        pow10(self.cross_exponent()?)
    }

    /// Divisor applied to `price_delta * size` to land in quote units
    /// (`10^30` for 18-decimal prices, 18-decimal base, 6-decimal quote).
    pub fn pnl_divisor(&self) -> Result<U256, MathError> {
        pow10(self.cross_exponent()?)
    }

    // price = quote * 10^(p + b - q) / base
    pub fn price(&self, quote: QuoteAmount, base: BaseAmount) -> Result<Price, MathError> {
        let scaled = mul_div(U256::from(quote.raw()), self.price_factor()?, U256::from(base.raw()))?;
        narrow(scaled).map(Price)
    }

    /// `(price_delta * size) / 10^(p + b - q)` with the sign applied afterwards.
    pub fn pnl(
        &self,
        negative: bool,
        price_delta: u128,
        size: BaseAmount,
    ) -> Result<SignedQuote, MathError> {
        let magnitude = mul_div(
            U256::from(price_delta),
            U256::from(size.raw()),
            self.pnl_divisor()?,
        )?;
        SignedQuote::from_magnitude(negative, narrow(magnitude)?)
    }

    pub fn base_from_decimal(&self, value: Decimal) -> Result<BaseAmount, MathError> {
        from_decimal(value, self.base_decimals).map(BaseAmount)
    }

    pub fn quote_from_decimal(&self, value: Decimal) -> Result<QuoteAmount, MathError> {
        from_decimal(value, self.quote_decimals).map(QuoteAmount)
    }

    pub fn base_to_decimal(&self, amount: BaseAmount) -> Result<Decimal, MathError> {
        to_decimal(amount.raw(), false, self.base_decimals)
    }

    pub fn quote_to_decimal(&self, amount: QuoteAmount) -> Result<Decimal, MathError> {
        to_decimal(amount.raw(), false, self.quote_decimals)
    }

    pub fn signed_quote_to_decimal(&self, amount: SignedQuote) -> Result<Decimal, MathError> {
        to_decimal(amount.raw().unsigned_abs(), amount.is_negative(), self.quote_decimals)
    }

    pub fn price_to_decimal(&self, price: Price) -> Result<Decimal, MathError> {
        to_decimal(price.raw(), false, self.price_decimals)
    }
}

pub fn pow10(exp: u32) -> Result<U256, MathError> {
    10u128
        .checked_pow(exp)
        .map(U256::from)
        .ok_or(MathError::Overflow)
}

/// `a * b / d`, truncating, with a 256-bit intermediate.
pub fn mul_div(a: U256, b: U256, d: U256) -> Result<U256, MathError> {
    if d.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    Ok(product / d)
}

pub fn narrow(value: U256) -> Result<u128, MathError> {
    if value > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(value.to::<u128>())
}

fn from_decimal(value: Decimal, decimals: u32) -> Result<u128, MathError> {
    if value.is_sign_negative() {
        return Err(MathError::Underflow);
    }
    let mut truncated = value.round_dp_with_strategy(decimals, RoundingStrategy::ToZero);
    truncated.rescale(decimals);
    // rescale silently caps the scale when the mantissa would not fit
    if truncated.scale() != decimals {
        return Err(MathError::Unrepresentable { decimals });
    }
    u128::try_from(truncated.mantissa()).map_err(|_| MathError::Overflow)
}

fn to_decimal(raw: u128, negative: bool, decimals: u32) -> Result<Decimal, MathError> {
    let mantissa = i128::try_from(raw).map_err(|_| MathError::Overflow)?;
    let signed = if negative { -mantissa } else { mantissa };
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map_err(|_| MathError::Unrepresentable { decimals })
}
