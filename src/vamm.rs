// 2.0: the virtual market. two synthetic reserves pinned to a constant product k.
// nothing here is custodied; the reserves only exist to give trades price impact.
// 2.1 has the opening trades, 2.2 the reversals used by close and liquidate.
//
// every mutation is computed first as a ReserveUpdate (pure) and then committed,
// so a failed step never leaves half-moved reserves behind.

use crate::scale::{MathError, Scale};
use crate::types::{BaseAmount, Price, QuoteAmount};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    #[error("insufficient virtual liquidity: requested {requested}, reserve {reserve}")]
    InsufficientVirtualLiquidity { requested: u128, reserve: u128 },

    #[error("trade of {0} quote units moves no base")]
    ZeroBaseDelta(QuoteAmount),

    #[error("reserves must be non-zero")]
    EmptyReserves,

    #[error("math error: {0}")]
    Math(#[from] MathError),
}

/** 2.0.1: reserve snapshot plus the invariant they were solved against */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub virtual_base: BaseAmount,
    pub virtual_quote: QuoteAmount,
    pub invariant_k: U256,
}

/// A computed but not yet applied reserve move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveUpdate {
    pub new_base: BaseAmount,
    pub new_quote: QuoteAmount,
    /// Base that left or entered the pool.
    pub base_delta: BaseAmount,
    /// Quote that left or entered the pool.
    pub quote_delta: QuoteAmount,
}

#[derive(Debug, Clone)]
pub struct VirtualMarket {
    state: MarketState,
    scale: Scale,
}

impl VirtualMarket {
    /// k is fixed here as the exact product of the opening reserves.
    pub fn new(
        virtual_base: BaseAmount,
        virtual_quote: QuoteAmount,
        scale: Scale,
    ) -> Result<Self, MarketError> {
        if virtual_base.is_zero() || virtual_quote.is_zero() {
            return Err(MarketError::EmptyReserves);
        }
        let invariant_k = U256::from(virtual_base.raw())
            .checked_mul(U256::from(virtual_quote.raw()))
            .ok_or(MathError::Overflow)?;

        Ok(Self {
            state: MarketState {
                virtual_base,
                virtual_quote,
                invariant_k,
            },
            scale,
        })
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn virtual_base(&self) -> BaseAmount {
        self.state.virtual_base
    }

    pub fn virtual_quote(&self) -> QuoteAmount {
        self.state.virtual_quote
    }

    pub fn invariant_k(&self) -> U256 {
        self.state.invariant_k
    }

    /// `k - base * quote`. zero at init and after any full round trip,
    /// otherwise the truncation remainder of the last solve.
    pub fn k_residual(&self) -> U256 {
        let product =
            U256::from(self.state.virtual_base.raw()) * U256::from(self.state.virtual_quote.raw());
        self.state.invariant_k.saturating_sub(product)
    }

    pub fn current_price(&self) -> Result<Price, MathError> {
        self.scale
            .price(self.state.virtual_quote, self.state.virtual_base)
    }

    // 2.1: long. quote goes in, base comes out.
    pub fn preview_buy_quote(&self, notional: QuoteAmount) -> Result<ReserveUpdate, MarketError> {
        let new_quote = self
            .state
            .virtual_quote
            .checked_add(notional)?;
        let new_base = self.solve_base(new_quote)?;
        let base_delta = self
            .state
            .virtual_base
            .raw()
            .checked_sub(new_base.raw())
            .filter(|delta| *delta > 0)
            .ok_or(MarketError::ZeroBaseDelta(notional))?;

        Ok(ReserveUpdate {
            new_base,
            new_quote,
            base_delta: BaseAmount(base_delta),
            quote_delta: notional,
        })
    }

    pub fn apply_buy_quote(&mut self, notional: QuoteAmount) -> Result<BaseAmount, MarketError> {
        let update = self.preview_buy_quote(notional)?;
        self.commit(&update);
        Ok(update.base_delta)
    }

    // 2.1.1: short. quote comes out, base goes in.
    pub fn preview_sell_quote(&self, notional: QuoteAmount) -> Result<ReserveUpdate, MarketError> {
        let reserve = self.state.virtual_quote;
        if notional >= reserve {
            return Err(MarketError::InsufficientVirtualLiquidity {
                requested: notional.raw(),
                reserve: reserve.raw(),
            });
        }
        let new_quote = QuoteAmount(reserve.raw() - notional.raw());
        let new_base = self.solve_base(new_quote)?;
        let base_delta = new_base
            .raw()
            .checked_sub(self.state.virtual_base.raw())
            .filter(|delta| *delta > 0)
            .ok_or(MarketError::ZeroBaseDelta(notional))?;

        Ok(ReserveUpdate {
            new_base,
            new_quote,
            base_delta: BaseAmount(base_delta),
            quote_delta: notional,
        })
    }

    pub fn apply_sell_quote(&mut self, notional: QuoteAmount) -> Result<BaseAmount, MarketError> {
        let update = self.preview_sell_quote(notional)?;
        self.commit(&update);
        Ok(update.base_delta)
    }

    // 2.2: undo a long. base returns to the pool, quote_delta is what the pool pays out.
    pub fn preview_reverse_short(&self, base_amount: BaseAmount) -> Result<ReserveUpdate, MarketError> {
        let new_base = BaseAmount(
            self.state
                .virtual_base
                .raw()
                .checked_add(base_amount.raw())
                .ok_or(MathError::Overflow)?,
        );
        let new_quote = self.solve_quote(new_base)?;
        let quote_delta = self.state.virtual_quote.saturating_sub(new_quote);

        Ok(ReserveUpdate {
            new_base,
            new_quote,
            base_delta: base_amount,
            quote_delta,
        })
    }

    pub fn reverse_short(&mut self, base_amount: BaseAmount) -> Result<QuoteAmount, MarketError> {
        let update = self.preview_reverse_short(base_amount)?;
        self.commit(&update);
        Ok(update.quote_delta)
    }

    // 2.2.1: undo a short. base leaves the pool, quote_delta is what the pool takes in.
    pub fn preview_reverse_long(&self, base_amount: BaseAmount) -> Result<ReserveUpdate, MarketError> {
        let reserve = self.state.virtual_base;
        if base_amount >= reserve {
            return Err(MarketError::InsufficientVirtualLiquidity {
                requested: base_amount.raw(),
                reserve: reserve.raw(),
            });
        }
        let new_base = BaseAmount(reserve.raw() - base_amount.raw());
        let new_quote = self.solve_quote(new_base)?;
        let quote_delta = new_quote.saturating_sub(self.state.virtual_quote);

        Ok(ReserveUpdate {
            new_base,
            new_quote,
            base_delta: base_amount,
            quote_delta,
        })
    }

    pub fn reverse_long(&mut self, base_amount: BaseAmount) -> Result<QuoteAmount, MarketError> {
        let update = self.preview_reverse_long(base_amount)?;
        self.commit(&update);
        Ok(update.quote_delta)
    }

    pub fn commit(&mut self, update: &ReserveUpdate) {
        self.state.virtual_base = update.new_base;
        self.state.virtual_quote = update.new_quote;
    }

    fn solve_base(&self, quote: QuoteAmount) -> Result<BaseAmount, MarketError> {
        if quote.is_zero() {
            return Err(MathError::DivisionByZero.into());
        }
        let base = self.state.invariant_k / U256::from(quote.raw());
        Ok(BaseAmount(crate::scale::narrow(base)?))
    }

    fn solve_quote(&self, base: BaseAmount) -> Result<QuoteAmount, MarketError> {
        if base.is_zero() {
            return Err(MathError::DivisionByZero.into());
        }
        let quote = self.state.invariant_k / U256::from(base.raw());
        Ok(QuoteAmount(crate::scale::narrow(quote)?))
    }
}
