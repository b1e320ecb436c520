// 6.0 gateway.rs: the only path real quote tokens move through.
// QuoteToken is the external ERC20-style interface. TransferGateway binds it to the
// engine's own account. InMemoryToken is a MOCKED token: plain balance maps, no chain.

use crate::types::{Address, QuoteAmount};
use std::collections::{HashMap, HashSet};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("insufficient balance for {owner}: available {available}, requested {requested}")]
    InsufficientBalance {
        owner: Address,
        available: QuoteAmount,
        requested: QuoteAmount,
    },

    #[error("insufficient allowance from {owner} to {spender}: approved {approved}, requested {requested}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        approved: QuoteAmount,
        requested: QuoteAmount,
    },

    #[error("account {0} is frozen")]
    Frozen(Address),

    #[error("token rejected transfer: {0}")]
    Rejected(String),
}

// External token interface. `spender`/`sender` stand in for the calling contract.
pub trait QuoteToken {
    fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        recipient: Address,
        amount: QuoteAmount,
    ) -> Result<(), TransferError>;

    fn transfer(
        &mut self,
        sender: Address,
        recipient: Address,
        amount: QuoteAmount,
    ) -> Result<(), TransferError>;

    fn balance_of(&self, owner: Address) -> QuoteAmount;

    fn allowance(&self, owner: Address, spender: Address) -> QuoteAmount;
}

/** 6.1: thin adapter the ledger calls at trade boundaries */
#[derive(Debug)]
pub struct TransferGateway<T> {
    token: T,
    engine_account: Address,
    total_pulled: QuoteAmount,
    total_paid: QuoteAmount,
}

impl<T: QuoteToken> TransferGateway<T> {
    pub fn new(token: T, engine_account: Address) -> Self {
        Self {
            token,
            engine_account,
            total_pulled: QuoteAmount::ZERO,
            total_paid: QuoteAmount::ZERO,
        }
    }

    pub fn engine_account(&self) -> Address {
        self.engine_account
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    /// Quote the engine currently holds (pooled margin).
    pub fn engine_balance(&self) -> QuoteAmount {
        self.token.balance_of(self.engine_account)
    }

    // requires trader to have approved the engine account for at least `amount`
    pub fn pull_margin(&mut self, trader: Address, amount: QuoteAmount) -> Result<(), TransferError> {
        self.token
            .transfer_from(self.engine_account, trader, self.engine_account, amount)
            .map_err(|e| {
                warn!(trader = %trader, amount = %amount, error = %e, "margin pull failed");
                e
            })?;
        self.total_pulled = QuoteAmount(self.total_pulled.raw().saturating_add(amount.raw()));
        Ok(())
    }

    pub fn pay_out(&mut self, recipient: Address, amount: QuoteAmount) -> Result<(), TransferError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.token
            .transfer(self.engine_account, recipient, amount)
            .map_err(|e| {
                warn!(recipient = %recipient, amount = %amount, error = %e, "payout failed");
                e
            })?;
        self.total_paid = QuoteAmount(self.total_paid.raw().saturating_add(amount.raw()));
        Ok(())
    }

    pub fn total_pulled(&self) -> QuoteAmount {
        self.total_pulled
    }

    pub fn total_paid(&self) -> QuoteAmount {
        self.total_paid
    }
}

// Mock token for tests and the simulation binary
#[derive(Debug, Default, Clone)]
pub struct InMemoryToken {
    balances: HashMap<Address, QuoteAmount>,
    allowances: HashMap<(Address, Address), QuoteAmount>,
    frozen: HashSet<Address>,
    total_supply: QuoteAmount,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, owner: Address, amount: QuoteAmount) {
        let balance = self.balances.entry(owner).or_default();
        *balance = QuoteAmount(balance.raw().saturating_add(amount.raw()));
        self.total_supply = QuoteAmount(self.total_supply.raw().saturating_add(amount.raw()));
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: QuoteAmount) {
        self.allowances.insert((owner, spender), amount);
    }

    // blacklisted accounts can neither send nor receive
    pub fn set_frozen(&mut self, account: Address, frozen: bool) {
        if frozen {
            self.frozen.insert(account);
        } else {
            self.frozen.remove(&account);
        }
    }

    pub fn total_supply(&self) -> QuoteAmount {
        self.total_supply
    }

    fn move_balance(
        &mut self,
        from: Address,
        to: Address,
        amount: QuoteAmount,
    ) -> Result<(), TransferError> {
        for account in [from, to] {
            if self.frozen.contains(&account) {
                return Err(TransferError::Frozen(account));
            }
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                owner: from,
                available,
                requested: amount,
            });
        }

        self.balances.insert(from, QuoteAmount(available.raw() - amount.raw()));
        let to_balance = self.balances.entry(to).or_default();
        *to_balance = QuoteAmount(to_balance.raw() + amount.raw());
        Ok(())
    }
}

impl QuoteToken for InMemoryToken {
    fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        recipient: Address,
        amount: QuoteAmount,
    ) -> Result<(), TransferError> {
        let approved = self.allowance(owner, spender);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                owner,
                spender,
                approved,
                requested: amount,
            });
        }

        self.move_balance(owner, recipient, amount)?;
        self.allowances
            .insert((owner, spender), QuoteAmount(approved.raw() - amount.raw()));
        Ok(())
    }

    fn transfer(
        &mut self,
        sender: Address,
        recipient: Address,
        amount: QuoteAmount,
    ) -> Result<(), TransferError> {
        self.move_balance(sender, recipient, amount)
    }

    fn balance_of(&self, owner: Address) -> QuoteAmount {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> QuoteAmount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn pull_margin_spends_allowance() {
        let engine = addr(0xee);
        let trader = addr(0x01);

        let mut token = InMemoryToken::new();
        token.mint(trader, QuoteAmount(1_000));
        token.approve(trader, engine, QuoteAmount(600));

        let mut gateway = TransferGateway::new(token, engine);
        gateway.pull_margin(trader, QuoteAmount(400)).unwrap();

        assert_eq!(gateway.engine_balance(), QuoteAmount(400));
        assert_eq!(gateway.token().balance_of(trader), QuoteAmount(600));
        assert_eq!(gateway.token().allowance(trader, engine), QuoteAmount(200));
        assert_eq!(gateway.total_pulled(), QuoteAmount(400));
    }

    #[test]
    fn pull_margin_without_approval_fails() {
        let engine = addr(0xee);
        let trader = addr(0x01);

        let mut token = InMemoryToken::new();
        token.mint(trader, QuoteAmount(1_000));

        let mut gateway = TransferGateway::new(token, engine);
        let err = gateway.pull_margin(trader, QuoteAmount(1)).unwrap_err();

        assert!(matches!(err, TransferError::InsufficientAllowance { .. }));
        assert_eq!(gateway.token().balance_of(trader), QuoteAmount(1_000));
        assert_eq!(gateway.total_pulled(), QuoteAmount::ZERO);
    }

    #[test]
    fn pay_out_checks_engine_balance() {
        let engine = addr(0xee);
        let trader = addr(0x01);

        let mut token = InMemoryToken::new();
        token.mint(engine, QuoteAmount(100));
        let mut gateway = TransferGateway::new(token, engine);

        let err = gateway.pay_out(trader, QuoteAmount(101)).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { .. }));

        gateway.pay_out(trader, QuoteAmount(100)).unwrap();
        assert_eq!(gateway.token().balance_of(trader), QuoteAmount(100));
        assert_eq!(gateway.total_paid(), QuoteAmount(100));
    }

    #[test]
    fn zero_payout_skips_token() {
        let engine = addr(0xee);
        let trader = addr(0x01);
        let mut token = InMemoryToken::new();
        token.set_frozen(trader, true);

        let mut gateway = TransferGateway::new(token, engine);
        assert!(gateway.pay_out(trader, QuoteAmount::ZERO).is_ok());
    }

    #[test]
    fn frozen_accounts_cannot_receive() {
        let engine = addr(0xee);
        let trader = addr(0x01);
        let mut token = InMemoryToken::new();
        token.mint(engine, QuoteAmount(100));
        token.set_frozen(trader, true);

        let mut gateway = TransferGateway::new(token, engine);
        assert_eq!(
            gateway.pay_out(trader, QuoteAmount(10)),
            Err(TransferError::Frozen(trader))
        );
        assert_eq!(gateway.engine_balance(), QuoteAmount(100));

        gateway.token_mut().set_frozen(trader, false);
        assert!(gateway.pay_out(trader, QuoteAmount(10)).is_ok());
    }
}
