use rust_decimal::{Decimal, prelude::Zero};
use serde::Serialize;
use thiserror::Error;

use crate::ids::{AccountId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Deleted,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },
    #[error("account is deleted, no further operations are allowed")]
    AccountInactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
    TransferredOut,
    TransferredIn,
    Closed,
}

/// A validated balance change. Produced by the `handle_*` methods, applied
/// with [`Account::apply`]; the event is the source of truth once created.
#[derive(Debug)]
pub struct AccountEvent {
    amount: Decimal,
    kind: AccountEventKind,
}

impl AccountEvent {
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> AccountEventKind {
        self.kind
    }
}

/// A customer owning one or more accounts.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// Requested target state for an account update. After the change is
/// applied, the stored record is checked back against this request.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub account_number: String,
    pub owner: UserId,
}

#[derive(Debug, Clone)]
pub struct Account {
    id: AccountId,
    number: String,
    owner: Option<UserId>,
    status: AccountStatus,
    balance: Decimal,
}

impl Account {
    /// Opens an account with a zero balance; the opening deposit arrives as
    /// a regular deposit event so it shows up in the transaction history.
    pub fn open(number: impl Into<String>, owner: UserId) -> Self {
        Self {
            id: AccountId::new(),
            number: number.into(),
            owner: Some(owner),
            status: AccountStatus::Active,
            balance: Decimal::zero(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub(crate) fn set_number(&mut self, number: String) {
        self.number = number;
    }

    pub(crate) fn set_owner(&mut self, owner: UserId) {
        self.owner = Some(owner);
    }

    fn ensure_active(&self) -> Result<(), AccountError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(AccountError::AccountInactive)
        }
    }

    fn ensure_funds(&self, requested: Decimal) -> Result<(), AccountError> {
        if self.balance >= requested {
            Ok(())
        } else {
            Err(AccountError::InsufficientFunds {
                requested,
                available: self.balance,
            })
        }
    }

    pub fn handle_deposit(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        self.ensure_active()?;
        Ok(AccountEvent {
            amount,
            kind: AccountEventKind::Deposited,
        })
    }

    pub fn handle_withdrawal(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        self.ensure_active()?;
        self.ensure_funds(amount)?;
        Ok(AccountEvent {
            amount,
            kind: AccountEventKind::Withdrawn,
        })
    }

    pub fn handle_transfer_out(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        self.ensure_active()?;
        self.ensure_funds(amount)?;
        Ok(AccountEvent {
            amount,
            kind: AccountEventKind::TransferredOut,
        })
    }

    pub fn handle_transfer_in(&self, amount: Decimal) -> Result<AccountEvent, AccountError> {
        self.ensure_active()?;
        Ok(AccountEvent {
            amount,
            kind: AccountEventKind::TransferredIn,
        })
    }

    /// The close event carries the residual balance, so the zeroing is
    /// explainable from the history.
    pub fn handle_close(&self) -> Result<AccountEvent, AccountError> {
        self.ensure_active()?;
        Ok(AccountEvent {
            amount: self.balance,
            kind: AccountEventKind::Closed,
        })
    }

    pub fn apply(&mut self, event: &AccountEvent) {
        match event.kind {
            AccountEventKind::Deposited | AccountEventKind::TransferredIn => {
                self.balance += event.amount;
            }
            AccountEventKind::Withdrawn | AccountEventKind::TransferredOut => {
                self.balance -= event.amount;
            }
            AccountEventKind::Closed => {
                self.balance = Decimal::zero();
                self.owner = None;
                self.status = AccountStatus::Deleted;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    fn active_account(balance: u32) -> Account {
        let mut acc = Account::open("ACC-1", UserId::new());
        let evt = acc
            .handle_deposit(Decimal::from_u32(balance).unwrap())
            .unwrap();
        acc.apply(&evt);
        acc
    }

    #[test]
    fn apply_events() {
        let mut acc = Account::open("ACC-1", UserId::new());
        acc.apply(&AccountEvent {
            amount: Decimal::from_u32(10).unwrap(),
            kind: AccountEventKind::Deposited,
        });
        assert_eq!(acc.balance(), Decimal::from_u32(10).unwrap());

        acc.apply(&AccountEvent {
            amount: Decimal::from_u32(3).unwrap(),
            kind: AccountEventKind::Withdrawn,
        });
        assert_eq!(acc.balance(), Decimal::from_u32(7).unwrap());

        acc.apply(&AccountEvent {
            amount: Decimal::from_u32(2).unwrap(),
            kind: AccountEventKind::TransferredOut,
        });
        acc.apply(&AccountEvent {
            amount: Decimal::from_u32(4).unwrap(),
            kind: AccountEventKind::TransferredIn,
        });
        assert_eq!(acc.balance(), Decimal::from_u32(9).unwrap());
    }

    #[test]
    fn withdrawal_requires_funds() {
        let acc = active_account(5);
        let err = acc
            .handle_withdrawal(Decimal::from_u32(6).unwrap())
            .unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { .. }));
        // the failed handle must not have touched the balance
        assert_eq!(acc.balance(), Decimal::from_u32(5).unwrap());

        let evt = acc
            .handle_withdrawal(Decimal::from_u32(5).unwrap())
            .unwrap();
        assert_eq!(evt.amount(), Decimal::from_u32(5).unwrap());
        assert_eq!(evt.kind(), AccountEventKind::Withdrawn);
    }

    #[test]
    fn deleted_account_rejects_operations() {
        let mut acc = active_account(10);
        let close = acc.handle_close().unwrap();
        assert_eq!(close.amount(), Decimal::from_u32(10).unwrap());
        acc.apply(&close);

        assert_eq!(acc.status(), AccountStatus::Deleted);
        assert_eq!(acc.balance(), Decimal::zero());
        assert_eq!(acc.owner(), None);

        let err = acc
            .handle_deposit(Decimal::from_u32(1).unwrap())
            .unwrap_err();
        assert!(matches!(err, AccountError::AccountInactive));
        let err = acc.handle_close().unwrap_err();
        assert!(matches!(err, AccountError::AccountInactive));
    }

    #[test]
    fn transfer_out_checks_funds_like_withdrawal() {
        let acc = active_account(8);
        assert!(acc.handle_transfer_out(Decimal::from_u32(9).unwrap()).is_err());
        let evt = acc.handle_transfer_out(Decimal::from_u32(8).unwrap()).unwrap();
        assert_eq!(evt.kind(), AccountEventKind::TransferredOut);
    }
}
