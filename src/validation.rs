use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

use crate::account::{Account, AccountUpdate};

/// Smallest deposit accepted when opening an account, in currency units.
pub const MINIMUM_OPENING_DEPOSIT: u64 = 500_000;

/// Regulatory bounds on a bank's member roster.
pub const MIN_BANK_MEMBERS: usize = 5;
pub const MAX_BANK_MEMBERS: usize = 20;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("opening deposit of {deposit} is below the required minimum of {minimum}")]
    InsufficientInitialDeposit { deposit: Decimal, minimum: Decimal },
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },
    #[error("a bank needs at least {minimum} member accounts, got {count}")]
    BankTooSmall { count: usize, minimum: usize },
    #[error("a bank may hold at most {maximum} member accounts, got {count}")]
    BankTooLarge { count: usize, maximum: usize },
    #[error("account set must not be empty")]
    EmptyAccountSet,
    #[error("stored account does not match the requested update: {field}")]
    InconsistentUpdate { field: &'static str },
}

pub fn minimum_opening_deposit() -> Decimal {
    Decimal::from(MINIMUM_OPENING_DEPOSIT)
}

pub fn check_minimum_deposit(deposit: Decimal) -> Result<(), ValidationError> {
    let minimum = minimum_opening_deposit();
    if deposit < minimum {
        return Err(ValidationError::InsufficientInitialDeposit { deposit, minimum });
    }
    Ok(())
}

pub fn check_positive_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::zero() {
        return Err(ValidationError::NonPositiveAmount { amount });
    }
    Ok(())
}

pub fn check_bank_size(count: usize) -> Result<(), ValidationError> {
    if count < MIN_BANK_MEMBERS {
        return Err(ValidationError::BankTooSmall {
            count,
            minimum: MIN_BANK_MEMBERS,
        });
    }
    if count > MAX_BANK_MEMBERS {
        return Err(ValidationError::BankTooLarge {
            count,
            maximum: MAX_BANK_MEMBERS,
        });
    }
    Ok(())
}

/// Post-condition of an account update: the stored record must agree with
/// what the caller asked for.
pub fn check_request_consistency(
    account: &Account,
    request: &AccountUpdate,
) -> Result<(), ValidationError> {
    if account.number() != request.account_number {
        return Err(ValidationError::InconsistentUpdate {
            field: "account number",
        });
    }
    if account.owner() != Some(request.owner) {
        return Err(ValidationError::InconsistentUpdate { field: "owner" });
    }
    Ok(())
}
