use std::fmt::Display;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::account::AccountError;
use crate::bank::BankError;
use crate::validation::ValidationError;

/// How long an operation may wait on a single entity lock before it is
/// reported back as a retryable conflict instead of blocking the caller.
pub(crate) const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },
    #[error("cannot transfer between an account and itself")]
    SameAccountTransfer,
    #[error("timed out waiting for the {entity} lock; the operation may be retried")]
    ConcurrencyConflict { entity: &'static str },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    pub fn account_not_found(id: impl Display) -> Self {
        Self::NotFound {
            entity: "account",
            id: id.to_string(),
        }
    }

    pub fn owner_not_found(id: impl Display) -> Self {
        Self::NotFound {
            entity: "owner",
            id: id.to_string(),
        }
    }

    pub fn bank_not_found(id: impl Display) -> Self {
        Self::NotFound {
            entity: "bank",
            id: id.to_string(),
        }
    }

    pub fn branch_not_found(id: impl Display) -> Self {
        Self::NotFound {
            entity: "branch",
            id: id.to_string(),
        }
    }

    pub fn atm_not_found(id: impl Display) -> Self {
        Self::NotFound {
            entity: "ATM",
            id: id.to_string(),
        }
    }

    pub fn duplicate_account_number(number: impl Display) -> Self {
        Self::Duplicate {
            entity: "account number",
            id: number.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Conflicts are the only class the caller is expected to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Bounded lock acquisition for a shared entity. A timeout becomes a
/// [`LedgerError::ConcurrencyConflict`] rather than an indefinite block.
pub(crate) fn lock_entity<'a, T>(
    mutex: &'a Mutex<T>,
    entity: &'static str,
) -> LedgerResult<MutexGuard<'a, T>> {
    mutex
        .try_lock_for(LOCK_TIMEOUT)
        .ok_or(LedgerError::ConcurrencyConflict { entity })
}
