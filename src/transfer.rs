use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::account::Account;
use crate::bank::Bank;
use crate::error::{LedgerError, LedgerResult, lock_entity};
use crate::ids::{AccountId, AtmId, BankId};
use crate::ledger::AccountLedger;
use crate::repository::BankRepositoryManager;
use crate::transaction::{TransactionKind, TransactionLog};
use crate::validation;

/// Coordinates the multi-entity movements: account-to-account transfers and
/// bank<->ATM cash moves. Account transfers produce a linked pair of
/// TransferOut/TransferIn entries, appended while both account locks are
/// held so the pair is observed atomically.
pub struct TransferCoordinator {
    ledger: Arc<AccountLedger>,
    banks: Arc<BankRepositoryManager>,
    log: Arc<TransactionLog>,
}

impl TransferCoordinator {
    pub fn new(
        ledger: Arc<AccountLedger>,
        banks: Arc<BankRepositoryManager>,
        log: Arc<TransactionLog>,
    ) -> Self {
        Self { ledger, banks, log }
    }

    /// Moves `amount` between two distinct active accounts. Both sides are
    /// validated before either balance changes; on any failure neither
    /// balance moves and nothing is logged.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> LedgerResult<(Account, Account)> {
        if from == to {
            return Err(LedgerError::SameAccountTransfer);
        }
        validation::check_positive_amount(amount)?;

        let from_handle = self.ledger.handle(from)?;
        let to_handle = self.ledger.handle(to)?;

        // both locks are taken in ascending id order, so a concurrent
        // reverse transfer cannot deadlock against this one
        let from_is_first = from < to;
        let (first_handle, second_handle) = if from_is_first {
            (&from_handle, &to_handle)
        } else {
            (&to_handle, &from_handle)
        };
        let mut first = lock_entity(first_handle, "account")?;
        let mut second = lock_entity(second_handle, "account")?;
        let (debtor, creditor) = if from_is_first {
            (&mut *first, &mut *second)
        } else {
            (&mut *second, &mut *first)
        };

        let out_event = debtor.handle_transfer_out(amount)?;
        let in_event = creditor.handle_transfer_in(amount)?;
        debtor.apply(&out_event);
        creditor.apply(&in_event);
        self.log.append(
            from,
            out_event.amount(),
            TransactionKind::from(out_event.kind()),
            Some(to),
        );
        self.log.append(
            to,
            in_event.amount(),
            TransactionKind::from(in_event.kind()),
            Some(from),
        );
        debug!(%from, %to, %amount, "transfer committed");
        Ok((debtor.clone(), creditor.clone()))
    }

    /// Repository -> ATM cash movement; the repository manager owns both
    /// balances and their lock order.
    pub fn deposit_to_atm(
        &self,
        bank: BankId,
        atm: AtmId,
        amount: Decimal,
    ) -> LedgerResult<Bank> {
        self.banks.deposit_to_atm(bank, atm, amount)
    }

    /// ATM -> repository cash movement.
    pub fn withdrawal_from_atm(
        &self,
        bank: BankId,
        atm: AtmId,
        amount: Decimal,
    ) -> LedgerResult<Bank> {
        self.banks.withdrawal_from_atm(bank, atm, amount)
    }
}
