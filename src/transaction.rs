use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::AccountEventKind;
use crate::ids::{AccountId, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl From<AccountEventKind> for TransactionKind {
    fn from(kind: AccountEventKind) -> Self {
        match kind {
            AccountEventKind::Deposited => Self::Deposit,
            // closing an account sweeps the residual balance out, which the
            // audit trail records as a withdrawal
            AccountEventKind::Withdrawn | AccountEventKind::Closed => Self::Withdrawal,
            AccountEventKind::TransferredOut => Self::TransferOut,
            AccountEventKind::TransferredIn => Self::TransferIn,
        }
    }
}

/// One balance-changing event. Immutable once appended; entries outlive the
/// account they describe.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TransactionId,
    sequence: u64,
    timestamp: DateTime<Utc>,
    amount: Decimal,
    kind: TransactionKind,
    account: AccountId,
    counterparty: Option<AccountId>,
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Position in the owning account's history, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn counterparty(&self) -> Option<AccountId> {
        self.counterparty
    }
}

/// Append-only transaction history, keyed by account. There is no removal
/// API: soft- and hard-deleting an account leaves its entries in place.
#[derive(Debug, Default)]
pub struct TransactionLog {
    entries: RwLock<HashMap<AccountId, Vec<Transaction>>>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry and returns it. Callers serialise appends for one
    /// account by holding that account's lock, which makes the per-account
    /// sequence a total order.
    pub fn append(
        &self,
        account: AccountId,
        amount: Decimal,
        kind: TransactionKind,
        counterparty: Option<AccountId>,
    ) -> Transaction {
        let mut entries = self.entries.write();
        let history = entries.entry(account).or_default();
        let transaction = Transaction {
            id: TransactionId::new(),
            sequence: history.len() as u64 + 1,
            timestamp: Utc::now(),
            amount,
            kind,
            account,
            counterparty,
        };
        history.push(transaction.clone());
        transaction
    }

    /// Entries for one account in causal order. Empty when the account has
    /// never had a balance change.
    pub fn history(&self, account: AccountId) -> Vec<Transaction> {
        self.entries
            .read()
            .get(&account)
            .cloned()
            .unwrap_or_default()
    }

    pub fn entry_count(&self, account: AccountId) -> usize {
        self.entries.read().get(&account).map_or(0, Vec::len)
    }
}
