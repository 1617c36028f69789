use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::{Account, AccountStatus};
use crate::bank::{Atm, Bank, Branch};
use crate::ids::{AccountId, AtmId, BankId, BranchId, TransactionId, UserId};
use crate::transaction::{Transaction, TransactionKind};

/// Read model of an account, handed across the external interface instead
/// of the entity itself.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    pub account_number: String,
    pub balance: Decimal,
    pub owner: Option<UserId>,
    pub status: AccountStatus,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id(),
            account_number: account.number().to_owned(),
            balance: account.balance(),
            owner: account.owner(),
            status: account.status(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchView {
    pub id: BranchId,
    pub bank: BankId,
    pub name: String,
    pub atms: Vec<AtmId>,
}

impl From<&Branch> for BranchView {
    fn from(branch: &Branch) -> Self {
        Self {
            id: branch.id(),
            bank: branch.bank(),
            name: branch.name().to_owned(),
            atms: branch.atms().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AtmView {
    pub id: AtmId,
    pub branch: BranchId,
    pub cash_balance: Decimal,
}

impl From<&Atm> for AtmView {
    fn from(atm: &Atm) -> Self {
        Self {
            id: atm.id(),
            branch: atm.branch(),
            cash_balance: atm.cash(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BankView {
    pub id: BankId,
    pub name: String,
    pub repository_balance: Decimal,
    pub accounts: Vec<AccountId>,
    pub branches: Vec<BranchView>,
}

impl From<&Bank> for BankView {
    fn from(bank: &Bank) -> Self {
        Self {
            id: bank.id(),
            name: bank.name().to_owned(),
            repository_balance: bank.repository_balance(),
            accounts: bank.accounts().to_vec(),
            branches: bank.branches().iter().map(BranchView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub account: AccountId,
    pub counterparty: Option<AccountId>,
}

impl From<&Transaction> for TransactionView {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id(),
            sequence: transaction.sequence(),
            timestamp: transaction.timestamp(),
            amount: transaction.amount(),
            kind: transaction.kind(),
            account: transaction.account(),
            counterparty: transaction.counterparty(),
        }
    }
}
