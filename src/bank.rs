use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

use crate::ids::{AccountId, AtmId, BankId, BranchId};

#[derive(Debug, Error)]
pub enum BankError {
    #[error("bank repository holds {available}, cannot move {requested}")]
    InsufficientRepositoryFunds {
        requested: Decimal,
        available: Decimal,
    },
    #[error("ATM holds {available} in cash, cannot move {requested}")]
    InsufficientAtmCash {
        requested: Decimal,
        available: Decimal,
    },
    #[error("account {account} is already a member of bank {bank}")]
    AlreadyMember { account: AccountId, bank: BankId },
    #[error("ATM {atm} does not belong to bank {bank}")]
    ForeignAtm { atm: AtmId, bank: BankId },
}

/// A branch of a bank and the ATMs installed at it.
#[derive(Debug, Clone)]
pub struct Branch {
    id: BranchId,
    bank: BankId,
    name: String,
    atms: Vec<AtmId>,
}

impl Branch {
    pub fn id(&self) -> BranchId {
        self.id
    }

    pub fn bank(&self) -> BankId {
        self.bank
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atms(&self) -> &[AtmId] {
        &self.atms
    }

    pub(crate) fn install_atm(&mut self, atm: AtmId) {
        self.atms.push(atm);
    }
}

/// Cash state of a single ATM. Mutated only through the repository manager's
/// bank<->ATM movements.
#[derive(Debug, Clone)]
pub struct Atm {
    id: AtmId,
    branch: BranchId,
    cash: Decimal,
}

impl Atm {
    pub(crate) fn new(branch: BranchId) -> Self {
        Self {
            id: AtmId::new(),
            branch,
            cash: Decimal::zero(),
        }
    }

    pub fn id(&self) -> AtmId {
        self.id
    }

    pub fn branch(&self) -> BranchId {
        self.branch
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub(crate) fn deposit_cash(&mut self, amount: Decimal) {
        self.cash += amount;
    }

    pub(crate) fn withdraw_cash(&mut self, amount: Decimal) -> Result<(), BankError> {
        if self.cash < amount {
            return Err(BankError::InsufficientAtmCash {
                requested: amount,
                available: self.cash,
            });
        }
        self.cash -= amount;
        Ok(())
    }
}

/// A bank: member-account roster, branches, and the central cash repository
/// all of its ATMs are replenished from.
#[derive(Debug, Clone)]
pub struct Bank {
    id: BankId,
    name: String,
    accounts: Vec<AccountId>,
    branches: Vec<Branch>,
    repository_balance: Decimal,
}

impl Bank {
    /// Roster bounds are the caller's concern; the entity only holds state.
    pub(crate) fn new(name: impl Into<String>, accounts: Vec<AccountId>) -> Self {
        Self {
            id: BankId::new(),
            name: name.into(),
            accounts,
            branches: Vec::new(),
            repository_balance: Decimal::zero(),
        }
    }

    pub fn id(&self) -> BankId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn repository_balance(&self) -> Decimal {
        self.repository_balance
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.iter().find(|branch| branch.id == id)
    }

    pub(crate) fn branch_mut(&mut self, id: BranchId) -> Option<&mut Branch> {
        self.branches.iter_mut().find(|branch| branch.id == id)
    }

    pub fn has_atm(&self, atm: AtmId) -> bool {
        self.branches.iter().any(|branch| branch.atms.contains(&atm))
    }

    pub(crate) fn enroll(&mut self, account: AccountId) {
        self.accounts.push(account);
    }

    pub(crate) fn add_branch(&mut self, name: impl Into<String>) -> BranchId {
        let branch = Branch {
            id: BranchId::new(),
            bank: self.id,
            name: name.into(),
            atms: Vec::new(),
        };
        let id = branch.id;
        self.branches.push(branch);
        id
    }

    pub(crate) fn deposit_repository(&mut self, amount: Decimal) {
        self.repository_balance += amount;
    }

    pub(crate) fn withdraw_repository(&mut self, amount: Decimal) -> Result<(), BankError> {
        if self.repository_balance < amount {
            return Err(BankError::InsufficientRepositoryFunds {
                requested: amount,
                available: self.repository_balance,
            });
        }
        self.repository_balance -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    #[test]
    fn repository_withdrawal_requires_funds() {
        let mut bank = Bank::new("First", vec![]);
        bank.deposit_repository(Decimal::from_u32(100).unwrap());

        let err = bank
            .withdraw_repository(Decimal::from_u32(101).unwrap())
            .unwrap_err();
        assert!(matches!(err, BankError::InsufficientRepositoryFunds { .. }));
        assert_eq!(bank.repository_balance(), Decimal::from_u32(100).unwrap());

        bank.withdraw_repository(Decimal::from_u32(40).unwrap())
            .unwrap();
        assert_eq!(bank.repository_balance(), Decimal::from_u32(60).unwrap());
    }

    #[test]
    fn atm_cash_cannot_go_negative() {
        let mut atm = Atm::new(BranchId::new());
        atm.deposit_cash(Decimal::from_u32(50).unwrap());

        let err = atm.withdraw_cash(Decimal::from_u32(51).unwrap()).unwrap_err();
        assert!(matches!(err, BankError::InsufficientAtmCash { .. }));
        assert_eq!(atm.cash(), Decimal::from_u32(50).unwrap());
    }

    #[test]
    fn branches_track_their_atms() {
        let mut bank = Bank::new("First", vec![]);
        let branch_id = bank.add_branch("Downtown");
        let atm = Atm::new(branch_id);
        bank.branch_mut(branch_id).unwrap().install_atm(atm.id());

        assert!(bank.has_atm(atm.id()));
        assert!(!bank.has_atm(AtmId::new()));
        assert_eq!(bank.branch(branch_id).unwrap().atms().len(), 1);
    }
}
