use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::debug;

use crate::bank::{Atm, Bank, BankError, Branch};
use crate::error::{LedgerError, LedgerResult, lock_entity};
use crate::ids::{AccountId, AtmId, BankId, BranchId};
use crate::validation;
use crate::validation::ValidationError;

/// Owns every bank's central cash repository, member roster and branches,
/// plus all ATM cash state, and the account->bank membership index used to
/// keep an account from being rostered twice.
///
/// Bank<->ATM cash movements always take the bank lock before the ATM lock;
/// nothing acquires them in the other direction, so the order is total.
pub struct BankRepositoryManager {
    banks: RwLock<HashMap<BankId, Arc<Mutex<Bank>>>>,
    atms: RwLock<HashMap<AtmId, Arc<Mutex<Atm>>>>,
    membership: RwLock<HashMap<AccountId, BankId>>,
    branch_index: RwLock<HashMap<BranchId, BankId>>,
}

impl Default for BankRepositoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BankRepositoryManager {
    pub fn new() -> Self {
        Self {
            banks: RwLock::new(HashMap::new()),
            atms: RwLock::new(HashMap::new()),
            membership: RwLock::new(HashMap::new()),
            branch_index: RwLock::new(HashMap::new()),
        }
    }

    fn bank_handle(&self, id: BankId) -> LedgerResult<Arc<Mutex<Bank>>> {
        self.banks
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::bank_not_found(id))
    }

    fn atm_handle(&self, id: AtmId) -> LedgerResult<Arc<Mutex<Atm>>> {
        self.atms
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::atm_not_found(id))
    }

    /// Bank the account is rostered with, if any.
    pub fn bank_of(&self, account: AccountId) -> Option<BankId> {
        self.membership.read().get(&account).copied()
    }

    /// Founds a bank. The initial roster must hold 5 to 20 distinct
    /// accounts that are not members of another bank; anything outside the
    /// bounds is rejected, never truncated. The repository starts empty.
    pub fn create_bank(&self, name: &str, initial_accounts: &[AccountId]) -> LedgerResult<Bank> {
        validation::check_bank_size(initial_accounts.len())?;

        let mut membership = self.membership.write();
        let mut seen = HashSet::new();
        for account in initial_accounts {
            if !seen.insert(*account) {
                return Err(LedgerError::Duplicate {
                    entity: "roster account",
                    id: account.to_string(),
                });
            }
            if let Some(bank) = membership.get(account) {
                return Err(BankError::AlreadyMember {
                    account: *account,
                    bank: *bank,
                }
                .into());
            }
        }

        let bank = Bank::new(name, initial_accounts.to_vec());
        for account in initial_accounts {
            membership.insert(*account, bank.id());
        }
        self.banks
            .write()
            .insert(bank.id(), Arc::new(Mutex::new(bank.clone())));
        debug!(bank = %bank.id(), members = initial_accounts.len(), "bank created");
        Ok(bank)
    }

    /// Grows a bank's roster. The addition must be non-empty, free of
    /// duplicates, and keep the roster within the upper bound.
    pub fn add_accounts(
        &self,
        bank_id: BankId,
        accounts: &[AccountId],
    ) -> LedgerResult<Vec<AccountId>> {
        if accounts.is_empty() {
            return Err(ValidationError::EmptyAccountSet.into());
        }
        let handle = self.bank_handle(bank_id)?;
        let mut bank = lock_entity(&handle, "bank")?;
        let mut membership = self.membership.write();

        let mut seen = HashSet::new();
        for account in accounts {
            if !seen.insert(*account) {
                return Err(LedgerError::Duplicate {
                    entity: "roster account",
                    id: account.to_string(),
                });
            }
            if let Some(existing) = membership.get(account) {
                return Err(BankError::AlreadyMember {
                    account: *account,
                    bank: *existing,
                }
                .into());
            }
        }
        validation::check_bank_size(bank.accounts().len() + accounts.len())?;

        for account in accounts {
            membership.insert(*account, bank_id);
            bank.enroll(*account);
        }
        debug!(bank = %bank_id, added = accounts.len(), "roster extended");
        Ok(bank.accounts().to_vec())
    }

    pub fn add_branch(&self, bank_id: BankId, name: &str) -> LedgerResult<Bank> {
        let handle = self.bank_handle(bank_id)?;
        let mut bank = lock_entity(&handle, "bank")?;
        let branch = bank.add_branch(name);
        self.branch_index.write().insert(branch, bank_id);
        debug!(bank = %bank_id, %branch, "branch added");
        Ok(bank.clone())
    }

    /// Installs an ATM at one of the bank's branches. New ATMs carry no
    /// cash until the repository funds them.
    pub fn install_atm(&self, bank_id: BankId, branch_id: BranchId) -> LedgerResult<Bank> {
        let handle = self.bank_handle(bank_id)?;
        let mut bank = lock_entity(&handle, "bank")?;

        let atm = Atm::new(branch_id);
        let branch = bank
            .branch_mut(branch_id)
            .ok_or_else(|| LedgerError::branch_not_found(branch_id))?;
        branch.install_atm(atm.id());
        debug!(bank = %bank_id, atm = %atm.id(), "ATM installed");
        self.atms
            .write()
            .insert(atm.id(), Arc::new(Mutex::new(atm)));
        Ok(bank.clone())
    }

    /// Credits the bank's central repository with outside cash.
    pub fn fund_repository(&self, bank_id: BankId, amount: Decimal) -> LedgerResult<Bank> {
        validation::check_positive_amount(amount)?;
        let handle = self.bank_handle(bank_id)?;
        let mut bank = lock_entity(&handle, "bank")?;
        bank.deposit_repository(amount);
        debug!(bank = %bank_id, %amount, "repository funded");
        Ok(bank.clone())
    }

    /// Moves cash from the bank repository into an ATM. Both balances are
    /// updated under both locks; the debit is validated before anything
    /// changes, so a failure leaves both sides untouched.
    pub fn deposit_to_atm(
        &self,
        bank_id: BankId,
        atm_id: AtmId,
        amount: Decimal,
    ) -> LedgerResult<Bank> {
        validation::check_positive_amount(amount)?;
        let bank_handle = self.bank_handle(bank_id)?;
        let atm_handle = self.atm_handle(atm_id)?;

        let mut bank = lock_entity(&bank_handle, "bank")?;
        let mut atm = lock_entity(&atm_handle, "ATM")?;
        self.ensure_owned(&bank, atm_id)?;

        bank.withdraw_repository(amount)?;
        atm.deposit_cash(amount);
        debug!(bank = %bank_id, atm = %atm_id, %amount, "cash moved to ATM");
        Ok(bank.clone())
    }

    /// Moves cash out of an ATM back into the bank repository.
    pub fn withdrawal_from_atm(
        &self,
        bank_id: BankId,
        atm_id: AtmId,
        amount: Decimal,
    ) -> LedgerResult<Bank> {
        validation::check_positive_amount(amount)?;
        let bank_handle = self.bank_handle(bank_id)?;
        let atm_handle = self.atm_handle(atm_id)?;

        let mut bank = lock_entity(&bank_handle, "bank")?;
        let mut atm = lock_entity(&atm_handle, "ATM")?;
        self.ensure_owned(&bank, atm_id)?;

        atm.withdraw_cash(amount)?;
        bank.deposit_repository(amount);
        debug!(bank = %bank_id, atm = %atm_id, %amount, "cash returned to repository");
        Ok(bank.clone())
    }

    fn ensure_owned(&self, bank: &Bank, atm: AtmId) -> LedgerResult<()> {
        if bank.has_atm(atm) {
            Ok(())
        } else {
            Err(BankError::ForeignAtm {
                atm,
                bank: bank.id(),
            }
            .into())
        }
    }

    pub fn bank(&self, id: BankId) -> LedgerResult<Bank> {
        let handle = self.bank_handle(id)?;
        let bank = lock_entity(&handle, "bank")?;
        Ok(bank.clone())
    }

    pub fn list_banks(&self) -> LedgerResult<Vec<Bank>> {
        let handles: Vec<_> = self.banks.read().values().cloned().collect();
        handles
            .iter()
            .map(|handle| Ok(lock_entity(handle, "bank")?.clone()))
            .collect()
    }

    pub fn list_branches(&self, bank_id: BankId) -> LedgerResult<Vec<Branch>> {
        Ok(self.bank(bank_id)?.branches().to_vec())
    }

    pub fn atm(&self, id: AtmId) -> LedgerResult<Atm> {
        let handle = self.atm_handle(id)?;
        let atm = lock_entity(&handle, "ATM")?;
        Ok(atm.clone())
    }

    pub fn list_branch_atms(&self, branch_id: BranchId) -> LedgerResult<Vec<Atm>> {
        let bank_id = self
            .branch_index
            .read()
            .get(&branch_id)
            .copied()
            .ok_or_else(|| LedgerError::branch_not_found(branch_id))?;
        let bank = self.bank(bank_id)?;
        let branch = bank
            .branch(branch_id)
            .ok_or_else(|| LedgerError::branch_not_found(branch_id))?;
        branch.atms().iter().map(|atm| self.atm(*atm)).collect()
    }
}
