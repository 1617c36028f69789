use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::account::{AccountError, AccountUpdate, User};
use crate::error::LedgerResult;
use crate::ids::{AccountId, AtmId, BankId, BranchId, UserId};
use crate::ledger::AccountLedger;
use crate::repository::BankRepositoryManager;
use crate::transaction::TransactionLog;
use crate::transfer::TransferCoordinator;
use crate::view::{AccountView, AtmView, BankView, BranchView, TransactionView};

/// The context object the transport layer talks to. Composes the account
/// ledger, the bank repository manager and the transfer coordinator over
/// one shared transaction log; every operation returns a view value or a
/// typed error, never a placeholder.
pub struct AtmEngine {
    ledger: Arc<AccountLedger>,
    banks: Arc<BankRepositoryManager>,
    transfers: TransferCoordinator,
}

impl Default for AtmEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AtmEngine {
    pub fn new() -> Self {
        let log = Arc::new(TransactionLog::new());
        let ledger = Arc::new(AccountLedger::new(Arc::clone(&log)));
        let banks = Arc::new(BankRepositoryManager::new());
        let transfers = TransferCoordinator::new(Arc::clone(&ledger), Arc::clone(&banks), log);
        Self {
            ledger,
            banks,
            transfers,
        }
    }

    pub fn register_owner(&self, name: &str) -> User {
        self.ledger.register_owner(name)
    }

    pub fn create_account(
        &self,
        owner: UserId,
        account_number: &str,
        initial_deposit: Decimal,
    ) -> LedgerResult<AccountView> {
        let account = self.ledger.create(owner, account_number, initial_deposit)?;
        info!(account = %account.id(), "account created");
        Ok(AccountView::from(&account))
    }

    pub fn deposit(&self, account: AccountId, amount: Decimal) -> LedgerResult<AccountView> {
        Ok(AccountView::from(&self.ledger.deposit(account, amount)?))
    }

    pub fn withdraw(&self, account: AccountId, amount: Decimal) -> LedgerResult<AccountView> {
        Ok(AccountView::from(&self.ledger.withdraw(account, amount)?))
    }

    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> LedgerResult<(AccountView, AccountView)> {
        let (from_account, to_account) = self.transfers.transfer(from, to, amount)?;
        Ok((
            AccountView::from(&from_account),
            AccountView::from(&to_account),
        ))
    }

    pub fn soft_delete_account(&self, account: AccountId) -> LedgerResult<AccountView> {
        Ok(AccountView::from(&self.ledger.soft_delete(account)?))
    }

    pub fn hard_delete_account(&self, account: AccountId) -> LedgerResult<()> {
        self.ledger.hard_delete(account)
    }

    pub fn update_account(
        &self,
        account: AccountId,
        request: &AccountUpdate,
    ) -> LedgerResult<AccountView> {
        Ok(AccountView::from(&self.ledger.update(account, request)?))
    }

    pub fn check_balance(&self, account: AccountId) -> LedgerResult<AccountView> {
        Ok(AccountView::from(&self.ledger.get(account)?))
    }

    pub fn find_account_by_number(&self, number: &str) -> LedgerResult<AccountView> {
        Ok(AccountView::from(&self.ledger.find_by_number(number)?))
    }

    pub fn list_accounts(&self) -> LedgerResult<Vec<AccountView>> {
        Ok(self
            .ledger
            .list()?
            .iter()
            .map(AccountView::from)
            .collect())
    }

    pub fn account_history(&self, account: AccountId) -> LedgerResult<Vec<TransactionView>> {
        Ok(self
            .ledger
            .history(account)?
            .iter()
            .map(TransactionView::from)
            .collect())
    }

    /// Founds a bank over accounts that must already exist and be active.
    pub fn create_bank(
        &self,
        name: &str,
        initial_accounts: &[AccountId],
    ) -> LedgerResult<BankView> {
        self.ensure_rosterable(initial_accounts)?;
        let bank = self.banks.create_bank(name, initial_accounts)?;
        info!(bank = %bank.id(), "bank created");
        Ok(BankView::from(&bank))
    }

    /// Extends a bank's roster and returns the member accounts as views.
    pub fn add_accounts_to_bank(
        &self,
        bank: BankId,
        accounts: &[AccountId],
    ) -> LedgerResult<Vec<AccountView>> {
        self.ensure_rosterable(accounts)?;
        let roster = self.banks.add_accounts(bank, accounts)?;
        roster
            .iter()
            .map(|id| Ok(AccountView::from(&self.ledger.get(*id)?)))
            .collect()
    }

    fn ensure_rosterable(&self, accounts: &[AccountId]) -> LedgerResult<()> {
        for id in accounts {
            let account = self.ledger.get(*id)?;
            if !account.is_active() {
                return Err(AccountError::AccountInactive.into());
            }
        }
        Ok(())
    }

    pub fn fund_repository(&self, bank: BankId, amount: Decimal) -> LedgerResult<BankView> {
        Ok(BankView::from(&self.banks.fund_repository(bank, amount)?))
    }

    pub fn add_branch(&self, bank: BankId, name: &str) -> LedgerResult<BankView> {
        Ok(BankView::from(&self.banks.add_branch(bank, name)?))
    }

    pub fn install_atm(&self, bank: BankId, branch: BranchId) -> LedgerResult<BankView> {
        Ok(BankView::from(&self.banks.install_atm(bank, branch)?))
    }

    pub fn deposit_to_atm(
        &self,
        bank: BankId,
        atm: AtmId,
        amount: Decimal,
    ) -> LedgerResult<BankView> {
        Ok(BankView::from(
            &self.transfers.deposit_to_atm(bank, atm, amount)?,
        ))
    }

    pub fn withdrawal_from_atm(
        &self,
        bank: BankId,
        atm: AtmId,
        amount: Decimal,
    ) -> LedgerResult<BankView> {
        Ok(BankView::from(
            &self.transfers.withdrawal_from_atm(bank, atm, amount)?,
        ))
    }

    pub fn bank(&self, bank: BankId) -> LedgerResult<BankView> {
        Ok(BankView::from(&self.banks.bank(bank)?))
    }

    pub fn list_banks(&self) -> LedgerResult<Vec<BankView>> {
        Ok(self
            .banks
            .list_banks()?
            .iter()
            .map(BankView::from)
            .collect())
    }

    pub fn list_branches(&self, bank: BankId) -> LedgerResult<Vec<BranchView>> {
        Ok(self
            .banks
            .list_branches(bank)?
            .iter()
            .map(BranchView::from)
            .collect())
    }

    pub fn list_branch_atms(&self, branch: BranchId) -> LedgerResult<Vec<AtmView>> {
        Ok(self
            .banks
            .list_branch_atms(branch)?
            .iter()
            .map(AtmView::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::{FromPrimitive, Zero};

    use crate::account::AccountStatus;
    use crate::error::LedgerError;
    use crate::transaction::TransactionKind;

    use super::*;

    fn opening() -> Decimal {
        Decimal::from_u64(600_000).unwrap()
    }

    fn engine_with_accounts(n: usize) -> (AtmEngine, Vec<AccountId>) {
        let engine = AtmEngine::new();
        let owner = engine.register_owner("alice").id;
        let accounts = (0..n)
            .map(|i| {
                engine
                    .create_account(owner, &format!("ACC-{i:04}"), opening())
                    .unwrap()
                    .id
            })
            .collect();
        (engine, accounts)
    }

    #[test]
    fn end_to_end_account_flow() {
        let (engine, accounts) = engine_with_accounts(2);
        let (a, b) = (accounts[0], accounts[1]);

        engine.deposit(a, Decimal::from_u32(500).unwrap()).unwrap();
        engine.withdraw(a, Decimal::from_u32(200).unwrap()).unwrap();
        let (from, to) = engine
            .transfer(a, b, Decimal::from_u32(300).unwrap())
            .unwrap();
        assert_eq!(from.balance, opening());
        assert_eq!(to.balance, opening() + Decimal::from_u32(300).unwrap());

        let history = engine.account_history(a).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].kind, TransactionKind::TransferOut);
        assert_eq!(history[3].counterparty, Some(b));

        let view = engine.check_balance(a).unwrap();
        assert_eq!(view.balance, opening());
        assert_eq!(view.status, AccountStatus::Active);
    }

    #[test]
    fn soft_deleted_accounts_keep_their_audit_trail() {
        let (engine, accounts) = engine_with_accounts(1);
        let view = engine.soft_delete_account(accounts[0]).unwrap();
        assert_eq!(view.balance, Decimal::zero());
        assert_eq!(view.owner, None);
        assert_eq!(view.status, AccountStatus::Deleted);

        let history = engine.account_history(accounts[0]).unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn missing_entities_come_back_as_not_found() {
        let engine = AtmEngine::new();
        assert!(engine.check_balance(AccountId::new()).unwrap_err().is_not_found());
        assert!(engine.bank(BankId::new()).unwrap_err().is_not_found());
        assert!(
            engine
                .find_account_by_number("ACC-NONE")
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn bank_roster_must_reference_live_accounts() {
        let (engine, accounts) = engine_with_accounts(5);

        // unknown account id
        let mut roster = accounts.clone();
        roster[4] = AccountId::new();
        assert!(engine.create_bank("First", &roster).unwrap_err().is_not_found());

        // deleted account
        engine.soft_delete_account(accounts[4]).unwrap();
        let err = engine.create_bank("First", &accounts).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Account(AccountError::AccountInactive)
        ));
    }

    #[test]
    fn bank_provisioning_and_atm_cash_flow() {
        let (engine, accounts) = engine_with_accounts(5);
        let bank = engine.create_bank("First", &accounts).unwrap();

        let bank = engine.add_branch(bank.id, "Downtown").unwrap();
        let branch = bank.branches[0].id;
        let bank = engine.install_atm(bank.id, branch).unwrap();
        let atm = bank.branches[0].atms[0];

        engine
            .fund_repository(bank.id, Decimal::from_u32(5_000).unwrap())
            .unwrap();
        let view = engine
            .deposit_to_atm(bank.id, atm, Decimal::from_u32(2_000).unwrap())
            .unwrap();
        assert_eq!(view.repository_balance, Decimal::from_u32(3_000).unwrap());

        assert_eq!(engine.list_branches(bank.id).unwrap().len(), 1);
        let atms = engine.list_branch_atms(branch).unwrap();
        assert_eq!(atms.len(), 1);
        assert_eq!(atms[0].cash_balance, Decimal::from_u32(2_000).unwrap());

        let view = engine
            .withdrawal_from_atm(bank.id, atm, Decimal::from_u32(500).unwrap())
            .unwrap();
        assert_eq!(view.repository_balance, Decimal::from_u32(3_500).unwrap());
    }

    #[test]
    fn update_account_round_trips_through_the_consistency_check() {
        let (engine, accounts) = engine_with_accounts(1);
        let bob = engine.register_owner("bob").id;

        let view = engine
            .update_account(
                accounts[0],
                &AccountUpdate {
                    account_number: "ACC-NEW".to_string(),
                    owner: bob,
                },
            )
            .unwrap();
        assert_eq!(view.account_number, "ACC-NEW");
        assert_eq!(view.owner, Some(bob));
    }

    #[test]
    fn roster_views_follow_roster_growth() {
        let (engine, accounts) = engine_with_accounts(6);
        let bank = engine.create_bank("First", &accounts[..5]).unwrap();

        let views = engine
            .add_accounts_to_bank(bank.id, &accounts[5..])
            .unwrap();
        assert_eq!(views.len(), 6);
        assert!(views.iter().any(|view| view.id == accounts[5]));
    }
}
