use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::account::{Account, AccountError, AccountUpdate, User};
use crate::error::{LedgerError, LedgerResult, lock_entity};
use crate::ids::{AccountId, UserId};
use crate::transaction::{Transaction, TransactionKind, TransactionLog};
use crate::validation;

/// Owns all account balance state: the account registry, the owner roster,
/// the account-number index, and the shared transaction log. Every mutation
/// updates the balance and appends its log entry under one hold of the
/// account's lock.
pub struct AccountLedger {
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<Account>>>>,
    numbers: RwLock<HashMap<String, AccountId>>,
    owners: RwLock<HashMap<UserId, User>>,
    log: Arc<TransactionLog>,
}

impl AccountLedger {
    pub fn new(log: Arc<TransactionLog>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            numbers: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
            log,
        }
    }

    pub fn register_owner(&self, name: impl Into<String>) -> User {
        let user = User {
            id: UserId::new(),
            name: name.into(),
        };
        self.owners.write().insert(user.id, user.clone());
        user
    }

    pub fn owner(&self, id: UserId) -> LedgerResult<User> {
        self.owners
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::owner_not_found(id))
    }

    pub(crate) fn handle(&self, id: AccountId) -> LedgerResult<Arc<Mutex<Account>>> {
        self.accounts
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Opens an account. The opening deposit must meet the regulatory
    /// minimum and is recorded as the account's first transaction.
    pub fn create(
        &self,
        owner: UserId,
        number: &str,
        initial_deposit: Decimal,
    ) -> LedgerResult<Account> {
        validation::check_minimum_deposit(initial_deposit)?;
        if !self.owners.read().contains_key(&owner) {
            return Err(LedgerError::owner_not_found(owner));
        }

        // the number index write lock is held across the registration so a
        // concurrent open cannot claim the same number
        let mut numbers = self.numbers.write();
        if numbers.contains_key(number) {
            return Err(LedgerError::duplicate_account_number(number));
        }

        let mut account = Account::open(number, owner);
        let event = account.handle_deposit(initial_deposit)?;
        account.apply(&event);
        self.log.append(
            account.id(),
            event.amount(),
            TransactionKind::from(event.kind()),
            None,
        );

        numbers.insert(number.to_owned(), account.id());
        self.accounts
            .write()
            .insert(account.id(), Arc::new(Mutex::new(account.clone())));
        debug!(account = %account.id(), number, "account opened");
        Ok(account)
    }

    pub fn deposit(&self, id: AccountId, amount: Decimal) -> LedgerResult<Account> {
        validation::check_positive_amount(amount)?;
        let handle = self.handle(id)?;
        let mut account = lock_entity(&handle, "account")?;

        let event = account.handle_deposit(amount)?;
        account.apply(&event);
        self.log
            .append(id, event.amount(), TransactionKind::from(event.kind()), None);
        debug!(account = %id, %amount, "deposit applied");
        Ok(account.clone())
    }

    pub fn withdraw(&self, id: AccountId, amount: Decimal) -> LedgerResult<Account> {
        validation::check_positive_amount(amount)?;
        let handle = self.handle(id)?;
        let mut account = lock_entity(&handle, "account")?;

        let event = account.handle_withdrawal(amount)?;
        account.apply(&event);
        self.log
            .append(id, event.amount(), TransactionKind::from(event.kind()), None);
        debug!(account = %id, %amount, "withdrawal applied");
        Ok(account.clone())
    }

    /// Consistent point-in-time snapshot of one account.
    pub fn get(&self, id: AccountId) -> LedgerResult<Account> {
        let handle = self.handle(id)?;
        let account = lock_entity(&handle, "account")?;
        Ok(account.clone())
    }

    pub fn find_by_number(&self, number: &str) -> LedgerResult<Account> {
        let id = self
            .numbers
            .read()
            .get(number)
            .copied()
            .ok_or_else(|| LedgerError::NotFound {
                entity: "account",
                id: number.to_owned(),
            })?;
        self.get(id)
    }

    pub fn list(&self) -> LedgerResult<Vec<Account>> {
        let handles: Vec<_> = self.accounts.read().values().cloned().collect();
        handles
            .iter()
            .map(|handle| Ok(lock_entity(handle, "account")?.clone()))
            .collect()
    }

    /// History outlives the account: entries are returned even after a soft
    /// delete, and an account that never existed is a `NotFound`, not an
    /// empty list.
    pub fn history(&self, id: AccountId) -> LedgerResult<Vec<Transaction>> {
        let entries = self.log.history(id);
        if entries.is_empty() && !self.accounts.read().contains_key(&id) {
            return Err(LedgerError::account_not_found(id));
        }
        Ok(entries)
    }

    /// Marks the account deleted, zeroing the balance and unlinking the
    /// owner. A non-zero residual balance is logged as a withdrawal; it is
    /// not swept into any bank repository. The transaction history stays.
    pub fn soft_delete(&self, id: AccountId) -> LedgerResult<Account> {
        let handle = self.handle(id)?;
        let mut account = lock_entity(&handle, "account")?;

        let event = account.handle_close()?;
        let residual = event.amount();
        account.apply(&event);
        if !residual.is_zero() {
            self.log
                .append(id, residual, TransactionKind::from(event.kind()), None);
        }
        debug!(account = %id, %residual, "account soft-deleted");
        Ok(account.clone())
    }

    /// Physically removes the account record, then re-reads the registry to
    /// confirm it is gone. A record still present after removal is a fatal
    /// invariant violation, surfaced to the caller instead of retried here.
    pub fn hard_delete(&self, id: AccountId) -> LedgerResult<()> {
        if self.accounts.write().remove(&id).is_none() {
            return Err(LedgerError::account_not_found(id));
        }
        self.numbers.write().retain(|_, account| *account != id);

        if self.accounts.read().contains_key(&id) {
            warn!(account = %id, "record still present after hard delete");
            return Err(LedgerError::InvariantViolation(format!(
                "account {id} still present after hard delete"
            )));
        }
        debug!(account = %id, "account hard-deleted");
        Ok(())
    }

    /// Applies an account-number/owner change, then verifies the stored
    /// record matches the request.
    pub fn update(&self, id: AccountId, request: &AccountUpdate) -> LedgerResult<Account> {
        if !self.owners.read().contains_key(&request.owner) {
            return Err(LedgerError::owner_not_found(request.owner));
        }
        let handle = self.handle(id)?;
        let mut account = lock_entity(&handle, "account")?;
        if !account.is_active() {
            return Err(AccountError::AccountInactive.into());
        }

        if account.number() != request.account_number {
            let mut numbers = self.numbers.write();
            if numbers.contains_key(&request.account_number) {
                return Err(LedgerError::duplicate_account_number(
                    &request.account_number,
                ));
            }
            numbers.remove(account.number());
            numbers.insert(request.account_number.clone(), id);
        }
        account.set_number(request.account_number.clone());
        account.set_owner(request.owner);

        validation::check_request_consistency(&account, request)?;
        debug!(account = %id, "account updated");
        Ok(account.clone())
    }
}
