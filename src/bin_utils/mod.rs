//! CSV batch driver for the engine: reads an operation list, applies each
//! row through the external interface, reports per-line failures through an
//! injectable printer, and writes the final account summaries as CSV.

use std::collections::HashMap;
use std::io::{Read, Write};

use anyhow::Result;
use thiserror::Error;

use crate::engine::AtmEngine;
use crate::error::LedgerError;
use crate::ids::{AccountId, UserId};

use csv_parser::{CsvOperationParser, OperationKind, OperationRow};
use csv_printer::{AccountRow, print_accounts};

pub mod csv_parser;
pub mod csv_printer;

/// Row-shape problems, kept apart from ledger errors so the caller can tell
/// a malformed input file from a rejected operation.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("`{field}` column is required for {op}")]
    MissingField {
        field: &'static str,
        op: &'static str,
    },
    #[error("unknown account number `{0}`")]
    UnknownAccount(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, BatchError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvOperationParser::new(self.input);
        let engine = AtmEngine::new();
        // rows reference accounts by number and owners by name; the driver
        // keeps the translation to generated ids
        let mut owners: HashMap<String, UserId> = HashMap::new();
        let mut numbers: HashMap<String, AccountId> = HashMap::new();

        for (line, row) in parser {
            if let Err(err) = apply_row(&engine, &mut owners, &mut numbers, row) {
                (self.error_printer)(line, err);
            }
        }

        print_accounts(
            self.output,
            engine.list_accounts()?.into_iter().map(|view| AccountRow {
                account: view.account_number,
                balance: view.balance,
                status: view.status,
            }),
        )
    }
}

fn apply_row(
    engine: &AtmEngine,
    owners: &mut HashMap<String, UserId>,
    numbers: &mut HashMap<String, AccountId>,
    row: OperationRow,
) -> Result<(), BatchError> {
    let op = row.op;
    match op {
        OperationKind::Open => {
            let owner_name = row.owner.ok_or(BatchError::MissingField {
                field: "owner",
                op: op.as_str(),
            })?;
            let amount = require_amount(row.amount, op)?;
            let owner = *owners
                .entry(owner_name.clone())
                .or_insert_with(|| engine.register_owner(&owner_name).id);
            let view = engine.create_account(owner, &row.account, amount)?;
            numbers.insert(row.account, view.id);
        }
        OperationKind::Deposit => {
            let id = resolve(numbers, &row.account)?;
            engine.deposit(id, require_amount(row.amount, op)?)?;
        }
        OperationKind::Withdraw => {
            let id = resolve(numbers, &row.account)?;
            engine.withdraw(id, require_amount(row.amount, op)?)?;
        }
        OperationKind::Transfer => {
            let counterparty = row.counterparty.ok_or(BatchError::MissingField {
                field: "counterparty",
                op: op.as_str(),
            })?;
            let from = resolve(numbers, &row.account)?;
            let to = resolve(numbers, &counterparty)?;
            engine.transfer(from, to, require_amount(row.amount, op)?)?;
        }
        OperationKind::Close => {
            let id = resolve(numbers, &row.account)?;
            engine.soft_delete_account(id)?;
        }
    }
    Ok(())
}

fn require_amount(
    amount: Option<rust_decimal::Decimal>,
    op: OperationKind,
) -> Result<rust_decimal::Decimal, BatchError> {
    amount.ok_or(BatchError::MissingField {
        field: "amount",
        op: op.as_str(),
    })
}

fn resolve(
    numbers: &HashMap<String, AccountId>,
    number: &str,
) -> Result<AccountId, BatchError> {
    numbers
        .get(number)
        .copied()
        .ok_or_else(|| BatchError::UnknownAccount(number.to_owned()))
}
