use std::cell::RefCell;
use std::rc::Rc;
use std::{collections::HashSet, str::from_utf8};

use atm_ledger::bin_utils::{BatchError, Service};

const TEST_FILE: &str = include_str!("operations.csv");

#[test]
fn process_operations() {
    let mut output = Vec::new();
    let rejected: Rc<RefCell<Vec<(u64, String)>>> = Rc::default();
    let malformed: Rc<RefCell<Vec<(u64, String)>>> = Rc::default();

    let service = Service {
        input: TEST_FILE.as_bytes(),
        output: &mut output,
        error_printer: {
            let rejected = Rc::clone(&rejected);
            let malformed = Rc::clone(&malformed);
            Box::new(move |line, err| match err {
                BatchError::Ledger(err) => rejected.borrow_mut().push((line, err.to_string())),
                err => malformed.borrow_mut().push((line, err.to_string())),
            })
        },
    };
    service.run().unwrap();

    // the overdraft is a ledger rejection, the unknown account number a
    // malformed row; neither stops the batch
    let rejected = rejected.borrow();
    let malformed = malformed.borrow();
    assert_eq!(rejected.len(), 1);
    assert!(rejected[0].1.contains("insufficient funds"));
    assert_eq!(malformed.len(), 1);
    assert!(malformed[0].1.contains("ACC-9999"));

    // account registry iteration order is randomized, so compare as a set
    let lines: HashSet<String> = from_utf8(&output)
        .unwrap()
        .lines()
        .map(ToOwned::to_owned)
        .collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.contains("account,balance,status"));
    assert!(lines.contains("ACC-1001,700250.5,active"));
    assert!(lines.contains("ACC-1002,0,deleted"));
}
