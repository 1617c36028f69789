use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a UUID-backed identifier newtype. Keeping each entity's id a
/// distinct type stops an `AccountId` from ever being passed where a
/// `BankId` is expected. Ids are `Ord` so multi-entity operations can agree
/// on a canonical lock order.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Identifier of a customer account.
    AccountId
);
define_id!(
    /// Identifier of a user owning accounts.
    UserId
);
define_id!(
    /// Identifier of a bank.
    BankId
);
define_id!(
    /// Identifier of a bank branch.
    BranchId
);
define_id!(
    /// Identifier of an ATM.
    AtmId
);
define_id!(
    /// Identifier of a transaction log entry.
    TransactionId
);
