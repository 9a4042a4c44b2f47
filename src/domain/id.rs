//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a string-backed identifier newtype.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` from a string.")]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[doc = concat!("Get the `", stringify!($name), "` as a string slice.")]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

/// Declares a string-backed identifier that can also be generated as a UUID v4.
macro_rules! generated_id {
    ($(#[$meta:meta])* $name:ident) => {
        string_id!($(#[$meta])* $name);

        impl $name {
            #[doc = concat!("Generate a fresh random `", stringify!($name), "`.")]
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

string_id!(
    /// Internal market identifier.
    MarketId
);

string_id!(
    /// Outcome identifier, unique within its market.
    OutcomeId
);

string_id!(
    /// Account identifier on the ledger.
    UserId
);

string_id!(
    /// Instrument identifier on the external reference market.
    InstrumentId
);

generated_id!(
    /// Internal order identifier.
    OrderId
);

generated_id!(
    /// Fill (trade record) identifier.
    FillId
);

generated_id!(
    /// Hedge order identifier.
    HedgeId
);

generated_id!(
    /// Risk snapshot identifier.
    SnapshotId
);
