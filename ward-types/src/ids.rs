//! Typed identifiers for stored entities.
//!
//! Newtypes over `u64` rather than bare integers so a `TaskId` can never be
//! passed where a `MemoryId` is expected; on the wire they still serialize
//! as a bare integer via `#[serde(transparent)]`.

use std::fmt;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn value(self) -> u64 {
                self.0
            }

            #[must_use]
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_id!(MemoryId);
typed_id!(TaskId);
typed_id!(ReminderId);
