//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `AttachmentId` where a
//! `KtSessionId` is expected. All identifiers are database-assigned integers.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            /// Wraps a raw database identifier.
            #[must_use]
            pub const fn from_raw(id: i32) -> Self {
                Self(id)
            }

            /// Returns the raw database identifier.
            #[must_use]
            pub const fn into_inner(self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(KtSessionId, "Unique identifier for a knowledge-transfer session.");
typed_id!(AttachmentId, "Unique identifier for an attachment.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
