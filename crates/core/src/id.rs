//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::DomainError;

/// Store-allocated record identifier.
///
/// `0` is reserved for entities that have not been committed yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

macro_rules! impl_record_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Identifier of an entity that has not been persisted.
            pub const UNASSIGNED: Self = Self(0);

            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Whether a data source has allocated this identifier.
            pub const fn is_assigned(&self) -> bool {
                self.0 != 0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }

        impl EntityId for $t {
            fn from_sequence(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

impl_record_newtype!(RecordId, "RecordId");
