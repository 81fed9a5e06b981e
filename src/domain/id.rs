use std::{fmt, num::NonZeroU64, str::FromStr};

use serde::{Deserialize, Serialize};

/// The store-assigned identifier of a [`Human`](crate::Human).
///
/// Identifiers are positive integers assigned once, at insertion, from the
/// owning store's monotonic counter. They are never reassigned and never
/// reused, so an identifier remains a stable handle for the lifetime of the
/// store. Identifiers cross the presentation boundary as plain decimal text
/// (e.g. `"42"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HumanId(NonZeroU64);

impl HumanId {
    /// The first identifier a store assigns.
    pub(crate) const MIN: Self = Self(NonZeroU64::MIN);

    /// Returns the identifier that follows this one.
    ///
    /// # Panics
    ///
    /// Panics if the identifier space is exhausted.
    #[must_use]
    pub(crate) fn next(self) -> Self {
        Self(self.0.checked_add(1).expect("identifier overflow!"))
    }

    /// Returns the numeric value of the identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for HumanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when parsing a [`HumanId`] from text.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The input is not a decimal integer.
    #[error("invalid identifier '{0}': expected a positive integer")]
    Syntax(String),

    /// Identifiers start at one; zero is never assigned.
    #[error("invalid identifier: cannot be zero")]
    Zero,
}

impl FromStr for HumanId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u64 = s
            .trim()
            .parse()
            .map_err(|_| Error::Syntax(s.to_string()))?;
        NonZeroU64::new(value).map(Self).ok_or(Error::Zero)
    }
}

impl TryFrom<u64> for HumanId {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        NonZeroU64::new(value).map(Self).ok_or(Error::Zero)
    }
}
