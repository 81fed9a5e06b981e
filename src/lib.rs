//! In-memory family tree management.
//!
//! A genealogical record set: individuals with identity, sex, optional
//! birth and death dates, and father/mother links, exposed through
//! add/edit/search/sort operations. The [`FamilyTree`] store is the sole
//! authority over identifier assignment and relationship integrity; the
//! entity values carry no validation logic beyond their own date ordering.

pub mod domain;
pub use domain::{
    Candidate, Config, DateOrderError, Human, HumanId, NameMatch, Sex, UnknownDatePolicy,
};

/// The authoritative record store and its operations.
pub mod store;
pub use store::{FamilyTree, ParentError, ParentRole, RemoveError, UpdateError};
