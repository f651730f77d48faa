//! Contact directory synchronizer.
//!
//! Lists, upserts and deletes contacts in an external key-value map keyed by
//! canonical identifier. Holds no state between calls.

pub mod contact;
pub mod directory;
pub mod error;

pub use {
    contact::{Contact, ContactData, UpsertOutcome},
    directory::{ContactDirectory, MAX_PAGE_SIZE},
    error::{Error, Result},
};
