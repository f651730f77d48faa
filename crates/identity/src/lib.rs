//! Identifier normalization.
//!
//! Maps heterogeneous user input (phone numbers in any punctuation style,
//! `whatsapp:`-prefixed addresses, `client:` chat identities) onto a single
//! canonical key used by the contact directory and group participants.

pub mod canonical;
pub mod normalize;

pub use {
    canonical::{CHAT_PREFIX, CanonicalId, IdentityKind, WHATSAPP_PREFIX, bare_identifier},
    normalize::{Rejection, normalize, normalize_e164},
};
