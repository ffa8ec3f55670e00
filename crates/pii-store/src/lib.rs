//! Persistence-side integration of the PII codec.
//!
//! [`policy`] declares which fields of an entity are sensitive and which
//! sibling slot holds each field's blind-index digest. [`hook`] is the
//! write-path seal / read-path reveal transform that every repository
//! composes explicitly around its store calls — sealing and committing happen
//! together, so a document never lands with a ciphertext/index pair out of
//! sync. [`store`] is the in-memory document collection providing the
//! contract the sealing layer relies on: atomic per-document commits,
//! sparse-unique constraints on index fields, and equality lookup by digest.
//!
//! [`users`] and [`invites`] are the two entity schemas that use the
//! mechanism: account lookup by email or third-party account id, and
//! invite lookup by email.

pub mod error;
pub mod hook;
pub mod invites;
pub mod policy;
pub mod store;
pub mod users;

pub use error::Error;
pub use invites::{Invite, InviteRepository};
pub use policy::{EntityPolicy, SensitiveField};
pub use store::{Collection, Document, StoreError};
pub use users::{NewUser, User, UserChanges, UserRepository};
