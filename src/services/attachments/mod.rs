//! Polymorphic, role-tagged links between files and domain records.

pub mod attachable;
pub mod kinds;
pub mod ledger;

pub use attachable::{Attachable, HasFiles, roles};
pub use kinds::{AttachableKind, AttachableRef, UnknownKind};
pub use ledger::{ALREADY_ATTACHED, AttachmentLedger};
