//! Append-only audit trail
//!
//! Every committed unit of work appends one JSON line per created, updated
//! or deleted entity, tagged with the acting user. Entries are written only
//! after the data files are saved, so the trail never mentions changes that
//! were rolled back.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
