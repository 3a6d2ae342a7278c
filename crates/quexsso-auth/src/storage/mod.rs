//! Storage traits for users, audit events and consumed tokens.
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `quexsso-db-memory` - in-memory backend

pub mod audit;
pub mod ledger;
pub mod user;

pub use audit::AuditStorage;
pub use ledger::TokenLedger;
pub use user::{AttachOutcome, RemoveOutcome, UserStorage};
