//! In-memory storage backend for the Quexten SSO user service.
//!
//! This crate implements the storage traits from `quexsso-auth` on top of
//! `dashmap`. Nothing survives a restart; it backs tests and single-node
//! development deployments.
//!
//! # Example
//!
//! ```ignore
//! use quexsso_db_memory::MemoryBackend;
//!
//! let backend = MemoryBackend::new();
//! let directory = UserDirectory::new(backend.users());
//! ```

pub mod audit;
pub mod ledger;
pub mod users;

use std::sync::Arc;

use quexsso_auth::storage::{AuditStorage, TokenLedger, UserStorage};

pub use audit::MemoryAuditStorage;
pub use ledger::MemoryTokenLedger;
pub use users::MemoryUserStorage;

/// All in-memory stores, shareable as trait objects.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    users: Arc<MemoryUserStorage>,
    audit: Arc<MemoryAuditStorage>,
    ledger: Arc<MemoryTokenLedger>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// User storage.
    #[must_use]
    pub fn users(&self) -> Arc<dyn UserStorage> {
        self.users.clone()
    }

    /// Audit storage.
    #[must_use]
    pub fn audit(&self) -> Arc<dyn AuditStorage> {
        self.audit.clone()
    }

    /// Consumed token ledger.
    #[must_use]
    pub fn ledger(&self) -> Arc<dyn TokenLedger> {
        self.ledger.clone()
    }
}
