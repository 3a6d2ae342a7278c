//! In-memory append-only audit log.

use async_trait::async_trait;
use dashmap::DashMap;
use quexsso_auth::AuthResult;
use quexsso_auth::identity::UserId;
use quexsso_auth::storage::AuditStorage;
use quexsso_auth::types::AuditEvent;

/// Audit events grouped by subject, in append order.
#[derive(Debug, Default)]
pub struct MemoryAuditStorage {
    events: DashMap<UserId, Vec<AuditEvent>>,
}

impl MemoryAuditStorage {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }

    /// Returns `true` if no events are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStorage for MemoryAuditStorage {
    async fn append(&self, event: &AuditEvent) -> AuthResult<()> {
        self.events
            .entry(event.subject.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn list_for_subject(&self, subject: &UserId) -> AuthResult<Vec<AuditEvent>> {
        Ok(self
            .events
            .get(subject)
            .map(|events| events.clone())
            .unwrap_or_default())
    }
}
