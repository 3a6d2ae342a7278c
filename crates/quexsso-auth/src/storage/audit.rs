//! Audit event storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::identity::UserId;
use crate::types::AuditEvent;

/// Append-only audit log.
///
/// Events are never updated or deleted, not even when their subject user is.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Appends an event.
    async fn append(&self, event: &AuditEvent) -> AuthResult<()>;

    /// Lists events about `subject`, oldest first.
    async fn list_for_subject(&self, subject: &UserId) -> AuthResult<Vec<AuditEvent>>;
}
