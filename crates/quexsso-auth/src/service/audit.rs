//! Audit sink.

use std::sync::Arc;

use crate::AuthResult;
use crate::identity::UserId;
use crate::storage::AuditStorage;
use crate::types::{AuditEvent, AuditOrigin};

/// Appends immutable audit events.
#[derive(Clone)]
pub struct AuditSink {
    storage: Arc<dyn AuditStorage>,
}

impl AuditSink {
    /// Creates a sink over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn AuditStorage>) -> Self {
        Self { storage }
    }

    /// Records an event about `subject`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn push_event(
        &self,
        subject: &UserId,
        payload: serde_json::Value,
        event_type: &str,
        origin: &AuditOrigin,
    ) -> AuthResult<AuditEvent> {
        let event = AuditEvent::new(subject.clone(), payload, event_type, origin);
        self.storage.append(&event).await?;
        tracing::info!(
            subject = %subject,
            event_type = %event_type,
            sender = %origin.sender,
            "Audit event recorded"
        );
        Ok(event)
    }

    /// Lists events about `subject`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn list(&self, subject: &UserId) -> AuthResult<Vec<AuditEvent>> {
        self.storage.list_for_subject(subject).await
    }
}
