//! In-memory consumed token ledger.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use quexsso_auth::AuthResult;
use quexsso_auth::storage::TokenLedger;
use time::OffsetDateTime;

/// Consumed token ids with their expiry.
#[derive(Debug, Default)]
pub struct MemoryTokenLedger {
    consumed: DashMap<String, OffsetDateTime>,
}

impl MemoryTokenLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenLedger for MemoryTokenLedger {
    async fn consume(&self, jti: &str, expires_at: OffsetDateTime) -> AuthResult<bool> {
        match self.consumed.entry(jti.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(expires_at);
                Ok(true)
            }
        }
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let before = self.consumed.len();
        self.consumed.retain(|_, expires_at| *expires_at > now);
        let removed = before.saturating_sub(self.consumed.len());
        if removed > 0 {
            tracing::debug!(removed, "Expired token ids cleaned up");
        }
        Ok(removed as u64)
    }
}
