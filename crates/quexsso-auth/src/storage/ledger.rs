//! Consumed token ledger.
//!
//! Primary auth tokens are single use. The provisioning flow records each
//! token's `jti` here before creating anything.
//!
//! # Implementation Notes
//!
//! `consume` must atomically check and record the id so that the same token
//! submitted concurrently provisions at most one user.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;

/// Storage trait for consumed token ids.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Atomically records `jti` as consumed if it was not already.
    ///
    /// # Arguments
    ///
    /// * `jti` - The token id
    /// * `expires_at` - When the entry can be cleaned up (the token's `exp`)
    ///
    /// # Returns
    ///
    /// `true` on first use, `false` if the token was already consumed.
    async fn consume(&self, jti: &str, expires_at: OffsetDateTime) -> AuthResult<bool>;

    /// Drops entries whose tokens have expired, returning how many were removed.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
