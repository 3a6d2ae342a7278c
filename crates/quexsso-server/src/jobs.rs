//! Background maintenance tasks.

use std::sync::Arc;
use std::time::Duration;

use quexsso_auth::storage::TokenLedger;

/// Periodically prunes consumed token ids whose tokens have expired.
pub fn start_ledger_cleanup(
    ledger: Arc<dyn TokenLedger>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        loop {
            interval.tick().await;

            match ledger.cleanup_expired().await {
                Ok(removed) if removed > 0 => {
                    tracing::debug!(removed = removed, "Token ledger cleanup completed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Token ledger cleanup failed");
                }
                _ => {}
            }
        }
    })
}
