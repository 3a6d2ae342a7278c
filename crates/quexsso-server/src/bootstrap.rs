//! Startup bootstrap of the initial admin user.

use quexsso_auth::identity::UserId;
use quexsso_auth::types::{AuditOrigin, event_types};
use serde_json::json;

use crate::config::BootstrapConfig;
use crate::server::AppState;

/// Creates or promotes the configured admin user. Safe to run on every start.
pub async fn run(state: &AppState, config: &BootstrapConfig) -> anyhow::Result<()> {
    let Some(raw_id) = config.admin_user_id.as_deref() else {
        return Ok(());
    };
    let id = UserId::new(raw_id);

    let existed = state.directory.find_user(&id).await?.is_some();
    if state.directory.ensure_admin(&id).await? {
        let origin = AuditOrigin::system();
        if existed {
            state
                .audit
                .push_event(&id, json!({ "admin": true }), event_types::UPDATE_PROFILE, &origin)
                .await?;
            tracing::info!(user_id = %id, "Existing user promoted to admin");
        } else {
            state
                .audit
                .push_event(&id, json!({ "userId": id }), event_types::CREATE_USER, &origin)
                .await?;
            tracing::info!(user_id = %id, "Admin user created");
        }
    } else {
        tracing::debug!(user_id = %id, "Admin user already present");
    }
    Ok(())
}
