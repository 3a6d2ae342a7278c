//! `/users/{user_id}/audit` routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use quexsso_auth::AuthError;
use quexsso_auth::guard::AccessGuard;
use quexsso_auth::identity::UserId;
use quexsso_auth::middleware::OptionalRequester;
use serde_json::json;

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_events))
}

async fn list_events(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AuthError> {
    let target = UserId::new(user_id);
    AccessGuard::require_self_or_admin(requester.as_ref(), &target)?;
    let events = state.audit.list(&target).await?;
    Ok(Json(json!({ "events": events })))
}
