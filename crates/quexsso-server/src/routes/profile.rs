//! `/users/{user_id}/profile` routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::get,
};
use quexsso_auth::AuthError;
use quexsso_auth::guard::AccessGuard;
use quexsso_auth::identity::UserId;
use quexsso_auth::middleware::{OptionalRequester, RequestOrigin};
use quexsso_auth::types::{Profile, ProfilePatch, event_types};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).patch(patch_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>, AuthError> {
    AccessGuard::require_authenticated(requester.as_ref())?;
    let profile = state.profiles.get_profile(&UserId::new(user_id)).await?;
    Ok(Json(profile))
}

async fn patch_profile(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    RequestOrigin(origin): RequestOrigin,
    Path(user_id): Path<String>,
    body: Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<Json<Profile>, AuthError> {
    let target = UserId::new(user_id);
    AccessGuard::require_self_or_admin(requester.as_ref(), &target)?;
    let Json(patch) = body.map_err(|rejection| AuthError::invalid_request(rejection.body_text()))?;
    if patch.changes_admin() {
        AccessGuard::require_admin(requester.as_ref())?;
    }
    if patch.is_empty() {
        return Err(AuthError::invalid_request("Profile update is empty."));
    }

    let profile = state.profiles.patch(&target, &patch).await?;
    let payload = serde_json::to_value(&patch).map_err(|e| AuthError::internal(e.to_string()))?;
    state
        .audit
        .push_event(&target, payload, event_types::UPDATE_PROFILE, &origin)
        .await?;
    Ok(Json(profile))
}
