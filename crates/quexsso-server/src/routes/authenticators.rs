//! `/users/{user_id}/authenticators` routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use quexsso_auth::AuthError;
use quexsso_auth::guard::AccessGuard;
use quexsso_auth::identity::UserId;
use quexsso_auth::middleware::{OptionalRequester, RequestOrigin};
use quexsso_auth::types::{AuthenticatorKey, event_types};
use serde::Deserialize;
use serde_json::{Value, json};

use super::users::token_from_body;
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_authenticators).post(add_authenticator))
        .route("/{kind}/{authenticator_id}", delete(remove_authenticator))
}

#[derive(Debug, Deserialize)]
struct AuthenticatorPath {
    user_id: String,
    kind: String,
    authenticator_id: String,
}

async fn list_authenticators(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AuthError> {
    let target = UserId::new(user_id);
    AccessGuard::require_self_or_admin(requester.as_ref(), &target)?;
    let authenticators = state.authenticators.list(&target).await?;
    Ok(Json(json!({ "authenticators": authenticators })))
}

async fn add_authenticator(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    RequestOrigin(origin): RequestOrigin,
    Path(user_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let target = UserId::new(user_id);
    AccessGuard::require_self(requester.as_ref(), &target)?;
    let token = token_from_body(body);
    let user = state
        .provisioning
        .attach_from_token(&target, &token, &origin)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn remove_authenticator(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    RequestOrigin(origin): RequestOrigin,
    Path(path): Path<AuthenticatorPath>,
) -> Result<StatusCode, AuthError> {
    let target = UserId::new(&path.user_id);
    AccessGuard::require_self_or_admin(requester.as_ref(), &target)?;

    let key = AuthenticatorKey::new(path.kind, path.authenticator_id);
    if state.authenticators.remove(&target, &key).await? {
        state
            .audit
            .push_event(
                &target,
                json!({
                    "authenticatorId": key.id,
                    "authenticatorType": key.kind,
                }),
                event_types::REMOVE_PRIMARY_AUTHENTICATOR,
                &origin,
            )
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
