//! `/users` routes.
//!
//! | Method & Path | Access |
//! |---|---|
//! | `GET /users` | admin |
//! | `POST /users/new` | primary auth token in body |
//! | `GET /users/{user_id}` | authenticated; full record for self, profile otherwise |
//! | `DELETE /users/{user_id}` | self or admin |

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use quexsso_auth::guard::{AccessGuard, ReadView};
use quexsso_auth::identity::UserId;
use quexsso_auth::middleware::{OptionalRequester, RequestOrigin};
use quexsso_auth::types::{UserView, event_types};
use quexsso_auth::AuthError;
use serde_json::{Value, json};

use super::{audit, authenticators, profile};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/new", post(create_user))
        .route("/{user_id}", get(get_user).delete(delete_user))
        .nest("/{user_id}/authenticators", authenticators::router())
        .nest("/{user_id}/profile", profile::router())
        .nest("/{user_id}/audit", audit::router())
}

/// Reads `token` from a `{ "token": "..." }` body.
///
/// A missing or unreadable body, or a `token` that is not a string, yields an
/// empty token, which then fails validation like any other bad token.
pub(crate) fn token_from_body(body: Result<Json<Value>, JsonRejection>) -> String {
    match body {
        Ok(Json(value)) => value
            .get("token")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable token request body");
            String::new()
        }
    }
}

async fn list_users(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
) -> Result<impl IntoResponse, AuthError> {
    AccessGuard::require_admin(requester.as_ref())?;
    let users = state.directory.list_users().await?;
    Ok(Json(json!({ "users": users })))
}

async fn get_user(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>, AuthError> {
    let target = UserId::new(user_id);
    let view = AccessGuard::read_view(AccessGuard::classify(requester.as_ref(), &target))?;
    let user = state.directory.get_user(&target).await?;
    Ok(Json(match view {
        ReadView::Full => UserView::Full(user),
        ReadView::ProfileOnly => UserView::Profile(user.profile),
    }))
}

async fn delete_user(
    State(state): State<AppState>,
    OptionalRequester(requester): OptionalRequester,
    RequestOrigin(origin): RequestOrigin,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AuthError> {
    let target = UserId::new(user_id);
    AccessGuard::require_self_or_admin(requester.as_ref(), &target)?;
    state.directory.delete_user(&target).await?;
    state
        .audit
        .push_event(
            &target,
            json!({ "userId": target }),
            event_types::DELETE_USER,
            &origin,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_user(
    State(state): State<AppState>,
    RequestOrigin(origin): RequestOrigin,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let token = token_from_body(body);
    let user = state.provisioning.provision(&token, &origin).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
