//! HTTP glue for Axum.
//!
//! - [`OptionalRequester`]: resolves the bearer access token to a [`crate::guard::Requester`]
//! - [`RequestOrigin`]: sender and user agent for audit events
//! - `IntoResponse` for [`crate::AuthError`]
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use quexsso_auth::middleware::{AuthState, OptionalRequester};
//!
//! async fn whoami(OptionalRequester(requester): OptionalRequester) -> String {
//!     requester.map_or_else(|| "anonymous".into(), |r| r.user_id.to_string())
//! }
//!
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .with_state(auth_state);
//! ```

pub mod auth;
pub mod error;
pub mod origin;

pub use auth::{AuthState, OptionalRequester, bearer_token};
pub use origin::RequestOrigin;
