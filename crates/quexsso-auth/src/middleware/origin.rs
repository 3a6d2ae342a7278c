//! Audit origin extractor.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderName, header::USER_AGENT, request::Parts},
};

use crate::types::AuditOrigin;

use super::auth::{AuthState, OptionalRequester};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Sender and user agent for audit events raised by the request.
///
/// `sender` is the requester id when one is authenticated, else the first
/// `X-Forwarded-For` address, else `"anonymous"`.
pub struct RequestOrigin(pub AuditOrigin);

impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let requester = match OptionalRequester::from_request_parts(parts, state).await {
            Ok(OptionalRequester(requester)) => requester,
            Err(e) => {
                tracing::warn!(error = %e, "Could not resolve requester for audit origin");
                None
            }
        };

        let sender = requester
            .map(|r| r.user_id.to_string())
            .or_else(|| forwarded_for(parts))
            .unwrap_or_else(|| AuditOrigin::ANONYMOUS.to_string());

        let mut origin = AuditOrigin::new(sender);
        if let Some(agent) = parts.headers.get(USER_AGENT).and_then(|h| h.to_str().ok()) {
            origin = origin.with_user_agent(agent);
        }
        Ok(Self(origin))
    }
}

fn forwarded_for(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(X_FORWARDED_FOR)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[test]
    fn test_forwarded_for_takes_first_address() {
        let (parts, ()) = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(forwarded_for(&parts).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_forwarded_for_absent() {
        let (parts, ()) = Request::builder().body(()).unwrap().into_parts();
        assert!(forwarded_for(&parts).is_none());
    }
}
