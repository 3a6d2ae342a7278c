//! Service and provisioning flow tests against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use quexsso_auth::prelude::*;
use quexsso_auth::provisioning::{ProvisioningFlow, REUSED_TOKEN_MESSAGE};
use quexsso_auth::token::{JwtService, SigningKey, TokenClaims, TokenType, TokenVerifier};
use quexsso_auth::types::event_types;
use quexsso_db_memory::MemoryBackend;

const ISSUER: &str = "https://sso.test";
const SECRET: &[u8] = b"integration-secret-integration-secret";

struct Harness {
    jwt: Arc<JwtService>,
    directory: UserDirectory,
    authenticators: AuthenticatorStore,
    audit: AuditSink,
    flow: ProvisioningFlow,
}

fn harness() -> Harness {
    let backend = MemoryBackend::new();
    let jwt = Arc::new(JwtService::new(SigningKey::hmac(SECRET), ISSUER));
    let directory = UserDirectory::new(backend.users());
    let authenticators = AuthenticatorStore::new(backend.users());
    let profiles = ProfileService::new(backend.users());
    let audit = AuditSink::new(backend.audit());
    let flow = ProvisioningFlow::new(
        TokenVerifier::new(jwt.clone()),
        directory.clone(),
        authenticators.clone(),
        profiles,
        audit.clone(),
        backend.ledger(),
    );
    Harness {
        jwt,
        directory,
        authenticators,
        audit,
        flow,
    }
}

impl Harness {
    fn primary_token(&self, authenticator: Authenticator, strategy: &str) -> String {
        let claims = TokenClaims::primary_auth(ISSUER, authenticator, strategy, Duration::from_secs(60));
        self.jwt.encode(&claims).unwrap()
    }
}

fn origin() -> AuditOrigin {
    AuditOrigin::new("203.0.113.7").with_user_agent("integration-test")
}

#[tokio::test]
async fn provisioning_creates_user_with_authenticator_and_avatar() {
    let h = harness();
    let token = h.primary_token(
        Authenticator::new("google", "g-1").with_avatar("http://example.com/g-1.png"),
        "google",
    );

    let user = h.flow.provision(&token, &origin()).await.unwrap();

    assert_eq!(user.authentication.primary.len(), 1);
    assert_eq!(user.authentication.primary[0].id, "g-1");
    assert_eq!(
        user.profile.avatar.as_deref(),
        Some("http://example.com/g-1.png")
    );
    assert!(!user.is_admin());

    let found = h
        .authenticators
        .find_by_authenticator("google", "g-1")
        .await
        .unwrap();
    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn provisioning_emits_two_events_in_order() {
    let h = harness();
    let token = h.primary_token(Authenticator::new("", "g-1"), "google");

    let user = h.flow.provision(&token, &origin()).await.unwrap();
    let events = h.audit.list(&user.id).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, event_types::CREATE_USER);
    assert_eq!(events[0].payload["userId"], user.id.as_str());
    assert_eq!(events[1].event_type, event_types::ADD_PRIMARY_AUTHENTICATOR);
    assert_eq!(events[1].payload["authenticatorId"], "g-1");
    assert_eq!(events[1].payload["authenticatorType"], "google");
    assert_eq!(events[1].sender, "203.0.113.7");
    assert_eq!(events[1].user_agent.as_deref(), Some("integration-test"));
}

#[tokio::test]
async fn wrong_token_type_creates_nothing() {
    let h = harness();
    let claims = TokenClaims::primary_auth(
        ISSUER,
        Authenticator::new("google", "g-1"),
        "google",
        Duration::from_secs(60),
    )
    .with_token_type(TokenType::AccessToken);
    let token = h.jwt.encode(&claims).unwrap();

    let err = h.flow.provision(&token, &origin()).await.unwrap_err();

    assert!(matches!(err, AuthError::WrongTokenType { .. }));
    assert!(h.directory.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_token_is_rejected_before_type_check() {
    let h = harness();
    let foreign = JwtService::new(SigningKey::hmac(b"some-other-secret-some-other-secret"), ISSUER);
    let claims = TokenClaims::access(ISSUER, UserId::new("1"), Duration::from_secs(60));
    let token = foreign.encode(&claims).unwrap();

    let err = h.flow.provision(&token, &origin()).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidToken { .. }));
    assert!(h.directory.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn primary_token_is_single_use() {
    let h = harness();
    let token = h.primary_token(Authenticator::new("google", "g-1"), "google");

    h.flow.provision(&token, &origin()).await.unwrap();
    let err = h.flow.provision(&token, &origin()).await.unwrap_err();

    assert_eq!(err.message(), REUSED_TOKEN_MESSAGE);
    assert_eq!(h.directory.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn authenticator_of_another_user_conflicts_without_rollback() {
    let h = harness();
    let first = h.primary_token(Authenticator::new("google", "g-1"), "google");
    let second = h.primary_token(Authenticator::new("google", "g-1"), "google");

    let owner = h.flow.provision(&first, &origin()).await.unwrap();
    let err = h.flow.provision(&second, &origin()).await.unwrap_err();

    assert!(matches!(err, AuthError::Conflict { .. }));
    let users = h.directory.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    let orphan = users.iter().find(|u| u.id != owner.id).unwrap();
    assert!(orphan.authentication.primary.is_empty());
    let events = h.audit.list(&orphan.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, event_types::CREATE_USER);
}

#[tokio::test]
async fn attach_from_token_adds_second_authenticator() {
    let h = harness();
    let user = h
        .flow
        .provision(
            &h.primary_token(Authenticator::new("google", "g-1"), "google"),
            &origin(),
        )
        .await
        .unwrap();

    let updated = h
        .flow
        .attach_from_token(
            &user.id,
            &h.primary_token(Authenticator::new("github", "octocat"), "github"),
            &origin(),
        )
        .await
        .unwrap();

    let kinds: Vec<_> = updated
        .authentication
        .primary
        .iter()
        .map(|a| a.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["google", "github"]);
}

#[tokio::test]
async fn remove_authenticator_is_idempotent() {
    let h = harness();
    let user = h.directory.create_user().await.unwrap();
    let google = Authenticator::new("google", "g-1");
    h.authenticators.add(&user.id, &google).await.unwrap();
    h.authenticators.add(&user.id, &google).await.unwrap();
    assert_eq!(h.authenticators.list(&user.id).await.unwrap().len(), 1);

    assert!(h.authenticators.remove(&user.id, &google.key()).await.unwrap());
    assert!(!h.authenticators.remove(&user.id, &google.key()).await.unwrap());

    assert!(h.authenticators.list(&user.id).await.unwrap().is_empty());
    assert!(matches!(
        h.authenticators.find_by_authenticator("google", "g-1").await,
        Err(AuthError::NotFound { .. })
    ));
}

#[tokio::test]
async fn authenticator_operations_on_unknown_user() {
    let h = harness();
    let ghost = UserId::new("404");
    let google = Authenticator::new("google", "g-1");

    assert!(matches!(
        h.authenticators.add(&ghost, &google).await,
        Err(AuthError::NotFound { .. })
    ));
    assert!(matches!(
        h.authenticators.remove(&ghost, &google.key()).await,
        Err(AuthError::NotFound { .. })
    ));
}

#[tokio::test]
async fn delete_user_and_missing_user() {
    let h = harness();
    let user = h.directory.create_user().await.unwrap();

    h.directory.delete_user(&user.id).await.unwrap();

    assert!(matches!(
        h.directory.get_user(&user.id).await,
        Err(AuthError::NotFound { .. })
    ));
    assert!(matches!(
        h.directory.delete_user(&user.id).await,
        Err(AuthError::NotFound { .. })
    ));
}

#[tokio::test]
async fn ensure_admin_is_idempotent() {
    let h = harness();
    let id = UserId::new("1");

    assert!(h.directory.ensure_admin(&id).await.unwrap());
    assert!(!h.directory.ensure_admin(&id).await.unwrap());
    assert!(h.directory.get_user(&id).await.unwrap().is_admin());
}
