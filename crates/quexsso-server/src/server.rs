use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::FromRef, middleware, routing::get};
use quexsso_auth::middleware::AuthState;
use quexsso_auth::provisioning::ProvisioningFlow;
use quexsso_auth::service::{AuditSink, AuthenticatorStore, ProfileService, UserDirectory};
use quexsso_auth::storage::TokenLedger;
use quexsso_auth::token::{JwtService, TokenVerifier};
use quexsso_db_memory::MemoryBackend;
use tower_http::trace::TraceLayer;

use crate::{bootstrap, config::AppConfig, handlers, jobs, middleware as app_middleware, routes};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub directory: UserDirectory,
    pub authenticators: AuthenticatorStore,
    pub profiles: ProfileService,
    pub audit: AuditSink,
    pub provisioning: ProvisioningFlow,
    pub ledger: Arc<dyn TokenLedger>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Wires services over a fresh in-memory backend.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let signing_key = cfg.auth.signing_key()?;
        tracing::info!(
            algorithm = %signing_key.algorithm,
            issuer = %cfg.auth.issuer,
            "Token verification configured"
        );
        let jwt = Arc::new(
            JwtService::new(signing_key, cfg.auth.issuer.clone())
                .with_leeway(cfg.auth.primary_token.leeway),
        );
        Ok(Self::with_backend(
            &MemoryBackend::new(),
            TokenVerifier::new(jwt),
            cfg.auth.primary_token.single_use,
        ))
    }

    pub fn with_backend(backend: &MemoryBackend, verifier: TokenVerifier, single_use: bool) -> Self {
        let directory = UserDirectory::new(backend.users());
        let authenticators = AuthenticatorStore::new(backend.users());
        let profiles = ProfileService::new(backend.users());
        let audit = AuditSink::new(backend.audit());
        let ledger = backend.ledger();
        let provisioning = ProvisioningFlow::new(
            verifier.clone(),
            directory.clone(),
            authenticators.clone(),
            profiles.clone(),
            audit.clone(),
            ledger.clone(),
        )
        .with_single_use(single_use);

        Self {
            auth: AuthState::new(verifier, directory.clone()),
            directory,
            authenticators,
            profiles,
            audit,
            provisioning,
            ledger,
        }
    }
}

pub struct QuexssoServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the state, runs bootstrap and returns the full router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg)?;
    bootstrap::run(&state, &cfg.bootstrap).await?;
    if cfg.auth.primary_token.single_use {
        jobs::start_ledger_cleanup(state.ledger.clone(), cfg.auth.primary_token.cleanup_interval);
    }
    Ok(build_router(state, cfg.server.body_limit_bytes))
}

pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/users", routes::users::router())
        .with_state(state)
        // Layers apply bottom-up: request id -> trace -> body limit
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<QuexssoServer> {
        let app = build_app(&self.config).await?;
        Ok(QuexssoServer {
            addr: self.addr,
            app,
        })
    }
}

impl QuexssoServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
