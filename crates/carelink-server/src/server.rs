use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use carelink_auth::{AuthState, CredentialStore, IdentityService};
use carelink_core::{SharedClock, SystemClock};
use carelink_records::Records;
use carelink_storage::{ClinicStorage, DynClinicStorage};
use tower_http::trace::TraceLayer;

use crate::{
    config::{AppConfig, StorageBackend},
    handlers, middleware as app_middleware,
};

/// Shared, read-only application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub records: Records,
    pub auth: AuthState,
    pub storage: DynClinicStorage,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Wires the identity and record services over one store.
    pub fn new<S>(store: Arc<S>, cfg: &AppConfig, clock: SharedClock) -> anyhow::Result<Self>
    where
        S: ClinicStorage + CredentialStore + 'static,
    {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let identity = IdentityService::new(credentials, &cfg.auth, clock.clone())?;
        let storage: DynClinicStorage = store;
        Ok(Self {
            records: Records::new(storage.clone(), clock),
            auth: AuthState::new(Arc::new(identity)),
            storage,
        })
    }
}

/// Opens the configured store and builds the state on top of it.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let clock = SystemClock::shared();
    match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            AppState::new(carelink_db_memory::create_storage(), cfg, clock)
        }
        StorageBackend::Postgres => {
            let pg = cfg
                .storage
                .postgres
                .clone()
                .ok_or_else(|| anyhow::anyhow!("storage.postgres config is required"))?;
            let store = carelink_db_postgres::create_storage(pg).await?;
            AppState::new(store, cfg, clock)
        }
    }
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(build_router(state, cfg.server.body_limit_bytes))
}

pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let api = [
        ("/auth/register", post(handlers::auth::register)),
        ("/auth/login", post(handlers::auth::login)),
        ("/auth/token/refresh", post(handlers::auth::refresh)),
        (
            "/patients",
            get(handlers::patients::list).post(handlers::patients::create),
        ),
        (
            "/patients/{id}",
            get(handlers::patients::read)
                .put(handlers::patients::replace)
                .patch(handlers::patients::modify)
                .delete(handlers::patients::delete),
        ),
        (
            "/doctors",
            get(handlers::doctors::list).post(handlers::doctors::create),
        ),
        (
            "/doctors/{id}",
            get(handlers::doctors::read)
                .put(handlers::doctors::replace)
                .patch(handlers::doctors::modify)
                .delete(handlers::doctors::delete),
        ),
        (
            "/mappings",
            get(handlers::mappings::list).post(handlers::mappings::create),
        ),
        // GET takes a patient id, DELETE a mapping id
        (
            "/mappings/{id}",
            get(handlers::mappings::doctors_for_patient).delete(handlers::mappings::delete),
        ),
    ]
    .into_iter()
    // Every API path is also served with a trailing slash
    .fold(Router::new(), |router, (path, methods)| {
        router
            .route(path, methods.clone())
            .route(&format!("{path}/"), methods)
    });

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .with_state(state)
        // Layer order, outermost last: body limit -> trace -> request id
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<app_middleware::RequestId>()
                        .and_then(|id| id.0.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        principal_id = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("http.status_code", res.status().as_u16());
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

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<CarelinkServer> {
        let app = build_app(&self.config).await?;
        Ok(CarelinkServer {
            addr: self.addr,
            app,
        })
    }
}

pub struct CarelinkServer {
    addr: SocketAddr,
    app: Router,
}

impl CarelinkServer {
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
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
