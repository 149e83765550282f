use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post, put},
};
use recipes_auth::middleware::require_session;
use recipes_auth::storage::{
    InMemorySessionStorage, InMemoryUserStorage, SessionStorage, UserStorage,
};
use recipes_auth::{AuthState, SessionManager};
use recipes_auth_postgres::{PostgresSessionStorage, PostgresUserStorage};
use recipes_db_postgres::PostgresStorage;
use recipes_storage::DynStorage;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::bootstrap;
use crate::cache::{CacheBackend, RecipeListingCache, create_cache_backend};
use crate::config::{AppConfig, ServerConfig, StorageBackend};
use crate::middleware::{REQUEST_ID_HEADER, request_id};
use crate::{handlers, recipes};

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    pub listing: Arc<RecipeListingCache>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(storage: DynStorage, cache: CacheBackend, manager: Arc<SessionManager>) -> Self {
        Self {
            storage,
            listing: Arc::new(RecipeListingCache::new(cache)),
            auth: AuthState::new(manager),
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Routes and layers. Only the recipe write methods pass through the
/// session gate.
pub fn build_router(state: AppState, cfg: &ServerConfig) -> Router {
    let gate = middleware::from_fn_with_state(state.auth.clone(), require_session);

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route(
            "/recipes",
            get(recipes::list).merge(post(recipes::create).route_layer(gate.clone())),
        )
        .route("/recipes/search", get(recipes::search))
        .route(
            "/recipes/{id}",
            get(recipes::get_one).merge(
                put(recipes::update)
                    .delete(recipes::delete)
                    .route_layer(gate),
            ),
        )
        .route("/signin", post(recipes_auth::http::sign_in))
        .route("/refresh", post(recipes_auth::http::refresh))
        .route("/signout", post(recipes_auth::http::sign_out))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("");
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record("http.status_code", res.status().as_u16());
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        // Outside the trace layer so the span sees the id.
        .layer(middleware::from_fn(request_id))
        .layer(axum::extract::DefaultBodyLimit::max(cfg.body_limit_bytes))
        .with_state(state)
}

/// Connects the configured stores, runs bootstrap and assembles the state.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let (storage, sessions, users): (DynStorage, Arc<dyn SessionStorage>, Arc<dyn UserStorage>) =
        match cfg.storage.backend {
            StorageBackend::Memory => {
                let sessions: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
                let users: Arc<dyn UserStorage> = Arc::new(InMemoryUserStorage::new());
                (recipes_db_memory::create_storage(), sessions, users)
            }
            StorageBackend::Postgres => {
                let pg_config = cfg
                    .storage
                    .postgres
                    .to_postgres_config()
                    .map_err(|e| anyhow!(e))?;
                let pg = PostgresStorage::new(pg_config)
                    .await
                    .context("failed to initialize PostgreSQL storage")?;
                let pool = pg.pool().clone();
                let sessions: Arc<dyn SessionStorage> =
                    Arc::new(PostgresSessionStorage::new(pool.clone()));
                let users: Arc<dyn UserStorage> = Arc::new(PostgresUserStorage::new(pool));
                let storage: DynStorage = Arc::new(pg);
                (storage, sessions, users)
            }
        };
    tracing::info!(backend = %cfg.storage.backend, "storage initialized");

    let cache = create_cache_backend(&cfg.redis)
        .await
        .context("failed to initialize cache")?;

    let manager = SessionManager::new(sessions, users, cfg.auth.clone())
        .context("failed to initialize session manager")?;
    let state = AppState::new(storage, cache, Arc::new(manager));

    if let Some(admin) = &cfg.bootstrap.admin_user {
        bootstrap::bootstrap_admin_user(state.auth.manager.users().as_ref(), admin).await?;
    }
    if let Some(path) = &cfg.bootstrap.seed_file {
        bootstrap::import_seed(state.storage.as_ref(), &state.listing, path).await?;
    }

    Ok(state)
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(build_router(state, &cfg.server))
}

pub struct RecipesServer {
    addr: SocketAddr,
    app: Router,
    auth: AuthState,
    purge_interval: Duration,
}

impl RecipesServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves until Ctrl+C. Expired sessions are purged in the background.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!(addr = %self.addr, "recipes server listening");

        let purge = tokio::spawn(purge_sessions(self.auth.manager.clone(), self.purge_interval));

        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        purge.abort();
        result.context("server error")?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn purge_sessions(manager: Arc<SessionManager>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(e) = manager.purge_expired().await {
            tracing::warn!(error = %e, "session purge failed");
        }
    }
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
        let config = AppConfig::default();
        Self {
            addr: config.addr(),
            config,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.addr = config.addr();
        self.config = config;
        self
    }

    pub async fn build(self) -> anyhow::Result<RecipesServer> {
        let state = build_state(&self.config).await?;
        let auth = state.auth.clone();
        let app = build_router(state, &self.config.server);
        Ok(RecipesServer {
            addr: self.addr,
            app,
            auth,
            purge_interval: self.config.auth.purge_interval,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
