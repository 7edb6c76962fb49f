//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! The route table depends on [`AuthMode`]: local accounts get the
//! login/sign-up forms, Google mode gets the OAuth redirect and callback.
//! Everything else is shared.

// region: --- Imports
use crate::handlers;
use crate::middleware::{log_requests, require_login, require_login_api, stamp_req, RequestStamp};
use crate::services::{ChatCompletion, GroqClient};
use crate::templates::Templates;
use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use lib_auth::{GoogleOAuth, GoogleSettings};
use lib_core::{
    create_pool, run_migrations, AppError, AuthMode, Config, DbPool, GoogleUserCache, Result,
};
use std::sync::Arc;
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Account backend selected by `AUTH_MODE`.
#[derive(Clone)]
pub enum AuthBackend {
    Local(DbPool),
    Google {
        oauth: Arc<GoogleOAuth>,
        users: GoogleUserCache,
    },
}

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub templates: Arc<Templates>,
    pub llm: Arc<dyn ChatCompletion>,
    pub auth: AuthBackend,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn ChatCompletion>, auth: AuthBackend) -> Result<Self> {
        let templates = Templates::new()
            .map_err(|e| AppError::Internal(format!("template compilation failed: {e}")))?;

        Ok(Self {
            config,
            templates: Arc::new(templates),
            llm,
            auth,
        })
    }

    pub fn auth_mode(&self) -> AuthMode {
        match self.auth {
            AuthBackend::Local(_) => AuthMode::Local,
            AuthBackend::Google { .. } => AuthMode::Google,
        }
    }

    /// User database. Only available for local accounts.
    pub fn pool(&self) -> Result<&DbPool> {
        match &self.auth {
            AuthBackend::Local(pool) => Ok(pool),
            AuthBackend::Google { .. } => Err(AppError::Config(
                "user database is not available when AUTH_MODE=google".to_string(),
            )),
        }
    }

    /// OAuth client and user cache. Only available in Google mode.
    pub fn google(&self) -> Result<(&GoogleOAuth, &GoogleUserCache)> {
        match &self.auth {
            AuthBackend::Google { oauth, users } => Ok((oauth.as_ref(), users)),
            AuthBackend::Local(_) => Err(AppError::Config(
                "Google login is not available when AUTH_MODE=local".to_string(),
            )),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ChatCompletion> {
    fn from_ref(state: &AppState) -> Self {
        state.llm.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000")
    pub bind_address: String,
    /// Database migrations path
    pub migrations_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            migrations_path: "./migrations".to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `BIND_ADDRESS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if !addr.trim().is_empty() {
                config.bind_address = addr;
            }
        }
        config
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
fn init_tracing() -> anyhow::Result<String> {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" => tracing_subscriber::EnvFilter::new("trace"),
        "debug" => tracing_subscriber::EnvFilter::new("debug"),
        "info" => tracing_subscriber::EnvFilter::new("info"),
        "warn" => tracing_subscriber::EnvFilter::new("warn"),
        "error" => tracing_subscriber::EnvFilter::new("error"),
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(log_level)
}

/// Build the account backend for the configured mode.
async fn build_auth_backend(config: &Config, migrations_path: &str) -> anyhow::Result<AuthBackend> {
    match config.auth_mode {
        AuthMode::Local => {
            info!("Database URL: {}", config.database_url);
            let pool = create_pool(&config.database_url).await?;

            info!("Running database migrations from: {}", migrations_path);
            run_migrations(&pool, migrations_path).await?;
            info!("Migrations complete");

            Ok(AuthBackend::Local(pool))
        }
        AuthMode::Google => {
            let google = config
                .google
                .clone()
                .ok_or_else(|| AppError::Config("Google credentials missing".to_string()))?;
            info!("Google OAuth redirect URL: {}", google.redirect_url);

            let oauth = GoogleOAuth::new(GoogleSettings::new(
                google.client_id,
                google.client_secret,
                google.redirect_url,
            ))
            .map_err(crate::error::from_auth)?;

            Ok(AuthBackend::Google {
                oauth: Arc::new(oauth),
                users: GoogleUserCache::new(),
            })
        }
    }
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading or validation fails
/// - Database connection or migrations fail (local accounts)
/// - The OAuth client cannot be built (Google mode)
/// - Server binding fails
pub async fn start_server(server_config: ServerConfig) -> anyhow::Result<()> {
    let log_level = init_tracing()?;

    info!("CHATBOT SERVER STARTING");
    info!("Log level: {}", log_level);

    info!("Loading configuration...");
    let config = Config::from_env()?;
    config.validate()?;
    info!("Auth mode: {}", config.auth_mode.as_str());
    info!("LLM endpoint: {} (model {})", config.llm.api_url, config.llm.model);

    let auth = build_auth_backend(&config, &server_config.migrations_path).await?;
    let llm: Arc<dyn ChatCompletion> = Arc::new(GroqClient::new(config.llm.clone()));
    let state = AppState::new(config, llm, auth)?;
    let mode = state.auth_mode();

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_address).await?;
    info!("SERVER READY: http://{}", server_config.bind_address);
    log_server_info(mode);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Create the application router for the state's auth mode.
pub fn create_router(state: AppState) -> Router {
    info!("[ROUTE SETUP] Registering HTTP routes...");

    let account_routes = match state.auth_mode() {
        AuthMode::Local => Router::new()
            .route(
                "/login",
                get(handlers::auth::login_page).post(handlers::auth::login),
            )
            .route(
                "/signup",
                get(handlers::auth::signup_page).post(handlers::auth::signup),
            ),
        AuthMode::Google => Router::new()
            .route("/login", get(handlers::google::login_page))
            .route("/google_login", get(handlers::google::google_login))
            .route("/google_login/callback", get(handlers::google::google_callback)),
    };

    let chat_page = Router::new()
        .route("/chatbot", get(handlers::pages::chatbot))
        .route_layer(from_fn_with_state(state.clone(), require_login));

    let chat_api = Router::new()
        .route("/send_message", post(handlers::chat::send_message))
        .route_layer(from_fn_with_state(state.clone(), require_login_api));

    Router::new()
        .route("/", get(handlers::pages::index))
        .route("/logout", get(handlers::auth::logout))
        .route("/check_login_status", get(handlers::auth::check_login_status))
        .route("/health", get(|| async { "OK" }))
        .merge(account_routes)
        .merge(chat_page)
        .merge(chat_api)
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        // Comprehensive request/response logging
        .layer(from_fn(log_requests))
        // Tower HTTP trace layer for spans
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        // Request stamping runs first so every later layer sees the ID
        .layer(from_fn(stamp_req))
}

/// Log server information
fn log_server_info(mode: AuthMode) {
    info!("PAGES:");
    info!("   • GET  /");
    info!("   • GET  /chatbot?prompt={{text}} (login required)");
    info!("AUTH ({}):", mode.as_str());
    match mode {
        AuthMode::Local => {
            info!("   • GET/POST /login");
            info!("   • GET/POST /signup");
        }
        AuthMode::Google => {
            info!("   • GET  /login");
            info!("   • GET  /google_login");
            info!("   • GET  /google_login/callback");
        }
    }
    info!("   • GET  /logout");
    info!("   • GET  /check_login_status");
    info!("CHAT:");
    info!("   • POST /send_message (login required)");
    info!("HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
