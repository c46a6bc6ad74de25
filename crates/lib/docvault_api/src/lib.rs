//! # docvault_api
//!
//! HTTP API library for Docvault.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use docvault_core::auth::jwt::TokenSigner;
use docvault_core::auth::sessions::SessionManager;
use docvault_core::files::{MAX_UPLOAD_BYTES, UploadDir};
use docvault_core::store::Stores;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, files, health};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Credential, token and file stores.
    pub stores: Stores,
    /// Session lifecycle over `stores.tokens`.
    pub sessions: SessionManager,
    /// Upload directory for document bytes.
    pub uploads: UploadDir,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire the session manager and upload directory from configuration.
    pub fn new(config: ApiConfig, stores: Stores) -> Self {
        let signer = TokenSigner::new(config.jwt_secret.as_bytes());
        Self {
            sessions: SessionManager::new(stores.tokens.clone(), signer),
            uploads: UploadDir::new(config.upload_dir.clone()),
            stores,
            config,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `docvault_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    docvault_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/signup", post(auth::signup_handler))
        .route("/signin", post(auth::signin_handler))
        .route("/signin/new_token", post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/info", get(auth::info_handler))
        .route("/logout", get(auth::logout_handler))
        .route("/logout/all", get(auth::logout_all_handler))
        .route("/file/upload", post(files::upload_handler))
        .route("/file/list", get(files::list_handler))
        .route("/file/{id}", get(files::get_handler))
        .route("/file/download/{id}", get(files::download_handler))
        .route("/file/update/{id}", put(files::update_handler))
        .route("/file/delete/{id}", delete(files::delete_handler))
        .layer(DefaultBodyLimit::max(
            MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::errors::expose_error_detail,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
