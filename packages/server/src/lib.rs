#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the landslide viewer.
//!
//! Serves the filtered incident view, selector choices, and the login gate
//! to the map frontend. The dataset is loaded from the configured sources
//! on the first data request and shared for the rest of the process.

pub mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use chrono::TimeDelta;
use landslide_viewer_auth::{FileUserStore, SessionStore, UserStore};
use landslide_viewer_source::cache::DatasetCache;
use landslide_viewer_source::config::AppConfig;

/// Shared application state.
pub struct AppState {
    /// Loaded configuration.
    pub config: AppConfig,
    /// Lazily loaded dataset.
    pub dataset: DatasetCache,
    /// Registered users.
    pub users: Arc<dyn UserStore>,
    /// Open login sessions.
    pub sessions: SessionStore,
}

impl AppState {
    /// State with an empty dataset cache and no open sessions. Sessions
    /// last `users.session_ttl_hours` from the config.
    #[must_use]
    pub fn new(config: AppConfig, users: Arc<dyn UserStore>) -> Self {
        let ttl = TimeDelta::try_hours(config.users.session_ttl_hours).unwrap_or_else(|| {
            TimeDelta::hours(landslide_viewer_auth::DEFAULT_SESSION_TTL_HOURS)
        });
        Self {
            config,
            dataset: DatasetCache::new(),
            users,
            sessions: SessionStore::with_ttl(ttl),
        }
    }
}

/// Registers the `/api` routes on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/auth/register", web::post().to(handlers::register))
            .route("/auth/login", web::post().to(handlers::login))
            .route("/auth/logout", web::post().to(handlers::logout))
            .route("/regions", web::get().to(handlers::regions))
            .route("/districts", web::get().to(handlers::districts))
            .route("/view", web::get().to(handlers::view)),
    );
}

/// Starts the landslide viewer API server.
///
/// Loads the configuration, opens the user store, and starts the
/// Actix-Web HTTP server on `BIND_ADDR:PORT` (default `127.0.0.1:8080`).
/// The caller is responsible for initializing logging and providing the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration or user store
/// cannot be loaded, or if the HTTP server fails to bind or encounters a
/// runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    log::info!("Loading configuration...");
    let config = AppConfig::load().map_err(std::io::Error::other)?;

    log::info!("Opening user store {}...", config.users.path.display());
    let users = FileUserStore::open(&config.users.path)
        .await
        .map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(config, Arc::new(users)));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
