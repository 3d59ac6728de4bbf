//! Account Service Server
//!
//! Runs the HTTP API with every route enabled. Storage is PostgreSQL unless
//! `STORAGE_BACKEND=memory` is set, which keeps all data in process memory.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use account_service::{
    api::{AppState, RouterBuilder},
    config::{AppConfig, StorageBackend},
    database::{run_migrations, MemoryStore, PgStore, SessionStore, UserStore},
    service::{AuthService, JwtService, UserService},
    utils::password::{check_entropy_source, PasswordHasher, SaltedSha256Hasher},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Periodically delete sessions that can no longer be used
fn spawn_session_cleanup(jwt_service: Arc<JwtService>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match jwt_service.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => log::info!("Removed {} stale sessions", removed),
                Err(e) => log::error!("Session cleanup failed: {}", e),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    let config = AppConfig::from_env()?;

    // RUST_LOG takes precedence over LOG_LEVEL
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.server.log_level.as_str()),
    )
    .init();

    log::info!("Starting Account Service v{}", account_service::VERSION);

    // Salts come from the OS RNG; refuse to serve without it
    if let Err(e) = check_entropy_source() {
        log::error!("OS random number generator unavailable: {}", e);
        return Err(e.into());
    }

    config.validate()?;

    log::info!("Configuration loaded (storage: {})", config.storage);

    let (users, sessions): (Arc<dyn UserStore>, Arc<dyn SessionStore>) = match config.storage {
        StorageBackend::Postgres => {
            let db_config = config
                .database
                .as_ref()
                .ok_or("DATABASE_URL is required for the postgres backend")?;
            let pool = db_config.create_pool().await?;

            log::info!("Running database migrations...");
            run_migrations(&pool).await?;
            log::info!("Database migrations completed");

            let store = Arc::new(PgStore::new(pool));
            (store.clone(), store)
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; data will not survive a restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        }
    };

    let hasher: Arc<dyn PasswordHasher> = Arc::new(SaltedSha256Hasher::new());
    let jwt_service = Arc::new(JwtService::with_expiration(
        sessions,
        config.jwt.access_secret.clone(),
        config.jwt.refresh_secret.clone(),
        config.jwt.access_token_ttl(),
        config.jwt.refresh_token_ttl(),
    ));

    let app_state = AppState {
        user_service: Arc::new(UserService::new(
            users.clone(),
            jwt_service.sessions(),
            hasher.clone(),
        )),
        auth_service: Arc::new(AuthService::new(users, hasher, jwt_service.clone())),
        jwt_service: jwt_service.clone(),
    };

    if config.server.session_cleanup_interval_secs > 0 {
        spawn_session_cleanup(
            jwt_service.clone(),
            Duration::from_secs(config.server.session_cleanup_interval_secs),
        );
    }

    let app = RouterBuilder::with_all_routes()
        .build(jwt_service)
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.cors_origins))
                .into_inner(),
        );

    let bind_addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
