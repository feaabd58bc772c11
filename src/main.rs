use std::sync::Arc;

use axum::Router;
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::cors::CorsLayer;

use blogforge::core::auth::jwt::JwtService;
use blogforge::core::auth::{AuthService, auth_router};
use blogforge::core::blogs::blogs_router;
use blogforge::core::config::Config;
use blogforge::core::db::pool::{DbConfig, create_pool_with_migrations};
use blogforge::core::db::repositories::{BlogRepository, RefreshTokenRepository, UserRepository};
use blogforge::core::state::AppState;
use blogforge::core::storage::{HttpObjectStorage, InMemoryStorage, ObjectStorage};
use blogforge::core::users::{UserService, users_router};

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load application config from environment variables
    let config = Config::from_env().expect("invalid configuration");

    let db_config = DbConfig::new(&config.database_url);
    let pool = create_pool_with_migrations(&db_config)
        .await
        .expect("failed to initialize database");

    // Explicit constructor composition: every component receives its
    // collaborators here, nothing is wired through ambient globals
    let users = UserRepository::new(pool.clone());
    let refresh_tokens = RefreshTokenRepository::new(pool.clone());
    let blogs = BlogRepository::new(pool.clone());

    let jwt = JwtService::new(&config.jwt_secret, config.access_token_expiration_minutes);
    let auth = AuthService::new(
        users.clone(),
        refresh_tokens.clone(),
        jwt.clone(),
        config.refresh_token_expiration_days,
    );

    let storage: Arc<dyn ObjectStorage> = match &config.storage_url {
        Some(url) => Arc::new(HttpObjectStorage::new(url)),
        None => {
            tracing::warn!("STORAGE_URL not set, profile photos are kept in memory");
            Arc::new(InMemoryStorage::default())
        }
    };
    let user_service = UserService::new(users.clone(), refresh_tokens, storage);

    let state = AppState {
        users,
        blogs,
        auth,
        user_service,
        jwt,
        refresh_token_max_age_secs: config.refresh_token_expiration_secs(),
    };

    let app = Router::new()
        .merge(auth_router(state.clone()))
        .merge(blogs_router(state.clone()))
        .merge(users_router(state))
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Best),
        )
        .layer(CorsLayer::permissive());

    tracing::info!("listening on http://{}", &config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app).await.expect("server error");
}
