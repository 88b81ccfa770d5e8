//! Entry point: load config, connect to the database, wire dependencies, and serve.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidtube::auth::TokenService;
use vidtube::config::Config;
use vidtube::db::{self, PgCredentialStore, PgSubscriptionStore};
use vidtube::media::{CloudinaryHost, UploadStaging};
use vidtube::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;
    tracing::info!("database connected");

    let media = CloudinaryHost::new(config.cloudinary.clone())?;
    let state = AppState::new(
        Arc::new(PgCredentialStore::new(db_pool.clone())),
        Arc::new(PgSubscriptionStore::new(db_pool)),
        Arc::new(media),
        TokenService::new(config.tokens.clone()),
        UploadStaging::new(config.upload_temp_dir.clone()),
    );

    let app = create_app(state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http());

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Credentialed CORS: `*` mirrors the caller's origin since cookies forbid a wildcard.
fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::exact(HeaderValue::from_str(origin.trim())?)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}
