//! API Management Plane Server
//!
//! Serves the management REST API over MongoDB, or over in-memory stores in
//! development.

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use apim_common::{init_logging, LogFormat};
use apim_config::{AppConfig, ConfigLoader, StorageBackend};
use apim_management::directory::User;
use apim_management::shared::middleware::{CallerDefaults, CallerLayer};
use apim_management::{apis_router, ApisState, DomainServices, InMemoryRepositories, Repositories};

const DEV_USER_ID: &str = "admin";

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::new().load()?;
    init_logging("apim-management-server", LogFormat::parse(&config.log_format));

    info!("Starting API management plane");

    let repositories = build_repositories(&config).await?;
    let services = DomainServices::new(&repositories, config.management.clone());

    let (router, mut openapi) = OpenApiRouter::new()
        .nest(
            "/management/environments/{envId}/apis",
            apis_router(ApisState::new(&services)),
        )
        .split_for_parts();
    openapi.info.title = "API Management".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Import, rollback, migration and deployment of APIs".to_string());

    let cors = if config.dev_mode || config.http.cors_origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origins = config
            .http
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<axum::http::HeaderValue>>();
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    };

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(CallerLayer::new(CallerDefaults {
            organization_id: config.management.default_organization_id.clone(),
        }))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API management plane shutdown complete");
    Ok(())
}

async fn build_repositories(config: &AppConfig) -> Result<Repositories> {
    match config.storage.backend {
        StorageBackend::Mongodb => {
            info!("Connecting to MongoDB: {}/{}", config.mongodb.uri, config.mongodb.database);
            let client = mongodb::Client::with_uri_str(&config.mongodb.uri).await?;
            let db = client.database(&config.mongodb.database);
            let repositories = Repositories::mongo(&db);
            if config.dev_mode {
                seed_dev_user(&repositories, config).await;
            }
            Ok(repositories)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on shutdown");
            let repositories = InMemoryRepositories::new().as_repositories();
            seed_dev_user(&repositories, config).await;
            Ok(repositories)
        }
    }
}

async fn seed_dev_user(repositories: &Repositories, config: &AppConfig) {
    let organization_id = &config.management.default_organization_id;
    match repositories.users.find_by_id(DEV_USER_ID).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let user = User::new(DEV_USER_ID, organization_id, "memory", DEV_USER_ID);
            if let Err(e) = repositories.users.create(&user).await {
                warn!("Dev user seeding skipped: {}", e);
            } else {
                info!(user_id = DEV_USER_ID, "Dev user seeded");
            }
        }
        Err(e) => warn!("Dev user seeding skipped: {}", e),
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
    info!("Shutdown signal received");
}
