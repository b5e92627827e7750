// Demo server: a "Hello, World" app wrapped with the status routes

use std::net::SocketAddr;

use axum::{extract::Request, routing::get, Router, ServiceExt};
use tower::Layer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hcheck::{
    connect_database, status_layer, Dependencies, HealthConfig, ServerConfig, StatusOptions,
};

fn load_env() {
    dotenv::dotenv().ok();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    // Configure logging with tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let health_config = HealthConfig::from_env()?;
    let server_config = ServerConfig::from_env();
    tracing::info!("Configuration loaded");

    // Without a reachable database at startup there is no pool to query
    let db = match connect_database(&health_config.db_url).await {
        Ok(conn) => Some(conn),
        Err(e) => {
            tracing::warn!("Skipping database status check: {}", e);
            None
        }
    };
    let dependencies = Dependencies::from_config(&health_config, db);

    let mut options = StatusOptions::new().with_dependencies(dependencies);
    if let Some(user_agent) = &server_config.user_agent {
        options = options.with_user_agent(user_agent.clone());
    }

    let app = Router::new()
        .route("/", get(|| async { "Hello, World\n" }))
        .layer(TraceLayer::new_for_http());
    let app = status_layer(options)?.layer(app);

    let addr: SocketAddr = server_config.server_addr().parse()?;
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
