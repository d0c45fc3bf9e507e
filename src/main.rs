use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use family_stylizer::{api, backend, config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("family_stylizer=info,tower_http=info")),
        )
        .init();

    // Load configuration
    config::Config::dotenv_load();
    let config = Arc::new(config::Config::new()?);
    config.log_summary();

    let backend = backend::build_backend(&config);
    let state = Arc::new(api::AppState::new(config.clone(), backend));
    let app = api::create_router(state);

    let ip: std::net::IpAddr = config.api_host.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 0.0.0.0", config.api_host);
        std::net::IpAddr::from([0, 0, 0, 0])
    });
    let socket_address = SocketAddr::new(ip, config.api_port);
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
