use tokio::signal;
use tower_http::services::ServeDir;

use risk_register::{config, create_router, middleware, services::builtin_catalogue, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first
    let config = config::Settings::new()?;

    middleware::init_logging(&config.log_level, &config.log_format)?;

    tracing::info!("Starting risk register v{}", env!("CARGO_PKG_VERSION"));

    let app_state = AppState::new(&config).await?;

    if config.seed_mappings_on_startup {
        app_state
            .mapping_service
            .load_catalogue(&builtin_catalogue())
            .await?;
    }

    let cors_layer = middleware::create_cors_layer(config.cors_allow_origins.clone());

    let app = create_router(app_state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
        .layer(axum::middleware::from_fn(middleware::request_logging_middleware))
        .layer(middleware::create_logging_layer())
        .layer(cors_layer);

    let addr = config.bind_address();
    tracing::info!(static_dir = %config.static_dir, "Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
