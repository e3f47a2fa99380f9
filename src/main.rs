use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use stockroom_api::{
    api_v1_routes, config, db,
    events::{process_events, EventSender},
    handlers::AppServices,
    openapi, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;

    config::init_tracing(&app_config.log_level, app_config.log_json);

    info!(
        environment = %app_config.environment,
        "Starting stockroom-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_pool = Arc::new(db::establish_connection_from_app_config(&app_config).await?);

    if app_config.auto_migrate {
        db::run_migrations(&db_pool).await?;
    }

    let (event_tx, event_rx) = mpsc::channel(app_config.event_channel_capacity);
    let event_sender = EventSender::new(event_tx);
    tokio::spawn(process_events(event_rx));

    let services = AppServices::new(db_pool.clone(), Arc::new(event_sender.clone()));

    let state = AppState {
        db: db_pool,
        config: app_config.clone(),
        event_sender,
        services,
    };

    let app = Router::new()
        .route("/", get(|| async { "Stockroom API - see /docs" }))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = app_config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => error!("Failed to install SIGTERM handler: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
