use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use roombook::auth::SharedSecret;
use roombook::config::{Config, StoreKind};
use roombook::engine::{BookingEngine, SlotCatalog};
use roombook::store::{MemoryStore, ReservationStore, SheetsConfig, SheetsStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    roombook::observability::init(config.metrics_port);

    let store: Arc<dyn ReservationStore> = match &config.store {
        StoreKind::Memory => Arc::new(MemoryStore::seeded(
            config.rooms.as_deref().unwrap_or_default(),
            config.slots.as_deref().unwrap_or_default(),
        )),
        StoreKind::Sheets {
            spreadsheet_id,
            token,
            endpoint,
        } => Arc::new(SheetsStore::new(SheetsConfig {
            endpoint: endpoint.clone(),
            spreadsheet_id: spreadsheet_id.clone(),
            token: token.clone(),
            timeout: config.store_timeout,
        })?),
    };

    // Static catalog entries win; anything not configured comes from the store.
    let loaded = if config.rooms.is_some() && config.slots.is_some() {
        SlotCatalog::default()
    } else {
        SlotCatalog::load(&*store).await.unwrap_or_else(|e| {
            warn!("could not load catalog from store: {e}");
            SlotCatalog::default()
        })
    };
    let catalog = SlotCatalog::new(
        config.rooms.clone().unwrap_or_else(|| loaded.rooms().to_vec()),
        config.slots.clone().unwrap_or_else(|| loaded.slots().to_vec()),
    );

    let engine = Arc::new(BookingEngine::new(
        store,
        Arc::new(catalog),
        SharedSecret::new(config.secret.clone()),
    ));
    let app = roombook::api::router(engine);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("roombook listening on {addr}");
    info!(
        "  store: {}",
        match &config.store {
            StoreKind::Memory => "memory".to_string(),
            StoreKind::Sheets { spreadsheet_id, .. } => format!("sheets ({spreadsheet_id})"),
        }
    );
    info!("  store_timeout: {}s", config.store_timeout.as_secs());
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, let in-flight requests finish
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
        info!("shutdown signal received, draining requests");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("roombook stopped");
    Ok(())
}
