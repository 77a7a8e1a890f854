use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qrstudio::api;
use qrstudio::analytics::ScanRecorder;
use qrstudio::auth::AuthService;
use qrstudio::config::{AuthMode, Config};
use qrstudio::cursor::CursorSigner;
use qrstudio::objects;
use qrstudio::redirect::{self, RedirectState};
use qrstudio::service::QrService;
use qrstudio::storage;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration");

    let storage = storage::connect(&config.database).await?;
    info!("Database initialized successfully");

    let objects = objects::open(&config.object_store).await?;

    let auth_service = Arc::new(AuthService::new(&config.auth).await?);
    if config.auth.mode == AuthMode::None {
        info!("Authentication is disabled; owners come from the X-Owner-Id header");
    }

    let recorder = if config.analytics.enabled {
        info!(buffer_size = config.analytics.buffer_size, "Scan tracking enabled");
        Some(Arc::new(ScanRecorder::spawn(
            Arc::clone(&storage),
            config.analytics.buffer_size,
        )))
    } else {
        info!("Scan tracking disabled");
        None
    };

    let service = QrService::new(
        Arc::clone(&storage),
        objects,
        config.public_base_url.clone(),
        CursorSigner::new(config.cursor_hmac_secret.as_deref()),
    );

    let api_router = api::create_api_router(service, auth_service);
    let redirect_router = redirect::create_redirect_router(RedirectState {
        storage: Arc::clone(&storage),
        recorder: recorder.clone(),
        analytics: config.analytics.clone(),
    });

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("API server listening on http://{}/api", api_addr);

    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!(
        "Redirect server listening on http://{} (public base {})",
        redirect_addr, config.public_base_url
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });
    let shutdown = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };

    tokio::try_join!(
        axum::serve(
            api_listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>()
        )
        .with_graceful_shutdown(shutdown(shutdown_rx.clone())),
        axum::serve(
            redirect_listener,
            redirect_router.into_make_service_with_connect_info::<SocketAddr>()
        )
        .with_graceful_shutdown(shutdown(shutdown_rx)),
    )?;

    if let Some(recorder) = recorder {
        recorder.shutdown().await;
    }
    info!("Servers stopped");
    Ok(())
}
