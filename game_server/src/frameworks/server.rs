// Framework bootstrap for the session server runtime.

use crate::domain::tuning::world::WorldTuning;
use crate::frameworks::config;
use crate::interface_adapters::clients::auth::AuthClient;
use crate::interface_adapters::net::spawn_session_serializer;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::store::InMemoryAccountStore;
use crate::use_cases::{AccountService, SessionRegistry, SessionSettings};

use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app(state)).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let auth_base_url = config::auth_service_url();
    let auth_verify_timeout = config::auth_verify_timeout();
    let auth_client = AuthClient::new(auth_base_url.clone(), auth_verify_timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize auth client: {e}")))?;
    tracing::debug!(
        auth_base_url = %auth_base_url,
        auth_verify_timeout_ms = auth_verify_timeout.as_millis(),
        "auth client configured"
    );

    let accounts = Arc::new(AccountService::new(
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(auth_client),
    ));

    let session_registry = Arc::new(SessionRegistry::new(
        SessionSettings {
            input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
            update_broadcast_capacity: config::UPDATE_BROADCAST_CAPACITY,
            snapshot_interval: config::SNAPSHOT_INTERVAL,
            tuning: WorldTuning::default(),
        },
        accounts.clone(),
    ));

    // The default session is pinned so it never gets removed.
    let default_session_id = config::default_session_id();
    let default_session = session_registry
        .create_session(default_session_id.clone(), true)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to create default session: {e}")))?;
    spawn_session_serializer(&default_session);

    Ok(Arc::new(AppState {
        session_registry,
        accounts,
        default_session_id: Arc::from(default_session_id.as_str()),
    }))
}
