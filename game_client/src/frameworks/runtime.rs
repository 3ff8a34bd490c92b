// Framework bootstrap for the headless mining client.

use crate::domain::PlayerStats;
use crate::domain::ports::{Backend, Ledger, SignedMessage, Signer, SnapshotStore, SubmarineRecord};
use crate::domain::progression::upgrade_message;
use crate::domain::tuning::tiers::MIN_TIER;
use crate::domain::tuning::world::WorldTuning;
use crate::frameworks::config;
use crate::interface_adapters::autopilot::autopilot_task;
use crate::interface_adapters::clients::backend::HttpBackend;
use crate::interface_adapters::clients::ledger::{HttpLedger, NoLedger};
use crate::interface_adapters::clients::session::session_task;
use crate::interface_adapters::clients::signer::HttpSigner;
use crate::interface_adapters::persistence::FileSnapshotStore;
use crate::use_cases::upgrade::UpgradeSettings;
use crate::use_cases::{
    Action, ClientWorld, EngineChannels, EngineCommand, EngineDeps, EngineSettings,
    SessionIdentity, engine_task,
};
use std::io::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{info, warn};

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

pub async fn run_with_config() -> Result<()> {
    init_runtime();
    run().await
}

pub async fn run() -> Result<()> {
    let call_timeout = config::external_call_timeout();
    let user_id = config::user_id();
    let session_id = config::session_id();
    let address = config::wallet_address();

    let backend: Arc<dyn Backend> = Arc::new(
        HttpBackend::new(&config::backend_url(), call_timeout)
            .map_err(|e| Error::other(format!("failed to initialize backend client: {e}")))?,
    );
    let signer: Arc<dyn Signer> = Arc::new(
        HttpSigner::new(&config::signer_url(), call_timeout)
            .map_err(|e| Error::other(format!("failed to initialize signer client: {e}")))?,
    );
    let ledger: Arc<dyn Ledger> = match config::ledger_url() {
        Some(url) => Arc::new(
            HttpLedger::new(&url, call_timeout)
                .map_err(|e| Error::other(format!("failed to initialize ledger client: {e}")))?,
        ),
        None => {
            info!("no ledger gateway configured; upgrades settle off-chain");
            Arc::new(NoLedger)
        }
    };
    let store: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new(config::data_dir()));

    let auth = match &address {
        Some(address) => authenticate(signer.as_ref(), address, call_timeout).await,
        None => {
            info!("no wallet configured; playing offline");
            None
        }
    };
    let record = load_submarine(backend.as_ref(), auth.as_ref(), call_timeout).await;
    let stats = PlayerStats::for_tier(record.tier)
        .or_else(|| PlayerStats::for_tier(MIN_TIER))
        .ok_or_else(|| Error::other("tier table is empty"))?;

    let mut world = ClientWorld::new(WorldTuning::default(), stats, record.balance, address);
    // Local pool until the session's first snapshot replaces it.
    world.spawn_local_pool(&mut rand::thread_rng());
    match store.load(&user_id).await {
        Ok(Some(snapshot)) => {
            info!(
                saved_session = %snapshot.session_id,
                energy = snapshot.energy,
                "resuming from local snapshot"
            );
            world.restore(&snapshot);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "failed to load local snapshot"),
    }

    let (command_tx, command_rx) = mpsc::channel::<EngineCommand>(config::COMMAND_CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(config::OUTBOUND_CHANNEL_CAPACITY);
    let (view_tx, view_rx) = watch::channel(world.view());

    let settings = EngineSettings {
        frame_interval: config::FRAME_INTERVAL,
        energy_interval: config::ENERGY_TICK_INTERVAL,
        autosave_interval: config::AUTOSAVE_INTERVAL,
        move_send_interval: config::MOVE_SEND_INTERVAL,
        call_timeout,
        upgrade: UpgradeSettings {
            call_timeout,
            submit_retries: config::UPGRADE_SUBMIT_RETRIES,
            retry_delay: config::UPGRADE_RETRY_DELAY,
        },
    };
    let identity = SessionIdentity {
        user_id,
        session_id: session_id.clone(),
        auth,
    };
    let engine = tokio::spawn(engine_task(
        world,
        EngineChannels {
            command_rx,
            command_tx: command_tx.clone(),
            view_tx,
            outbound_tx: Some(outbound_tx),
        },
        EngineDeps {
            signer,
            ledger,
            backend,
            store,
        },
        identity,
        settings,
    ));

    tokio::spawn(session_task(
        config::session_server_url(),
        session_id,
        config::SESSION_CONNECT_TIMEOUT,
        outbound_rx,
        command_tx.clone(),
    ));
    tokio::spawn(autopilot_task(
        view_rx,
        command_tx.clone(),
        config::AUTOPILOT_INTERVAL,
    ));

    let shutdown_tx = command_tx;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = shutdown_tx
                .send(EngineCommand::Action(Action::Disconnect))
                .await;
        }
    });

    engine
        .await
        .map_err(|e| Error::other(format!("engine task failed: {e}")))
}

async fn authenticate(
    signer: &dyn Signer,
    address: &str,
    call_timeout: Duration,
) -> Option<SignedMessage> {
    let message = upgrade_message(address);
    match timeout(call_timeout, signer.sign(&message)).await {
        Ok(Ok(signature)) => Some(SignedMessage {
            address: address.to_string(),
            message,
            signature,
        }),
        Ok(Err(e)) => {
            warn!(error = %e, "account signature unavailable; playing offline");
            None
        }
        Err(_) => {
            warn!("account signature timed out; playing offline");
            None
        }
    }
}

async fn load_submarine(
    backend: &dyn Backend,
    auth: Option<&SignedMessage>,
    call_timeout: Duration,
) -> SubmarineRecord {
    let offline = SubmarineRecord {
        tier: MIN_TIER,
        balance: 0,
    };
    let Some(auth) = auth else {
        return offline;
    };
    match timeout(call_timeout, backend.get_submarine(auth)).await {
        Ok(Ok(record)) => {
            info!(tier = record.tier, balance = record.balance, "submarine loaded");
            record
        }
        Ok(Err(e)) => {
            warn!(error = %e, "failed to load submarine; starting at tier 1");
            offline
        }
        Err(_) => {
            warn!("submarine lookup timed out; starting at tier 1");
            offline
        }
    }
}
