// Engine actor: the single task that owns and mutates the client world.
//
// Everything that changes state arrives on one command channel. Slow work (upgrade, trade,
// autosave) runs in spawned tasks and reports back through the same channel.

use crate::domain::ConnectionStatus;
use crate::domain::errors::{BackendError, TradeError, UpgradeError};
use crate::domain::ports::{Backend, Ledger, SignedMessage, Signer, SnapshotStore};
use crate::use_cases::trade::TradeUseCase;
use crate::use_cases::types::{Action, EngineCommand, EngineView, OutboundMessage, ServerEvent};
use crate::use_cases::upgrade::{UpgradePipeline, UpgradeSettings};
use crate::use_cases::world::ClientWorld;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// External capabilities the engine hands to its background tasks.
#[derive(Clone)]
pub struct EngineDeps {
    pub signer: Arc<dyn Signer>,
    pub ledger: Arc<dyn Ledger>,
    pub backend: Arc<dyn Backend>,
    pub store: Arc<dyn SnapshotStore>,
}

/// Who is playing and where.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    /// Key for the local snapshot.
    pub user_id: String,
    pub session_id: String,
    /// Signed account message; `None` when no wallet is bound.
    pub auth: Option<SignedMessage>,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub frame_interval: Duration,
    pub energy_interval: Duration,
    pub autosave_interval: Duration,
    /// Minimum spacing between outbound position updates.
    pub move_send_interval: Duration,
    pub call_timeout: Duration,
    pub upgrade: UpgradeSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            energy_interval: Duration::from_secs(1),
            autosave_interval: Duration::from_secs(10),
            move_send_interval: Duration::from_millis(100),
            call_timeout: Duration::from_secs(20),
            upgrade: UpgradeSettings::default(),
        }
    }
}

/// Channels wired by the runtime.
pub struct EngineChannels {
    pub command_rx: mpsc::Receiver<EngineCommand>,
    /// Loopback sender for background task results.
    pub command_tx: mpsc::Sender<EngineCommand>,
    pub view_tx: watch::Sender<EngineView>,
    /// Outbound session messages; `None` runs fully offline.
    pub outbound_tx: Option<mpsc::Sender<OutboundMessage>>,
}

struct InFlight {
    attempt: u64,
    handle: JoinHandle<()>,
}

enum Flow {
    Continue,
    Stop,
}

struct Engine {
    world: ClientWorld,
    deps: EngineDeps,
    identity: SessionIdentity,
    settings: EngineSettings,
    command_tx: mpsc::Sender<EngineCommand>,
    outbound_tx: Option<mpsc::Sender<OutboundMessage>>,
    next_attempt: u64,
    upgrade: Option<InFlight>,
    trade: Option<InFlight>,
    autosave: Option<JoinHandle<()>>,
    position_dirty: bool,
    last_move_sent: Option<Instant>,
}

pub async fn engine_task(
    world: ClientWorld,
    channels: EngineChannels,
    deps: EngineDeps,
    identity: SessionIdentity,
    settings: EngineSettings,
) {
    let EngineChannels {
        mut command_rx,
        command_tx,
        view_tx,
        outbound_tx,
    } = channels;

    let mut engine = Engine {
        world,
        deps,
        identity,
        settings,
        command_tx,
        outbound_tx,
        next_attempt: 0,
        upgrade: None,
        trade: None,
        autosave: None,
        position_dirty: false,
        last_move_sent: None,
    };
    engine.publish(&view_tx);

    let mut frame = tokio::time::interval(settings.frame_interval);
    let mut energy = tokio::time::interval(settings.energy_interval);
    let mut autosave = tokio::time::interval(settings.autosave_interval);
    // The first tick of an interval fires immediately; only the frame clock wants that.
    energy.tick().await;
    autosave.tick().await;
    let mut last_frame = Instant::now();

    loop {
        let flow = tokio::select! {
            _ = frame.tick() => {
                let now = Instant::now();
                let dt_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
                last_frame = now;
                engine.frame(dt_ms);
                Flow::Continue
            }
            _ = energy.tick() => {
                engine.world.energy_tick(settings.energy_interval.as_secs_f64());
                Flow::Continue
            }
            _ = autosave.tick() => {
                engine.spawn_autosave();
                Flow::Continue
            }
            command = command_rx.recv() => match command {
                Some(command) => engine.handle(command).await,
                None => Flow::Stop,
            }
        };

        engine.publish(&view_tx);
        if let Flow::Stop = flow {
            break;
        }
    }
    info!(user_id = %engine.identity.user_id, "engine stopped");
}

impl Engine {
    fn publish(&self, view_tx: &watch::Sender<EngineView>) {
        let next = self.world.view();
        view_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn frame(&mut self, dt_ms: f64) {
        // A panicking frame is skipped; the panic hook has already logged it.
        match catch_unwind(AssertUnwindSafe(|| self.world.step_frame(dt_ms))) {
            Ok(moved) => self.position_dirty |= moved,
            Err(_) => {
                warn!(dt_ms, "frame step panicked; frame skipped");
                return;
            }
        }
        self.flush_position();
    }

    fn flush_position(&mut self) {
        if !self.position_dirty {
            return;
        }
        if self
            .last_move_sent
            .is_some_and(|at| at.elapsed() < self.settings.move_send_interval)
        {
            return;
        }
        let Some(address) = self.world.address().map(str::to_string) else {
            self.position_dirty = false;
            return;
        };
        let message = OutboundMessage::Move {
            position: self.world.position(),
            address,
            session_id: self.identity.session_id.clone(),
        };
        self.send_outbound(message);
        self.position_dirty = false;
        self.last_move_sent = Some(Instant::now());
    }

    async fn handle(&mut self, command: EngineCommand) -> Flow {
        match command {
            EngineCommand::Key { key, pressed } => self.world.set_key(key, pressed),
            EngineCommand::Action(action) => return self.action(action).await,
            EngineCommand::Server(event) => self.server_event(event),
            EngineCommand::Connection(status) => {
                info!(status = ?status, "session connection changed");
                self.world.set_connection(status);
                if status == ConnectionStatus::Connected {
                    self.join_session();
                }
            }
            EngineCommand::UpgradeFinished { attempt, result } => {
                if self.upgrade.as_ref().is_some_and(|f| f.attempt == attempt) {
                    self.upgrade = None;
                    self.world.finish_upgrade(result);
                } else {
                    debug!(attempt, "stale upgrade result ignored");
                }
            }
            EngineCommand::TradeFinished { attempt, result } => {
                if self.trade.as_ref().is_some_and(|f| f.attempt == attempt) {
                    self.trade = None;
                    self.world.finish_trade(result);
                } else {
                    debug!(attempt, "stale trade result ignored");
                }
            }
        }
        Flow::Continue
    }

    async fn action(&mut self, action: Action) -> Flow {
        match action {
            Action::Mine => self.mine(),
            Action::Upgrade { target_tier } => self.start_upgrade(target_tier),
            Action::Trade => self.start_trade(),
            Action::ToggleSidebar => self.world.toggle_sidebar(),
            Action::CancelUpgrade => self.cancel_upgrade(UpgradeError::Cancelled),
            Action::Disconnect => {
                self.shutdown().await;
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Snapshot(snapshot) => {
                debug!(nodes = snapshot.nodes.len(), "session snapshot applied");
                self.world.apply_snapshot(snapshot);
            }
            ServerEvent::ResourceMined(event) => {
                let outcome = self.world.apply_mined(&event);
                debug!(node_id = event.node_id, outcome = ?outcome, "resource-mined applied");
            }
            ServerEvent::Error { message, node_id } => {
                warn!(error = %message, node_id = ?node_id, "session reported error");
                self.world.apply_server_error(message, node_id);
            }
        }
    }

    fn join_session(&mut self) {
        let Some(auth) = self.identity.auth.clone() else {
            warn!("connected without a wallet; session join skipped");
            return;
        };
        self.send_outbound(OutboundMessage::JoinSession {
            address: auth.address,
            session_id: self.identity.session_id.clone(),
            message: auth.message,
            signature: auth.signature,
        });
        // Announce the current position right away.
        self.position_dirty = true;
        self.last_move_sent = None;
    }

    fn mine(&mut self) {
        let receipt = match self.world.mine() {
            Ok(receipt) => receipt,
            Err(err) => {
                debug!(error = %err, "mine rejected locally");
                return;
            }
        };
        debug!(
            node_id = receipt.node_id,
            amount = receipt.amount,
            kind = %receipt.kind,
            "mined"
        );
        let Some(address) = self.world.address().map(str::to_string) else {
            return;
        };
        self.send_outbound(OutboundMessage::Mine {
            node_id: receipt.node_id,
            session_id: self.identity.session_id.clone(),
            address,
            amount: receipt.amount,
            kind: receipt.kind,
        });
    }

    // Fire-and-forget: while offline or backed up the message is dropped.
    fn send_outbound(&self, message: OutboundMessage) {
        if self.world.connection() != ConnectionStatus::Connected {
            return;
        }
        let Some(outbound_tx) = &self.outbound_tx else {
            return;
        };
        match outbound_tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("outbound channel full; message dropped"),
            Err(TrySendError::Closed(_)) => debug!("session channel closed; message dropped"),
        }
    }

    fn start_upgrade(&mut self, target_tier: Option<u8>) {
        let plan = match self.world.begin_upgrade(target_tier) {
            Ok(plan) => plan,
            Err(err) => {
                info!(error = %err, "upgrade refused");
                self.world.report_error(err.to_string());
                return;
            }
        };

        let attempt = self.next_attempt();
        let pipeline = UpgradePipeline {
            signer: self.deps.signer.clone(),
            ledger: self.deps.ledger.clone(),
            backend: self.deps.backend.clone(),
            settings: self.settings.upgrade,
        };
        let command_tx = self.command_tx.clone();
        let handle = tokio::spawn(async move {
            let result = pipeline.execute(plan).await;
            let _ = command_tx
                .send(EngineCommand::UpgradeFinished { attempt, result })
                .await;
        });
        self.upgrade = Some(InFlight { attempt, handle });
    }

    fn cancel_upgrade(&mut self, reason: UpgradeError) {
        let Some(in_flight) = self.upgrade.take() else {
            return;
        };
        in_flight.handle.abort();
        info!(attempt = in_flight.attempt, "upgrade aborted");
        self.world.finish_upgrade(Err(reason));
    }

    fn start_trade(&mut self) {
        let resources = match self.world.begin_trade() {
            Ok(resources) => resources,
            Err(err) => {
                info!(error = %err, "trade refused");
                self.world.report_error(err.to_string());
                return;
            }
        };
        let Some(auth) = self.identity.auth.clone() else {
            self.world.finish_trade(Err(TradeError::NoWallet));
            return;
        };

        let attempt = self.next_attempt();
        let trade = TradeUseCase {
            backend: self.deps.backend.clone(),
            call_timeout: self.settings.call_timeout,
        };
        let command_tx = self.command_tx.clone();
        let handle = tokio::spawn(async move {
            let result = trade.execute(&auth, resources).await;
            let _ = command_tx
                .send(EngineCommand::TradeFinished { attempt, result })
                .await;
        });
        self.trade = Some(InFlight { attempt, handle });
    }

    fn next_attempt(&mut self) -> u64 {
        self.next_attempt += 1;
        self.next_attempt
    }

    // At most one autosave runs at a time; a slow one skips the next tick.
    fn spawn_autosave(&mut self) {
        if self.autosave.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("previous autosave still running; tick skipped");
            return;
        }
        let store = self.deps.store.clone();
        let user_id = self.identity.user_id.clone();
        let snapshot = self.world.local_snapshot(&self.identity.session_id);
        self.autosave = Some(tokio::spawn(async move {
            if let Err(err) = store.save(&user_id, &snapshot).await {
                warn!(error = %err, "autosave failed");
            }
        }));
    }

    async fn shutdown(&mut self) {
        self.cancel_upgrade(UpgradeError::Failed("disconnected".to_string()));
        if let Some(trade) = self.trade.take() {
            trade.handle.abort();
            self.world.finish_trade(Err(TradeError::Backend(BackendError::Unavailable(
                "disconnected".to_string(),
            ))));
        }
        self.world.set_connection(ConnectionStatus::Disconnected);

        // The final snapshot must land after any autosave still writing.
        if let Some(autosave) = self.autosave.take() {
            if let Err(err) = autosave.await {
                warn!(error = %err, "autosave task failed");
            }
        }
        let snapshot = self.world.local_snapshot(&self.identity.session_id);
        match self.deps.store.save(&self.identity.user_id, &snapshot).await {
            Ok(()) => info!(user_id = %self.identity.user_id, "local snapshot saved"),
            Err(err) => warn!(error = %err, "failed to save local snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{LedgerError, SignError};
    use crate::domain::ports::{SubmarineRecord, TradeReceipt, TxHandle};
    use crate::domain::tuning::world::WorldTuning;
    use crate::domain::{
        GamePhase, LocalSnapshot, PlayerStats, ResourceAmounts, ResourceNode, ResourceType,
    };
    use crate::use_cases::types::MinedEvent;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    const ADDRESS: &str = "0xabc";

    struct OkSigner;

    #[async_trait]
    impl Signer for OkSigner {
        async fn sign(&self, _message: &str) -> Result<String, SignError> {
            Ok("sig".into())
        }
    }

    struct NoChain {
        hang: bool,
    }

    #[async_trait]
    impl Ledger for NoChain {
        async fn approve_allowance(&self, _amount: u64) -> Result<TxHandle, LedgerError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Err(LedgerError::NoRevertibleBalance)
        }

        async fn upgrade(&self, _tier: u8) -> Result<TxHandle, LedgerError> {
            Err(LedgerError::NoRevertibleBalance)
        }

        async fn wait_for_confirmation(&self, _tx: &TxHandle) -> Result<(), LedgerError> {
            Ok(())
        }
    }

    struct FixedBackend;

    #[async_trait]
    impl Backend for FixedBackend {
        async fn get_balance(&self, _auth: &SignedMessage) -> Result<u64, BackendError> {
            Ok(100)
        }

        async fn get_submarine(&self, _auth: &SignedMessage) -> Result<SubmarineRecord, BackendError> {
            Ok(SubmarineRecord { tier: 1, balance: 100 })
        }

        async fn upgrade_submarine(
            &self,
            _auth: &SignedMessage,
            target_tier: u8,
            _on_chain_tx: Option<&str>,
        ) -> Result<SubmarineRecord, BackendError> {
            Ok(SubmarineRecord {
                tier: target_tier,
                balance: 50,
            })
        }

        async fn trade(
            &self,
            _auth: &SignedMessage,
            resources: ResourceAmounts,
        ) -> Result<TradeReceipt, BackendError> {
            let earned = crate::domain::trade::convert(&resources);
            Ok(TradeReceipt {
                earned,
                balance: 100 + earned,
            })
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<(String, LocalSnapshot)>>,
        started: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl SnapshotStore for RecordingStore {
        async fn load(&self, _user_id: &str) -> Result<Option<LocalSnapshot>, String> {
            Ok(None)
        }

        async fn save(&self, user_id: &str, snapshot: &LocalSnapshot) -> Result<(), String> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.saved
                .lock()
                .unwrap()
                .push((user_id.to_string(), snapshot.clone()));
            Ok(())
        }
    }

    struct Harness {
        command_tx: mpsc::Sender<EngineCommand>,
        view_rx: watch::Receiver<EngineView>,
        outbound_rx: mpsc::Receiver<OutboundMessage>,
        store: Arc<RecordingStore>,
        task: JoinHandle<()>,
    }

    impl Harness {
        async fn send(&self, command: EngineCommand) {
            self.command_tx.send(command).await.expect("engine alive");
        }

        async fn wait_for(&mut self, check: impl FnMut(&EngineView) -> bool) -> EngineView {
            timeout(Duration::from_secs(10), self.view_rx.wait_for(check))
                .await
                .expect("view condition timed out")
                .expect("engine alive")
                .clone()
        }

        async fn next_outbound(&mut self) -> OutboundMessage {
            timeout(Duration::from_secs(5), self.outbound_rx.recv())
                .await
                .expect("outbound timed out")
                .expect("outbound open")
        }
    }

    fn start(ledger_hangs: bool, balance: u64) -> Harness {
        start_with(
            ledger_hangs,
            balance,
            RecordingStore::default(),
            EngineSettings::default().autosave_interval,
        )
    }

    fn start_with(
        ledger_hangs: bool,
        balance: u64,
        store: RecordingStore,
        autosave_interval: Duration,
    ) -> Harness {
        let stats = PlayerStats::for_tier(1).unwrap();
        let mut world = ClientWorld::new(WorldTuning::default(), stats, balance, Some(ADDRESS.into()));
        let center = world.position();
        world.set_nodes(vec![ResourceNode::new(
            7,
            center.x + 10.0,
            center.y,
            ResourceType::Copper,
            50,
            20.0,
        )]);

        let (command_tx, command_rx) = mpsc::channel(64);
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let (view_tx, view_rx) = watch::channel(world.view());
        let store = Arc::new(store);
        let deps = EngineDeps {
            signer: Arc::new(OkSigner),
            ledger: Arc::new(NoChain { hang: ledger_hangs }),
            backend: Arc::new(FixedBackend),
            store: store.clone(),
        };
        let identity = SessionIdentity {
            user_id: "user-1".into(),
            session_id: "session-1".into(),
            auth: Some(SignedMessage {
                address: ADDRESS.into(),
                message: "account message".into(),
                signature: "sig".into(),
            }),
        };
        let settings = EngineSettings {
            upgrade: UpgradeSettings {
                call_timeout: Duration::from_secs(5),
                submit_retries: 0,
                retry_delay: Duration::from_millis(1),
            },
            autosave_interval,
            ..EngineSettings::default()
        };
        let task = tokio::spawn(engine_task(
            world,
            EngineChannels {
                command_rx,
                command_tx: command_tx.clone(),
                view_tx,
                outbound_tx: Some(outbound_tx),
            },
            deps,
            identity,
            settings,
        ));

        Harness {
            command_tx,
            view_rx,
            outbound_rx,
            store,
            task,
        }
    }

    #[tokio::test]
    async fn join_precedes_mine_and_ack_clears_pending() {
        let mut harness = start(false, 0);
        harness
            .send(EngineCommand::Connection(ConnectionStatus::Connected))
            .await;

        match harness.next_outbound().await {
            OutboundMessage::JoinSession {
                address,
                session_id,
                ..
            } => {
                assert_eq!(address, ADDRESS);
                assert_eq!(session_id, "session-1");
            }
            other => panic!("expected join first, got {other:?}"),
        }

        harness.send(EngineCommand::Action(Action::Mine)).await;
        let view = harness.wait_for(|view| view.pending_mines == 1).await;
        assert_eq!(view.resources.copper, 5);
        assert_eq!(view.phase, GamePhase::Mining);

        let mine = loop {
            match harness.next_outbound().await {
                OutboundMessage::Mine { node_id, amount, kind, .. } => break (node_id, amount, kind),
                OutboundMessage::Move { .. } => continue,
                other => panic!("unexpected outbound {other:?}"),
            }
        };
        assert_eq!(mine, (7, 5, ResourceType::Copper));

        harness
            .send(EngineCommand::Server(ServerEvent::ResourceMined(MinedEvent {
                node_id: 7,
                address: ADDRESS.to_uppercase(),
                amount: 5,
                kind: ResourceType::Copper,
                remaining: 45,
            })))
            .await;
        harness.wait_for(|view| view.pending_mines == 0).await;
    }

    #[tokio::test]
    async fn offline_mining_still_applies_locally() {
        let mut harness = start(false, 0);

        harness.send(EngineCommand::Action(Action::Mine)).await;

        let view = harness.wait_for(|view| view.resources.copper == 5).await;
        assert_eq!(view.connection, ConnectionStatus::Disconnected);
        assert!(harness.outbound_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn upgrade_falls_back_and_applies_backend_record() {
        let mut harness = start(false, 100);

        harness
            .send(EngineCommand::Action(Action::Upgrade { target_tier: None }))
            .await;

        let view = harness.wait_for(|view| view.stats.tier == 2).await;
        assert_eq!(view.phase, GamePhase::Upgraded);
        assert_eq!(view.balance, 50);
        assert_eq!(view.stats.capacity, ResourceAmounts::uniform(150));
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_upgrade() {
        let mut harness = start(true, 100);
        harness
            .send(EngineCommand::Action(Action::Upgrade { target_tier: None }))
            .await;
        harness
            .wait_for(|view| view.phase == GamePhase::Upgrading)
            .await;

        harness.send(EngineCommand::Action(Action::CancelUpgrade)).await;

        let view = harness.wait_for(|view| view.phase == GamePhase::Idle).await;
        assert_eq!(view.stats.tier, 1);
        assert_eq!(view.balance, 100);
        assert_eq!(view.last_error.as_deref(), Some("upgrade cancelled"));
    }

    #[tokio::test]
    async fn trade_credits_backend_balance() {
        let mut harness = start(false, 100);
        harness.send(EngineCommand::Action(Action::Mine)).await;
        harness.wait_for(|view| view.phase == GamePhase::Idle && view.resources.copper == 5).await;

        harness.send(EngineCommand::Action(Action::Trade)).await;

        let view = harness.wait_for(|view| view.phase == GamePhase::ResourceTraded).await;
        assert_eq!(view.balance, 105);
        assert_eq!(view.resources, ResourceAmounts::default());
    }

    #[tokio::test]
    async fn refused_upgrade_surfaces_message() {
        let mut harness = start(false, 0);

        harness
            .send(EngineCommand::Action(Action::Upgrade { target_tier: None }))
            .await;

        let view = harness.wait_for(|view| view.last_error.is_some()).await;
        assert_eq!(view.phase, GamePhase::Idle);
        assert_eq!(
            view.last_error.as_deref(),
            Some("insufficient funds: balance 0, upgrade costs 50")
        );
    }

    #[tokio::test]
    async fn disconnect_saves_snapshot_and_stops() {
        let harness = start(false, 0);

        harness.send(EngineCommand::Action(Action::Disconnect)).await;
        timeout(Duration::from_secs(5), harness.task)
            .await
            .expect("engine should stop")
            .expect("engine task should not panic");

        let saved = harness.store.saved.lock().unwrap();
        let (user_id, snapshot) = saved.last().expect("snapshot saved");
        assert_eq!(user_id, "user-1");
        assert_eq!(snapshot.session_id, "session-1");
        assert_eq!(snapshot.hull, 100);
    }

    #[tokio::test]
    async fn tier_skip_request_ends_idle_with_sequential_message() {
        let mut harness = start(false, 1_000);

        harness
            .send(EngineCommand::Action(Action::Upgrade {
                target_tier: Some(3),
            }))
            .await;

        let view = harness.wait_for(|view| view.last_error.is_some()).await;
        assert_eq!(view.phase, GamePhase::Idle);
        assert_eq!(view.stats.tier, 1);
        assert_eq!(view.balance, 1_000);
        assert_eq!(
            view.last_error.as_deref(),
            Some("you must upgrade sequentially (tier 1 can only move to tier 2)")
        );
    }

    #[tokio::test]
    async fn disconnect_snapshot_lands_after_running_autosave() {
        let store = RecordingStore {
            delay: Duration::from_millis(300),
            ..RecordingStore::default()
        };
        let mut harness = start_with(false, 0, store, Duration::from_millis(50));
        timeout(Duration::from_secs(5), async {
            while harness.store.started.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("autosave should start");

        harness.send(EngineCommand::Action(Action::Mine)).await;
        let mined = harness.wait_for(|view| view.resources.copper == 5).await;
        assert!(mined.stats.energy.current() < 100.0);
        harness.send(EngineCommand::Action(Action::Disconnect)).await;
        timeout(Duration::from_secs(5), harness.task)
            .await
            .expect("engine should stop")
            .expect("engine task should not panic");

        let saved = harness.store.saved.lock().unwrap();
        let (_, last) = saved.last().expect("snapshot saved");
        assert_eq!(last.energy, mined.stats.energy.current());
    }
}
