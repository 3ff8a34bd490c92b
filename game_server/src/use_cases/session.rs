use super::accounts::AccountService;
use super::types::{MinedEvent, SessionEvent, SessionMessage, SessionSnapshot, SessionUpdate};
use crate::domain::errors::MineRejection;
use crate::domain::systems::{mining, spawning};
use crate::domain::tuning::world::WorldTuning;
use crate::domain::{NodeId, NodeSnapshot, PlayerSnapshot, ResourceType, SessionNode, SessionPlayer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tracing::{debug, info, warn};

/// Authoritative state of one session. Only the session task touches it.
struct SessionWorld {
    session_id: Arc<str>,
    tuning: WorldTuning,
    nodes: Vec<SessionNode>,
    players: Vec<SessionPlayer>,
    rng: StdRng,
}

impl SessionWorld {
    fn new(session_id: Arc<str>, tuning: WorldTuning, mut rng: StdRng) -> Self {
        let nodes = spawning::spawn_pool(&mut rng, &tuning);
        Self {
            session_id,
            tuning,
            nodes,
            players: Vec::new(),
            rng,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.to_string(),
            nodes: self.nodes.iter().map(NodeSnapshot::from).collect(),
            players: self.players.iter().map(PlayerSnapshot::from).collect(),
        }
    }

    fn player(&self, conn_id: u64) -> Option<&SessionPlayer> {
        self.players.iter().find(|p| p.conn_id == conn_id)
    }

    fn join(&mut self, conn_id: u64, address: String, tier: u8) {
        let center = (self.tuning.min_coord + self.tuning.max_coord) / 2.0;
        self.players.retain(|p| p.conn_id != conn_id);
        self.players.push(SessionPlayer {
            conn_id,
            address,
            tier,
            x: center,
            y: center,
            rotation: 0.0,
        });
    }

    fn move_player(&mut self, conn_id: u64, x: f32, y: f32, rotation: f32) -> bool {
        if !x.is_finite() || !y.is_finite() || !rotation.is_finite() {
            return false;
        }
        let (min, max) = (self.tuning.min_coord, self.tuning.max_coord);
        let Some(player) = self.players.iter_mut().find(|p| p.conn_id == conn_id) else {
            return false;
        };
        player.x = x.clamp(min, max);
        player.y = y.clamp(min, max);
        player.rotation = rotation;
        true
    }

    fn node_mut(&mut self, node_id: NodeId) -> Option<&mut SessionNode> {
        self.nodes.iter_mut().find(|node| node.id == node_id)
    }

    fn respawn_if_exhausted(&mut self) -> bool {
        if !spawning::all_depleted(&self.nodes) {
            return false;
        }
        self.nodes = spawning::spawn_pool(&mut self.rng, &self.tuning);
        true
    }
}

#[derive(Debug, Clone)]
pub struct SessionTaskConfig {
    pub snapshot_interval: Duration,
    pub tuning: WorldTuning,
    /// Fixed seed for node spawning; `None` seeds from entropy.
    pub seed: Option<u64>,
}

pub async fn session_task(
    session_id: Arc<str>,
    mut input_rx: mpsc::Receiver<SessionEvent>,
    update_tx: broadcast::Sender<SessionUpdate>,
    accounts: Arc<AccountService>,
    config: SessionTaskConfig,
    shutdown: Arc<Notify>,
) {
    let rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut world = SessionWorld::new(session_id.clone(), config.tuning, rng);
    // Joiners get a snapshot of their own, so the first periodic one waits a full period.
    let mut interval = tokio::time::interval_at(
        tokio::time::Instant::now() + config.snapshot_interval,
        config.snapshot_interval,
    );
    info!(session_id = %session_id, nodes = world.nodes.len(), "session started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the session is removed.
                break;
            }
            _ = interval.tick() => {
                if !world.players.is_empty() {
                    refresh_tiers(&mut world, &accounts).await;
                    broadcast_snapshot(&world, &update_tx);
                }
            }
            event = input_rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                handle_event(&mut world, event, &update_tx, &accounts).await;
            }
        }
    }
    info!(session_id = %session_id, "session stopped");
}

// Upgrades land through the account endpoints, so tiers are re-read before each snapshot.
async fn refresh_tiers(world: &mut SessionWorld, accounts: &AccountService) {
    for player in &mut world.players {
        match accounts.get_account(&player.address).await {
            Ok(account) => player.tier = account.tier,
            Err(e) => debug!(address = %player.address, error = %e, "tier refresh skipped"),
        }
    }
}

fn broadcast_snapshot(world: &SessionWorld, update_tx: &broadcast::Sender<SessionUpdate>) {
    let _ = update_tx.send(SessionUpdate {
        recipient: None,
        message: SessionMessage::Snapshot(world.snapshot()),
    });
}

fn send_to(update_tx: &broadcast::Sender<SessionUpdate>, conn_id: u64, message: SessionMessage) {
    let _ = update_tx.send(SessionUpdate {
        recipient: Some(conn_id),
        message,
    });
}

async fn handle_event(
    world: &mut SessionWorld,
    event: SessionEvent,
    update_tx: &broadcast::Sender<SessionUpdate>,
    accounts: &AccountService,
) {
    match event {
        SessionEvent::Join {
            conn_id,
            address,
            tier,
        } => {
            info!(conn_id, %address, tier, "player joined session");
            world.join(conn_id, address, tier);
            send_to(update_tx, conn_id, SessionMessage::Snapshot(world.snapshot()));
        }
        SessionEvent::Leave { conn_id } => {
            info!(conn_id, "player left session");
            world.players.retain(|p| p.conn_id != conn_id);
        }
        SessionEvent::Move {
            conn_id,
            x,
            y,
            rotation,
        } => {
            if !world.move_player(conn_id, x, y, rotation) {
                debug!(conn_id, "move ignored");
            }
        }
        SessionEvent::Mine {
            conn_id,
            node_id,
            amount,
            kind,
        } => {
            if let Err(rejection) =
                handle_mine(world, conn_id, node_id, amount, kind, update_tx, accounts).await
            {
                debug!(conn_id, node_id, reason = %rejection, "mine rejected");
                // The requester resyncs from the snapshot that follows the error.
                send_to(
                    update_tx,
                    conn_id,
                    SessionMessage::Error {
                        message: rejection.to_string(),
                        node_id: Some(node_id),
                    },
                );
                send_to(update_tx, conn_id, SessionMessage::Snapshot(world.snapshot()));
            }
        }
    }
}

async fn handle_mine(
    world: &mut SessionWorld,
    conn_id: u64,
    node_id: NodeId,
    amount: u32,
    kind: ResourceType,
    update_tx: &broadcast::Sender<SessionUpdate>,
    accounts: &AccountService,
) -> Result<(), MineRejection> {
    let player = world.player(conn_id).ok_or(MineRejection::NotJoined)?;
    let extraction = mining::validate(&world.nodes, player, node_id, kind, amount, &world.tuning)?;
    let address = player.address.clone();

    let accepted = match accounts
        .credit_mined(&address, extraction.kind, extraction.available)
        .await
    {
        Ok(0) => return Err(MineRejection::StorageFull),
        Ok(accepted) => accepted,
        Err(e) => {
            warn!(%address, error = %e, "failed to credit mined resources");
            return Err(MineRejection::Unavailable);
        }
    };

    let Some(node) = world.node_mut(node_id) else {
        return Err(MineRejection::UnknownNode(node_id));
    };
    let remaining = mining::apply(node, accepted);
    let _ = update_tx.send(SessionUpdate {
        recipient: None,
        message: SessionMessage::ResourceMined(MinedEvent {
            node_id,
            address,
            amount: accepted,
            kind: extraction.kind,
            remaining,
        }),
    });

    if world.respawn_if_exhausted() {
        info!(session_id = %world.session_id, "all nodes depleted; respawning pool");
        broadcast_snapshot(world, update_tx);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Account;
    use crate::domain::tuning::world::NodePoolTuning;
    use crate::use_cases::test_support::{FakeVerifier, RecordingStore};

    struct Harness {
        input_tx: mpsc::Sender<SessionEvent>,
        update_rx: broadcast::Receiver<SessionUpdate>,
        store: RecordingStore,
        shutdown: Arc<Notify>,
    }

    fn spawn_session(tuning: WorldTuning) -> Harness {
        spawn_session_with(tuning, Duration::from_secs(3600))
    }

    fn spawn_session_with(tuning: WorldTuning, snapshot_interval: Duration) -> Harness {
        let store = RecordingStore::new();
        let accounts = Arc::new(AccountService::new(
            Arc::new(store.clone()),
            Arc::new(FakeVerifier::default()),
        ));
        let (input_tx, input_rx) = mpsc::channel(16);
        let (update_tx, update_rx) = broadcast::channel(64);
        let shutdown = Arc::new(Notify::new());
        tokio::spawn(session_task(
            Arc::from("s-1"),
            input_rx,
            update_tx,
            accounts,
            SessionTaskConfig {
                snapshot_interval,
                tuning,
                seed: Some(42),
            },
            shutdown.clone(),
        ));
        Harness {
            input_tx,
            update_rx,
            store,
            shutdown,
        }
    }

    async fn next_update(rx: &mut broadcast::Receiver<SessionUpdate>) -> SessionUpdate {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("update in time")
            .expect("update channel open")
    }

    /// Joins and returns the initial snapshot sent to the joiner.
    async fn join(harness: &mut Harness, conn_id: u64) -> SessionSnapshot {
        harness
            .input_tx
            .send(SessionEvent::Join {
                conn_id,
                address: "0xabc".into(),
                tier: 1,
            })
            .await
            .expect("send join");
        loop {
            let update = next_update(&mut harness.update_rx).await;
            if let (Some(recipient), SessionMessage::Snapshot(snapshot)) =
                (update.recipient, update.message)
            {
                assert_eq!(recipient, conn_id);
                return snapshot;
            }
        }
    }

    async fn move_to(harness: &Harness, conn_id: u64, x: f32, y: f32) {
        harness
            .input_tx
            .send(SessionEvent::Move {
                conn_id,
                x,
                y,
                rotation: 0.0,
            })
            .await
            .expect("send move");
    }

    #[tokio::test]
    async fn join_sends_snapshot_to_the_joiner() {
        let mut harness = spawn_session(WorldTuning::default());

        let snapshot = join(&mut harness, 7).await;

        assert_eq!(snapshot.session_id, "s-1");
        assert_eq!(snapshot.nodes.len(), 30);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].address, "0xabc");
        harness.shutdown.notify_one();
    }

    #[tokio::test]
    async fn accepted_mine_is_broadcast_and_credited() {
        let mut harness = spawn_session(WorldTuning::default());
        let snapshot = join(&mut harness, 1).await;
        let node = snapshot.nodes[0].clone();
        move_to(&harness, 1, node.x, node.y).await;

        harness
            .input_tx
            .send(SessionEvent::Mine {
                conn_id: 1,
                node_id: node.id,
                amount: 5,
                kind: node.kind,
            })
            .await
            .expect("send mine");

        let update = next_update(&mut harness.update_rx).await;
        assert_eq!(update.recipient, None);
        let SessionMessage::ResourceMined(mined) = update.message else {
            panic!("expected resource-mined, got {:?}", update.message);
        };
        let expected = node.amount.min(5);
        assert_eq!(mined.amount, expected);
        assert_eq!(mined.remaining, node.amount - expected);
        let account = harness.store.get_test_account("0xabc").expect("account");
        assert_eq!(account.resources.get(node.kind), expected);
        harness.shutdown.notify_one();
    }

    #[tokio::test]
    async fn rejected_mine_sends_error_then_snapshot_to_requester() {
        let mut harness = spawn_session(WorldTuning::default());
        join(&mut harness, 1).await;

        harness
            .input_tx
            .send(SessionEvent::Mine {
                conn_id: 1,
                node_id: 999,
                amount: 5,
                kind: ResourceType::Nickel,
            })
            .await
            .expect("send mine");

        let error = next_update(&mut harness.update_rx).await;
        assert_eq!(error.recipient, Some(1));
        assert!(matches!(
            error.message,
            SessionMessage::Error {
                node_id: Some(999),
                ..
            }
        ));
        let resync = next_update(&mut harness.update_rx).await;
        assert_eq!(resync.recipient, Some(1));
        assert!(matches!(resync.message, SessionMessage::Snapshot(_)));
        harness.shutdown.notify_one();
    }

    #[tokio::test]
    async fn exhausted_pool_respawns() {
        let tuning = WorldTuning {
            pool: NodePoolTuning {
                size: 1,
                min_amount: 3,
                max_amount: 3,
                ..NodePoolTuning::default()
            },
            ..WorldTuning::default()
        };
        let mut harness = spawn_session(tuning);
        harness.store.insert_test_account(Account::new("0xabc"));
        let snapshot = join(&mut harness, 1).await;
        let node = snapshot.nodes[0].clone();
        move_to(&harness, 1, node.x, node.y).await;

        harness
            .input_tx
            .send(SessionEvent::Mine {
                conn_id: 1,
                node_id: node.id,
                amount: 5,
                kind: node.kind,
            })
            .await
            .expect("send mine");

        let mined = next_update(&mut harness.update_rx).await;
        assert!(matches!(
            mined.message,
            SessionMessage::ResourceMined(MinedEvent { remaining: 0, .. })
        ));
        let respawned = next_update(&mut harness.update_rx).await;
        let SessionMessage::Snapshot(fresh) = respawned.message else {
            panic!("expected respawn snapshot");
        };
        assert_eq!(fresh.nodes.len(), 1);
        assert!(!fresh.nodes[0].depleted);
        assert_eq!(fresh.nodes[0].amount, 3);
        harness.shutdown.notify_one();
    }

    #[tokio::test]
    async fn periodic_snapshot_reports_upgraded_tier() {
        let mut harness =
            spawn_session_with(WorldTuning::default(), Duration::from_millis(100));
        let joined = join(&mut harness, 1).await;
        assert_eq!(joined.players[0].tier, 1);

        harness.store.insert_test_account(Account {
            tier: 3,
            ..Account::new("0xabc")
        });

        let mut tier = None;
        for _ in 0..10 {
            let update = next_update(&mut harness.update_rx).await;
            if let (None, SessionMessage::Snapshot(snapshot)) = (update.recipient, update.message) {
                tier = Some(snapshot.players[0].tier);
                if tier == Some(3) {
                    break;
                }
            }
        }
        assert_eq!(tier, Some(3));
        harness.shutdown.notify_one();
    }

    #[tokio::test]
    async fn non_finite_moves_are_ignored() {
        let mut world = SessionWorld::new(
            Arc::from("s"),
            WorldTuning::default(),
            StdRng::seed_from_u64(1),
        );
        world.join(1, "0xabc".into(), 1);

        assert!(!world.move_player(1, f32::NAN, 10.0, 0.0));
        assert!(world.move_player(1, -500.0, 5000.0, 0.5));
        let player = world.player(1).expect("player");
        assert_eq!((player.x, player.y), (50.0, 1950.0));
    }
}
