use crate::domain::errors::AccountError;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_conn_id;
use crate::use_cases::accounts::normalize_address;
use crate::use_cases::{
    AccountService, SessionEvent, SessionFrame, SessionHandle, SessionMessage, SessionRegistry,
    SessionUpdate,
};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    InputClosed,
    FramesClosed,
    JoinRequired,
    JoinTimeout,
    SessionMismatch,
    #[allow(dead_code)]
    Auth(AccountError),
    ClosedBeforeJoin,
}

#[derive(Debug, serde::Deserialize)]
pub struct SessionQuery {
    // The session the client wants to join.
    #[serde(default)]
    session_id: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_SIGNATURE_LEN: usize = 1024;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn session_update_serializer(
    mut update_rx: broadcast::Receiver<SessionUpdate>,
    frame_tx: broadcast::Sender<SessionFrame>,
    latest_snapshot_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each update once and broadcast the shared bytes.
    loop {
        match update_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::from(&update.message);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize session update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                if matches!(update.message, SessionMessage::Snapshot(_)) {
                    // Store the latest snapshot for lag recovery.
                    let _ = latest_snapshot_tx.send(bytes.clone());
                }
                let _ = frame_tx.send(SessionFrame {
                    recipient: update.recipient,
                    bytes,
                });
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "session serializer lagged; skipping to latest update");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("session updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_session_serializer(session: &SessionHandle) {
    tokio::spawn(session_update_serializer(
        session.update_tx.subscribe(),
        session.frame_tx.clone(),
        session.latest_snapshot_tx.clone(),
    ));
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Response {
    let session_id = query
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| state.default_session_id.to_string());

    let Some(session) = state.session_registry.get_session(&session_id).await else {
        return error_response(StatusCode::NOT_FOUND, "session_not_found", "session not found")
            .into_response();
    };

    let registry = state.session_registry.clone();
    let accounts = state.accounts.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, session, registry, accounts))
}

async fn handle_socket(
    socket: WebSocket,
    session: SessionHandle,
    registry: Arc<SessionRegistry>,
    accounts: Arc<AccountService>,
) {
    // Connection id correlates logs before and after the wallet is known.
    let conn_id = next_conn_id();
    let span = info_span!(
        "conn",
        conn_id,
        session_id = %session.session_id,
        address = tracing::field::Empty
    );
    serve_socket(socket, conn_id, session, registry, accounts)
        .instrument(span)
        .await
}

async fn serve_socket(
    mut socket: WebSocket,
    conn_id: u64,
    session: SessionHandle,
    registry: Arc<SessionRegistry>,
    accounts: Arc<AccountService>,
) {
    let mut ctx = match bootstrap_connection(&mut socket, conn_id, &session, registry, &accounts)
        .await
    {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            // The handshake already sent a close frame describing the failure.
            warn!(error = ?e, "failed to bootstrap connection");
            return;
        }
    };

    // Register the connection so the session stays alive while sockets are active.
    if ctx.registry.register_connection(&ctx.session_id).await.is_none() {
        warn!("session missing during connection registration");
        let _ = ctx.input_tx.send(SessionEvent::Leave { conn_id }).await;
        let _ = send_close_with_reason(&mut socket, close_code::POLICY, "session unavailable").await;
        return;
    }
    ctx.registered = true;

    tracing::Span::current().record("address", ctx.address.as_str());
    info!(address = %ctx.address, "client joined session");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

struct ConnCtx {
    conn_id: u64,
    // Authenticated, normalized wallet address.
    address: String,
    session_id: Arc<str>,
    registry: Arc<SessionRegistry>,
    // Whether the connection has been counted in the registry.
    registered: bool,
    input_tx: mpsc::Sender<SessionEvent>,
    frame_rx: broadcast::Receiver<SessionFrame>,
    latest_snapshot_rx: watch::Receiver<Utf8Bytes>,
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,

    last_input_full_log: Instant,
    last_frame_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    address: String,
    tier: u8,
    bytes_in: u64,
    msgs_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    conn_id: u64,
    session: &SessionHandle,
    registry: Arc<SessionRegistry>,
    accounts: &AccountService,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so the join snapshot cannot be missed.
    let frame_rx = session.frame_tx.subscribe();
    let latest_snapshot_rx = session.latest_snapshot_tx.subscribe();

    let join = match timeout(
        JOIN_HANDSHAKE_TIMEOUT,
        read_join_handshake(socket, &session.session_id, accounts),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    // The session answers Join with a snapshot addressed to this connection.
    session
        .input_tx
        .send(SessionEvent::Join {
            conn_id,
            address: join.address.clone(),
            tier: join.tier,
        })
        .await
        .map_err(|_| NetError::InputClosed)?;

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        conn_id,
        address: join.address,
        session_id: session.session_id.clone(),
        registry,
        registered: false,
        input_tx: session.input_tx.clone(),
        frame_rx,
        latest_snapshot_rx,
        lag_recovery_count: 0,

        msgs_in: join.msgs_in,
        msgs_out: 0,
        bytes_in: join.bytes_in,
        bytes_out: 0,

        invalid_json: 0,

        last_input_full_log: now,
        last_frame_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(
    socket: &mut WebSocket,
    session_id: &str,
    accounts: &AccountService,
) -> Result<JoinHandshake, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::JoinSession(payload)) => payload,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                if payload.session_id != session_id {
                    let _ =
                        send_close_with_reason(socket, close_code::POLICY, "session mismatch").await;
                    return Err(NetError::SessionMismatch);
                }
                if payload.signature.len() > MAX_SIGNATURE_LEN {
                    let _ = send_close_with_reason(socket, close_code::POLICY, "invalid signature")
                        .await;
                    return Err(NetError::Auth(AccountError::Unauthorized));
                }

                let verified = accounts
                    .authenticate(&payload.address, &payload.message, &payload.signature)
                    .await;
                let account = match verified {
                    Ok(address) => accounts.get_account(&address).await,
                    Err(e) => Err(e),
                };
                let account = match account {
                    Ok(account) => account,
                    Err(AccountError::Unauthorized) => {
                        let _ =
                            send_close_with_reason(socket, close_code::POLICY, "invalid signature")
                                .await;
                        return Err(NetError::Auth(AccountError::Unauthorized));
                    }
                    Err(AccountError::AuthUnavailable) => {
                        let _ =
                            send_close_with_reason(socket, close_code::ERROR, "auth unavailable")
                                .await;
                        return Err(NetError::Auth(AccountError::AuthUnavailable));
                    }
                    Err(e) => {
                        let _ =
                            send_close_with_reason(socket, close_code::ERROR, "account unavailable")
                                .await;
                        return Err(NetError::Auth(e));
                    }
                };

                return Ok(JoinHandshake {
                    address: account.address,
                    tier: account.tier,
                    bytes_in,
                    msgs_in: 1,
                });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Messages may repeat the wallet address; one naming another wallet is dropped.
fn claims_other_address(claimed: Option<&str>, address: &str) -> bool {
    claimed.is_some_and(|claimed| normalize_address(claimed) != address)
}

fn forward_event(
    conn_id: u64,
    input_tx: &mpsc::Sender<SessionEvent>,
    event: SessionEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(conn_id, "session input channel full; dropping message");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let conn_id = ctx.conn_id;
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame = ctx.frame_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if frame.recipient.is_none_or(|recipient| recipient == conn_id) {
                            matches!(
                                forward_bytes(frame.bytes, socket, &mut ctx.msgs_out, &mut ctx.bytes_out).await,
                                LoopControl::Disconnect
                            )
                        } else {
                            false
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_frame_lag_log) {
                            warn!(missed = n, "session updates lagged; sending snapshot");
                        }

                        // Resync strategy: the latest snapshot supersedes everything missed.
                        let latest = ctx.latest_snapshot_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            ctx.lag_recovery_count += 1;
                            matches!(
                                forward_bytes(latest, socket, &mut ctx.msgs_out, &mut ctx.bytes_out).await,
                                LoopControl::Disconnect
                            )
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::FramesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let conn_id = ctx.conn_id;
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::JoinSession(_)) => {
                        // Only the bootstrap join sets the identity.
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(conn_id, "duplicate join ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Ok(ClientMessage::Move(payload)) => {
                        if claims_other_address(payload.address.as_deref(), &ctx.address) {
                            if should_log(&mut ctx.last_invalid_input_log) {
                                warn!(conn_id, "move for another address ignored");
                            }
                            return Ok(LoopControl::Continue);
                        }
                        forward_event(
                            conn_id,
                            &ctx.input_tx,
                            SessionEvent::Move {
                                conn_id,
                                x: payload.position.x,
                                y: payload.position.y,
                                rotation: payload.position.rotation,
                            },
                            &mut ctx.last_input_full_log,
                        )
                    }
                    Ok(ClientMessage::Mine(payload)) => {
                        if claims_other_address(payload.address.as_deref(), &ctx.address) {
                            if should_log(&mut ctx.last_invalid_input_log) {
                                warn!(conn_id, "mine for another address ignored");
                            }
                            return Ok(LoopControl::Continue);
                        }
                        forward_event(
                            conn_id,
                            &ctx.input_tx,
                            SessionEvent::Mine {
                                conn_id,
                                node_id: payload.node_id,
                                amount: payload.amount,
                                kind: payload.kind.into(),
                            },
                            &mut ctx.last_input_full_log,
                        )
                    }
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                conn_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(conn_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(conn_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send session update");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let result = ctx
        .input_tx
        .send(SessionEvent::Leave {
            conn_id: ctx.conn_id,
        })
        .await
        .map_err(|_| NetError::InputClosed);

    if ctx.registered {
        ctx.registry.register_disconnect(&ctx.session_id).await;
    }

    debug!(
        conn_id = ctx.conn_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!(conn_id = ctx.conn_id, "client disconnected");
    result
}
