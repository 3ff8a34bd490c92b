// WebSocket link to the authoritative session.
//
// The link never touches engine state: decoded events go into the engine's command channel,
// outbound messages come from the engine's outbound channel.

use super::base_url_with_slash;
use crate::domain::ConnectionStatus;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::use_cases::{EngineCommand, OutboundMessage, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;

const LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum LinkError {
    Url(url::ParseError),
    ConnectTimeout,
    Connect(tokio_tungstenite::tungstenite::Error),
    Serialization(serde_json::Error),
    Send(tokio_tungstenite::tungstenite::Error),
    EngineClosed,
}

/// Builds `{base}/ws?session_id=...`, switching http(s) to ws(s).
pub fn session_ws_url(base_url: &str, session_id: &str) -> Result<Url, url::ParseError> {
    let mut url = base_url_with_slash(base_url)?.join("ws")?;
    let scheme = match url.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        _ => None,
    };
    if let Some(scheme) = scheme {
        // Only fails for cannot-be-a-base URLs, which `join` already ruled out.
        let _ = url.set_scheme(scheme);
    }
    url.query_pairs_mut().append_pair("session_id", session_id);
    Ok(url)
}

/// Runs the session link until either side closes. Connection status changes are reported
/// to the engine; a failed connect leaves the engine in offline mode.
pub async fn session_task(
    base_url: String,
    session_id: String,
    connect_timeout: Duration,
    outbound_rx: mpsc::Receiver<OutboundMessage>,
    command_tx: mpsc::Sender<EngineCommand>,
) {
    let span = info_span!("session", session_id = %session_id);
    async move {
        let result = run_link(
            &base_url,
            &session_id,
            connect_timeout,
            outbound_rx,
            &command_tx,
        )
        .await;
        if let Err(e) = result {
            warn!(error = ?e, "session link ended with error");
        }
        let _ = command_tx
            .send(EngineCommand::Connection(ConnectionStatus::Disconnected))
            .await;
    }
    .instrument(span)
    .await
}

async fn run_link(
    base_url: &str,
    session_id: &str,
    connect_timeout: Duration,
    mut outbound_rx: mpsc::Receiver<OutboundMessage>,
    command_tx: &mpsc::Sender<EngineCommand>,
) -> Result<(), LinkError> {
    let url = session_ws_url(base_url, session_id).map_err(LinkError::Url)?;
    notify(command_tx, ConnectionStatus::Connecting).await?;

    let (stream, _response) = timeout(connect_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| LinkError::ConnectTimeout)?
        .map_err(LinkError::Connect)?;
    info!(%url, "session connected");
    notify(command_tx, ConnectionStatus::Connected).await?;

    let (mut write, mut read) = stream.split();
    let mut invalid_messages: u64 = 0;
    let mut last_invalid_log = Instant::now() - LOG_THROTTLE;

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                let Some(outbound) = outbound else {
                    debug!("engine outbound channel closed; closing link");
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                };
                let text = serde_json::to_string(&ClientMessage::from(outbound))
                    .map_err(LinkError::Serialization)?;
                write
                    .send(Message::Text(text.into()))
                    .await
                    .map_err(LinkError::Send)?;
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerMessage>(text.as_str()) {
                            Ok(message) => {
                                command_tx
                                    .send(EngineCommand::Server(ServerEvent::from(message)))
                                    .await
                                    .map_err(|_| LinkError::EngineClosed)?;
                            }
                            Err(e) => {
                                invalid_messages += 1;
                                if last_invalid_log.elapsed() >= LOG_THROTTLE {
                                    last_invalid_log = Instant::now();
                                    warn!(
                                        error = %e,
                                        bytes = text.len(),
                                        total = invalid_messages,
                                        "malformed session message skipped"
                                    );
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(frame = ?frame, "session closed by server");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "session receive error");
                        return Ok(());
                    }
                    None => {
                        info!("session stream ended");
                        return Ok(());
                    }
                }
            }
        }
    }
}

async fn notify(
    command_tx: &mpsc::Sender<EngineCommand>,
    status: ConnectionStatus,
) -> Result<(), LinkError> {
    command_tx
        .send(EngineCommand::Connection(status))
        .await
        .map_err(|_| LinkError::EngineClosed)
}
