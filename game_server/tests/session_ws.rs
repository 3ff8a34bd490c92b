mod support;

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error, Message, protocol::frame::coding::CloseCode};

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let url = support::session_ws_url(&format!("missing-{}", uuid::Uuid::new_v4()));

    let err = connect_async(url.as_str())
        .await
        .expect_err("handshake should be refused");

    match err {
        Error::Http(response) => assert_eq!(response.status().as_u16(), 404),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_first_message_must_be_join() {
    let url = support::session_ws_url("default");
    let (mut stream, _) = connect_async(url.as_str()).await.expect("connect");

    let mine = serde_json::json!({
        "type": "mine",
        "data": { "nodeId": 1, "amount": 5, "type": "nickel" }
    });
    stream
        .send(Message::Text(mine.to_string().into()))
        .await
        .expect("send mine");

    let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("close in time");
    match frame {
        Some(Ok(Message::Close(Some(close)))) => {
            assert_eq!(close.code, CloseCode::Policy);
            assert_eq!(close.reason.as_str(), "join required");
        }
        other => panic!("expected policy close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_with_wrong_message_is_refused() {
    let url = support::session_ws_url("default");
    let (mut stream, _) = connect_async(url.as_str()).await.expect("connect");

    // The signed text must be the canonical message; this never reaches the verifier.
    let join = serde_json::json!({
        "type": "join-session",
        "data": {
            "address": "0xabc",
            "sessionId": "default",
            "message": "let me in",
            "signature": "0xsig"
        }
    });
    stream
        .send(Message::Text(join.to_string().into()))
        .await
        .expect("send join");

    let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("close in time");
    match frame {
        Some(Ok(Message::Close(Some(close)))) => {
            assert_eq!(close.code, CloseCode::Policy);
            assert_eq!(close.reason.as_str(), "invalid signature");
        }
        other => panic!("expected policy close, got {other:?}"),
    }
}
