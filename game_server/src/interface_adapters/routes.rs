use crate::interface_adapters::net::{
    balance_handler, create_session_handler, submarine_handler, trade_handler, upgrade_handler,
    ws_handler,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/sessions", post(create_session_handler))
        .route("/balance/{address}", get(balance_handler))
        .route("/submarine/{address}", get(submarine_handler))
        .route("/submarine/upgrade", post(upgrade_handler))
        .route("/submarine/trade", post(trade_handler))
        .with_state(state)
}
