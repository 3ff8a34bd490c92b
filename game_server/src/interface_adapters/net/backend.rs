// Authoritative backend endpoints: balance, submarine state, upgrades and trades.

use crate::domain::ResourceAmounts;
use crate::interface_adapters::http::{ApiError, map_account_error};
use crate::interface_adapters::state::AppState;

use axum::extract::{Json, Path, Query, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    message: String,
    signature: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    balance: u64,
}

#[derive(Debug, Serialize)]
pub struct SubmarineResponse {
    tier: u8,
    balance: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    address: String,
    message: String,
    signature: String,
    target_tier: u8,
    #[serde(default)]
    on_chain_tx: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourcesBody {
    #[serde(default)]
    nickel: u32,
    #[serde(default)]
    cobalt: u32,
    #[serde(default)]
    copper: u32,
    #[serde(default)]
    manganese: u32,
}

impl From<ResourcesBody> for ResourceAmounts {
    fn from(body: ResourcesBody) -> Self {
        Self {
            nickel: body.nickel,
            cobalt: body.cobalt,
            copper: body.copper,
            manganese: body.manganese,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    address: String,
    message: String,
    signature: String,
    #[serde(default)]
    resources: ResourcesBody,
}

#[derive(Debug, Serialize)]
pub struct TradeResponse {
    earned: u64,
    balance: u64,
}

pub async fn balance_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let address = state
        .accounts
        .authenticate(&address, &query.message, &query.signature)
        .await
        .map_err(map_account_error)?;
    let account = state
        .accounts
        .get_account(&address)
        .await
        .map_err(map_account_error)?;
    Ok(Json(BalanceResponse {
        balance: account.balance,
    }))
}

pub async fn submarine_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Json<SubmarineResponse>, ApiError> {
    let address = state
        .accounts
        .authenticate(&address, &query.message, &query.signature)
        .await
        .map_err(map_account_error)?;
    let account = state
        .accounts
        .get_account(&address)
        .await
        .map_err(map_account_error)?;
    Ok(Json(SubmarineResponse {
        tier: account.tier,
        balance: account.balance,
    }))
}

pub async fn upgrade_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpgradeRequest>,
) -> Result<Json<SubmarineResponse>, ApiError> {
    let address = state
        .accounts
        .authenticate(&payload.address, &payload.message, &payload.signature)
        .await
        .map_err(map_account_error)?;
    let account = state
        .accounts
        .upgrade(&address, payload.target_tier, payload.on_chain_tx.as_deref())
        .await
        .map_err(map_account_error)?;
    Ok(Json(SubmarineResponse {
        tier: account.tier,
        balance: account.balance,
    }))
}

pub async fn trade_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TradeRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let address = state
        .accounts
        .authenticate(&payload.address, &payload.message, &payload.signature)
        .await
        .map_err(map_account_error)?;
    let receipt = state
        .accounts
        .trade(&address, payload.resources.into())
        .await
        .map_err(map_account_error)?;
    Ok(Json(TradeResponse {
        earned: receipt.earned,
        balance: receipt.balance,
    }))
}
