use std::{env, path::PathBuf, time::Duration};

// Runtime/client constants (not gameplay tuning).

pub fn session_server_url() -> String {
    env::var("SESSION_SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:3001".to_string())
}

pub fn backend_url() -> String {
    env::var("BACKEND_URL").unwrap_or_else(|_| session_server_url())
}

// No gateway configured means every upgrade takes the signed off-chain path.
pub fn ledger_url() -> Option<String> {
    env::var("LEDGER_URL").ok().filter(|value| !value.trim().is_empty())
}

pub fn signer_url() -> String {
    env::var("SIGNER_URL").unwrap_or_else(|_| "http://127.0.0.1:3003".to_string())
}

pub fn wallet_address() -> Option<String> {
    env::var("WALLET_ADDRESS")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_id() -> String {
    env::var("SESSION_ID").unwrap_or_else(|_| "default".to_string())
}

pub fn user_id() -> String {
    env::var("USER_ID")
        .ok()
        .or_else(wallet_address)
        .unwrap_or_else(|| "guest".to_string())
}

pub fn data_dir() -> PathBuf {
    env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".game_client"))
}

pub fn external_call_timeout() -> Duration {
    let millis = env::var("EXTERNAL_CALL_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(20_000);
    Duration::from_millis(millis)
}

pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const ENERGY_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(10);
pub const MOVE_SEND_INTERVAL: Duration = Duration::from_millis(100);
pub const AUTOPILOT_INTERVAL: Duration = Duration::from_millis(50);
pub const SESSION_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const UPGRADE_SUBMIT_RETRIES: u32 = 2;
pub const UPGRADE_RETRY_DELAY: Duration = Duration::from_millis(500);
