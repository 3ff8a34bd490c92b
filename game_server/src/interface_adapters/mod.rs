// Interface adapters: wire protocol, network handling and storage.

pub mod clients;
pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
