// Network adapter modules split by client sockets, backend routes and internal HTTP routes.

pub mod backend;
pub mod client;
pub mod internal;

pub use backend::{balance_handler, submarine_handler, trade_handler, upgrade_handler};
pub use client::{spawn_session_serializer, ws_handler};
pub use internal::create_session_handler;
