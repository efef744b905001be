//! WebSocket layer: upgrade handling and the per-connection loop.
//!
//! The endpoint at `/ws` carries `new-item` / `new-msg` events from the
//! client and `items` / `msgs` / `error` events back.

pub mod connection;
pub mod handler;
