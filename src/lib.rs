//! # catalog-chat-gateway
//!
//! Clustered HTTP and WebSocket server for a live product catalog and a
//! chat room.
//!
//! Clients open a persistent WebSocket, receive the full catalog and chat
//! history, and from then on get a fresh snapshot of a collection every
//! time anyone adds to it. In cluster mode a supervisor process keeps one
//! worker per CPU alive; workers share the listening port, the database,
//! and the session store, but nothing else.
//!
//! ## Architecture
//!
//! ```text
//! Supervisor (cluster/)          ── spawns / respawns ──┐
//!                                                        ▼
//! Worker process (worker.rs)
//!     │
//!     ├── REST Handlers (api/)      WS Handler (ws/)
//!     │
//!     ├── StorefrontService / SessionService (service/)
//!     ├── BroadcastEngine (service/)
//!     │
//!     ├── ConnectionRegistry (domain/)
//!     │
//!     └── PostgreSQL or in-memory stores (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod worker;
pub mod ws;
