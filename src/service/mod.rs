//! Service layer: write-then-broadcast orchestration and sessions.

pub mod broadcast_engine;
pub mod session_service;
pub mod storefront_service;

pub use broadcast_engine::BroadcastEngine;
pub use session_service::SessionService;
pub use storefront_service::StorefrontService;
