//! A single worker process: stores, registry, broadcast engine, listener.
//!
//! Each worker is a complete copy of the application. Workers started by
//! the supervisor all bind the same port with `SO_REUSEPORT`, and the
//! kernel spreads incoming connections across them.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::WorkerConfig;
use crate::error::GatewayError;
use crate::persistence::{Backends, SessionStore};
use crate::ws::handler::ws_handler;

/// Runs a worker until a shutdown signal arrives.
///
/// Readiness is announced only by the `server listening` log line.
///
/// # Errors
///
/// Any startup failure is returned and is meant to end the process: an
/// invalid cookie secret, an unreachable database, or a port that cannot
/// be bound. Under a supervisor the worker is then respawned.
pub async fn run(port: u16, config: WorkerConfig) -> Result<(), GatewayError> {
    let cookie_key = config.cookie_key()?;
    let backends = Backends::connect(&config).await?;
    let _sweeper = spawn_session_sweeper(
        Arc::clone(&backends.sessions),
        Duration::from_secs(config.session_purge_interval_secs),
    );

    let state = AppState::new(backends, cookie_key);
    let app = build_app(state, &config.static_dir);

    let addr = SocketAddr::new(config.listen_host, port);
    let listener = bind_shared(addr)?;
    tracing::info!(%addr, pid = std::process::id(), "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(pid = std::process::id(), "worker stopped");
    Ok(())
}

/// Builds the worker's router: REST API, `/ws`, and static assets.
pub fn build_app(state: AppState, static_dir: &Path) -> Router {
    let http = Router::new()
        .merge(api::build_router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(CompressionLayer::new());

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .merge(http)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::docs::ApiDoc::openapi()),
        )
    };

    app
}

/// Binds `addr` so that several processes can listen on it at once.
///
/// # Errors
///
/// Returns the OS error if the socket cannot be created or bound.
pub fn bind_shared(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    #[cfg(unix)]
    socket.set_reuseport(true)?;
    socket.bind(addr)?;
    socket.listen(1024)
}

/// Periodically drops expired sessions. Disabled when `every` is zero.
fn spawn_session_sweeper(store: Arc<dyn SessionStore>, every: Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    }))
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn two_listeners_share_a_port() {
        let Ok(first) = bind_shared(SocketAddr::from(([127, 0, 0, 1], 0))) else {
            panic!("first bind failed");
        };
        let Ok(addr) = first.local_addr() else {
            panic!("no local addr");
        };
        #[cfg(unix)]
        assert!(bind_shared(addr).is_ok());
    }

    fn app() -> Router {
        let state = AppState::new(Backends::in_memory(), axum_extra::extract::cookie::Key::from(&[7u8; 64][..]));
        build_app(state, Path::new("public"))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = match app.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let Ok(bytes) = to_bytes(response.into_body(), 1 << 20).await else {
            panic!("unreadable body");
        };
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn empty_catalog_lists_as_empty_array() {
        let Ok(request) = Request::get("/api/items").body(Body::empty()) else {
            panic!("bad request");
        };
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn invalid_item_is_bad_request() {
        let Ok(request) = Request::post("/api/items")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Book","price":"ten"}"#))
        else {
            panic!("bad request");
        };
        let (status, body) = call(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);
    }

    #[tokio::test]
    async fn me_without_cookie_is_unauthorized() {
        let Ok(request) = Request::get("/api/sessions/me").body(Body::empty()) else {
            panic!("bad request");
        };
        let (status, _) = call(app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn zero_interval_disables_sweeper() {
        let store: Arc<dyn SessionStore> = Arc::new(crate::persistence::memory::MemorySessionStore::new());
        assert!(spawn_session_sweeper(store, Duration::ZERO).is_none());
    }
}
