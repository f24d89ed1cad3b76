//! HTTP/JSON transport over a [`RequestRouter`].
//!
//! ```text
//! POST /v1/create ─┐
//! POST /v1/learn  ─┼─▶ acquire permit ─▶ spawn_blocking(RequestRouter::…) ─▶ JSON
//! POST /v1/infer  ─┘    (max_concurrent_requests)
//! GET  /v1/health, /v1/status
//! ```
//!
//! Builds and parses are blocking calls, so every boundary call runs on the
//! blocking pool and the reactor threads only shuffle bytes. The default
//! session has been built (see [`ready`](crate::ready)) before a listener is
//! ever bound.

#[path = "server/error.rs"]
mod error;
#[path = "server/handlers.rs"]
mod handlers;
#[path = "server/wire.rs"]
mod wire;

pub use error::ApiError;
pub use wire::{InferBody, RequestBody, WireItem};

use crate::config::ServerConfig;
use crate::engine::{EngineFactory, RequestRouter};
use crate::error::GatewayError;
use axum::Router;
use axum::routing::{get, post};
use std::future::{Future, IntoFuture};
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{Semaphore, oneshot};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state.
pub struct AppState<F: EngineFactory> {
    pub router: RequestRouter<F>,
    /// Bounds boundary calls in flight at once.
    pub request_semaphore: Arc<Semaphore>,
}

impl<F: EngineFactory> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self { router: self.router.clone(), request_semaphore: Arc::clone(&self.request_semaphore) }
    }
}

impl<F: EngineFactory> AppState<F> {
    pub fn new(router: RequestRouter<F>, max_concurrent: usize) -> Self {
        Self { router, request_semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))) }
    }

    /// Run `op` against the router on the blocking pool.
    ///
    /// The permit moves into the blocking task, so a caller that gives up
    /// early doesn't free its slot while `op` is still running.
    async fn call<T, G>(&self, op: G) -> Result<T, ApiError>
    where
        T: Send + 'static,
        G: FnOnce(&RequestRouter<F>) -> Result<T, GatewayError> + Send + 'static,
    {
        let permit = Arc::clone(&self.request_semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ApiError::unavailable("server is shutting down"))?;

        let router = self.router.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            op(&router)
        })
        .await;
        joined.map_err(|err| ApiError::internal(format!("worker task failed: {err}")))?.map_err(ApiError::from)
    }
}

/// Create the API router.
pub fn create_router<F: EngineFactory>(state: AppState<F>) -> Router {
    let v1_routes = Router::new()
        .route("/create", post(handlers::create::<F>))
        .route("/learn", post(handlers::learn::<F>))
        .route("/infer", post(handlers::infer::<F>))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status::<F>));

    Router::new().nest("/v1", v1_routes).layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind `config.bind` and serve until Ctrl+C or SIGTERM.
pub async fn serve<F: EngineFactory>(router: RequestRouter<F>, config: &ServerConfig) -> io::Result<()> {
    let listener = TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    serve_with_shutdown(listener, router, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves, then give
/// in-flight requests `shutdown_grace_secs` to finish.
pub async fn serve_with_shutdown<F, S>(
    listener: TcpListener,
    router: RequestRouter<F>,
    config: &ServerConfig,
    shutdown: S,
) -> io::Result<()>
where
    F: EngineFactory,
    S: Future<Output = ()> + Send,
{
    let app = create_router(AppState::new(router, config.max_concurrent_requests));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = stop_rx.await;
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        joined = &mut server => return joined.map_err(io::Error::other)?,
        () = shutdown => {}
    }

    info!(grace = ?config.shutdown_grace(), "draining in-flight requests");
    let _ = stop_tx.send(());
    match tokio::time::timeout(config.shutdown_grace(), &mut server).await {
        Ok(joined) => joined.map_err(io::Error::other)?,
        Err(_) => {
            warn!("grace period elapsed, dropping remaining connections");
            server.abort();
            Ok(())
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ready;
    use crate::engine::testing::{MockFactory, Probe};
    use std::time::Duration;

    #[tokio::test]
    async fn stops_when_the_shutdown_future_resolves() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let router = ready(MockFactory::new(), "CCGBANK").unwrap();
        let config = ServerConfig { shutdown_grace_secs: 1, ..ServerConfig::default() };

        let served = tokio::time::timeout(
            Duration::from_secs(5),
            serve_with_shutdown(listener, router, &config, tokio::time::sleep(Duration::from_millis(20))),
        )
        .await;
        assert!(matches!(served, Ok(Ok(()))));
    }

    #[test]
    fn app_state_always_admits_at_least_one_call() {
        let state = AppState::new(ready(MockFactory::new(), "CCGBANK").unwrap(), 0);
        assert_eq!(state.request_semaphore.available_permits(), 1);
    }

    #[tokio::test]
    async fn abandoned_calls_keep_their_permit_until_the_work_ends() {
        let state = AppState::new(ready(MockFactory::new(), "CCGBANK").unwrap(), 1);
        let work = Arc::new(Probe::default());

        for _ in 0..3 {
            let work = Arc::clone(&work);
            let call = state.call(move |_| {
                work.enter();
                std::thread::sleep(Duration::from_millis(300));
                work.leave();
                Ok(())
            });
            assert!(tokio::time::timeout(Duration::from_millis(50), call).await.is_err());
        }

        // The first op is still running; the other two never got a permit.
        assert_eq!(work.calls(), 1);
        assert_eq!(state.request_semaphore.available_permits(), 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(work.max_active(), 1);
        assert_eq!(work.active(), 0);
        assert_eq!(state.request_semaphore.available_permits(), 1);
    }
}
