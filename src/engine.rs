//! Session layer.
//!
//! This module is the *public entry point* for the gateway core: everything
//! between a decoded request and a backend parser lives under `src/engine/`,
//! with public paths kept flat (for example `crate::engine::SessionGateway`
//! and `crate::engine::RequestRouter`).
//!
//! ## How the parts work together
//!
//! ```text
//!                        ready(factory, default_format)
//!                                    │
//!                                    v
//!   Request ──▶ RequestRouter ──▶ SessionGateway (gateway.rs)
//!               (router.rs)         - default session, built first
//!                 │                 - DashMap<tenant, OnceCell<Session>>
//!                 │                 - per-tenant build via EngineFactory
//!                 │                                 │
//!                 │                                 v
//!                 └────────────▶ Session::with_lock (session.rs)
//!                                   - one in-flight infer per session
//!                                   - Pipeline::run per content item
//!                                       Reader ─▶ Engine ─▶ Formatter
//!                                       (backend.rs)
//! ```
//!
//! Two kinds of lock exist and they never nest in the wrong order: a map shard
//! lock (held only to look up or insert a slot) and a session mutex (held for
//! the whole pipeline run of one `infer`). A slow build for one tenant never
//! holds either, so it cannot stall traffic for any other tenant.
//!
//! ## Responsibilities by module
//!
//! - `backend.rs`: the [`Engine`] / [`Reader`] / [`Formatter`] /
//!   [`EngineFactory`] contracts a backend implements.
//! - `session.rs`: [`Session`], a pipeline behind its own mutex.
//! - `gateway.rs`: [`SessionGateway`], the tenant cache.
//! - `router.rs`: [`RequestRouter`], validation and error translation.
//! - `metrics.rs`: counters and per-call timings.
//!
//! ## Debugging
//!
//! Run with `RUST_LOG=parsegate=debug` to trace cache hits, builds and
//! per-call lock wait times.

#[path = "engine/backend.rs"]
mod backend;
#[path = "engine/gateway.rs"]
mod gateway;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/router.rs"]
mod router;
#[path = "engine/session.rs"]
mod session;

#[cfg(test)]
#[path = "engine/testing.rs"]
pub(crate) mod testing;
#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use backend::{Engine, EngineFactory, Formatter, Pipeline, Reader};
pub use gateway::{GatewayStatus, SessionGateway, SessionInfo};
pub use metrics::{GatewayMetrics, InferMetrics, MetricsSnapshot};
pub use router::RequestRouter;
pub use session::Session;
