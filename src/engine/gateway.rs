//! Tenant → session cache.
//!
//! The gateway owns the default session and a map of per-tenant slots. Each
//! slot is an `Arc<OnceCell<Arc<Session>>>`:
//!
//! ```text
//! sessions: DashMap<tenant, Slot>
//!                            │
//!                            └─ OnceCell ── empty ──get_or_try_init──▶ Session
//!                                  │                     (build runs here,
//!                                  │                      outside any map lock)
//!                                  └─ set ──▶ returned as-is forever
//! ```
//!
//! ## Locking
//!
//! - The map shard lock is only held long enough to fetch or insert a slot;
//!   it is never held while a factory builds an engine.
//! - Building is serialized *per slot* by `OnceCell::get_or_try_init`: racing
//!   `get_or_create` calls for one tenant run exactly one successful build and
//!   all observe the same session, while builds for different tenants proceed
//!   in parallel.
//! - `get_or_default` only reads initialized slots, so it never waits on an
//!   in-progress build.
//!
//! ## Failed builds
//!
//! A failed build leaves its slot empty. The slot is dropped from the map when
//! nobody else holds it, so the tenant stays absent and a later `create` is
//! free to try again.

use super::backend::EngineFactory;
use super::metrics::{GatewayMetrics, MetricsSnapshot};
use super::session::Session;
use crate::error::BuildError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

type Slot<E> = Arc<OnceCell<Arc<Session<E>>>>;

/// Lazily materializes and caches one session per tenant.
pub struct SessionGateway<F: EngineFactory> {
    factory: F,
    default: Arc<Session<F::Engine>>,
    sessions: DashMap<String, Slot<F::Engine>>,
    metrics: GatewayMetrics,
}

impl<F: EngineFactory> SessionGateway<F> {
    /// Build the default session and return a gateway ready for traffic.
    ///
    /// A gateway without a default session cannot exist: if this build fails
    /// the caller must not start serving.
    pub fn initialize(factory: F, default_format: &str) -> Result<Self, BuildError> {
        let format = default_format.trim().to_uppercase();
        let metrics = GatewayMetrics::default();
        let started = Instant::now();

        info!(format = %format, "building default session");
        let pipeline = match factory.build(&format) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                error!(format = %format, error = %err, "failed to build default session");
                return Err(err);
            }
        };
        metrics.record_build(true);
        info!(format = %format, elapsed = ?started.elapsed(), "default session ready");

        Ok(Self { factory, default: Arc::new(Session::new(format, pipeline)), sessions: DashMap::new(), metrics })
    }

    /// Return the tenant's session, building it with `format` on first use.
    ///
    /// An existing session is returned unchanged whatever `format` says; a
    /// tenant's engine is fixed once built. On failure the cache is left as it
    /// was and the error is returned to the caller.
    pub fn get_or_create(&self, tenant: &str, format: &str) -> Result<Arc<Session<F::Engine>>, BuildError> {
        let slot = Arc::clone(self.sessions.entry(tenant.to_string()).or_insert_with(Default::default).value());

        let mut built = false;
        let result = slot
            .get_or_try_init(|| {
                built = true;
                self.build(tenant, format)
            })
            .cloned();

        match result {
            Ok(session) => {
                if !built {
                    debug!(tenant, format = session.format(), "session already cached");
                }
                Ok(session)
            }
            Err(err) => {
                drop(slot);
                self.sessions.remove_if(tenant, |_, slot| slot.get().is_none() && Arc::strong_count(slot) == 1);
                Err(err)
            }
        }
    }

    /// Return the tenant's session if one exists, else the default session.
    pub fn get_or_default(&self, tenant: &str) -> Arc<Session<F::Engine>> {
        if tenant.is_empty() {
            return Arc::clone(&self.default);
        }
        self.sessions
            .get(tenant)
            .and_then(|slot| slot.value().get().cloned())
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    /// Whether `tenant` has a fully built session.
    pub fn contains(&self, tenant: &str) -> bool {
        self.sessions.get(tenant).is_some_and(|slot| slot.value().get().is_some())
    }

    /// Number of built tenant sessions (the default session excluded).
    pub fn len(&self) -> usize {
        self.sessions.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn default_session(&self) -> &Arc<Session<F::Engine>> {
        &self.default
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Serializable view of the cache and counters.
    pub fn status(&self) -> GatewayStatus {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .filter_map(|entry| {
                entry.value().get().map(|session| SessionInfo {
                    tenant: entry.key().clone(),
                    format: session.format().to_string(),
                    created_at: session.created_at(),
                })
            })
            .collect();
        sessions.sort_by(|a, b| a.tenant.cmp(&b.tenant));

        GatewayStatus {
            default_format: self.default.format().to_string(),
            sessions,
            metrics: self.metrics.snapshot(),
        }
    }

    fn build(&self, tenant: &str, format: &str) -> Result<Arc<Session<F::Engine>>, BuildError> {
        let started = Instant::now();
        debug!(tenant, format, "building session");

        match self.factory.build(format) {
            Ok(pipeline) => {
                self.metrics.record_build(true);
                info!(tenant, format, elapsed = ?started.elapsed(), "new session created");
                Ok(Arc::new(Session::new(format, pipeline)))
            }
            Err(err) => {
                self.metrics.record_build(false);
                error!(tenant, format, error = %err, "failed to create session");
                Err(err)
            }
        }
    }
}

/// One cached tenant session, as reported by [`SessionGateway::status`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub tenant: String,
    pub format: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub default_format: String,
    pub sessions: Vec<SessionInfo>,
    pub metrics: MetricsSnapshot,
}
