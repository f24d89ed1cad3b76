//! Per-tenant session.
//!
//! A `Session` is created exactly once, from exactly one successful
//! `EngineFactory::build`, and is immutable afterwards. The only thing that
//! changes over its lifetime is whether its lock is held.
//!
//! ```text
//! UNINITIALIZED ──build ok──▶ READY   (no teardown; process-lifetime)
//!       │
//!       └──build err──▶ (nothing left behind)
//! ```

use super::backend::{Engine, Pipeline};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};

/// One engine/reader/formatter triple behind a dedicated mutex.
pub struct Session<E: Engine> {
    format: String,
    created_at: DateTime<Utc>,
    pipeline: Mutex<Pipeline<E>>,
}

impl<E: Engine> Session<E> {
    pub(crate) fn new(format: impl Into<String>, pipeline: Pipeline<E>) -> Self {
        Self { format: format.into(), created_at: Utc::now(), pipeline: Mutex::new(pipeline) }
    }

    /// Output format this session was built for.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Run `action` with exclusive access to the pipeline.
    ///
    /// The lock is released when `action` returns, fails, or unwinds. A lock
    /// poisoned by an earlier panic is recovered rather than propagated, so
    /// one failed call never makes the session unusable.
    pub fn with_lock<R>(&self, action: impl FnOnce(&mut Pipeline<E>) -> R) -> R {
        let mut guard = self.pipeline.lock().unwrap_or_else(PoisonError::into_inner);
        action(&mut guard)
    }
}

impl<E: Engine> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("format", &self.format).field("created_at", &self.created_at).finish()
    }
}
