//! Boundary-facing dispatcher.
//!
//! The router is where protocol requests meet the session layer, and the only
//! place where lower-level failures become [`GatewayError`]s.
//!
//! ```text
//! create ─▶ validate ─▶ upper-case format ─▶ SessionGateway::get_or_create
//! learn  ─▶ Ack (fixed no-op)
//! infer  ─▶ validate + decode ─▶ get_or_default ─▶ Session::with_lock {
//!               for each item: Reader ─▶ Engine ─▶ Formatter (skip on no parse)
//!           } ─▶ join("\n")
//! ```
//!
//! Validation always happens before any gateway or engine interaction, and the
//! session lock is never taken while the cache is being consulted.

use super::backend::{Engine, EngineFactory, Pipeline};
use super::gateway::SessionGateway;
use super::metrics::InferMetrics;
use crate::api::{Command, ContentItem, InferResponse, Request, Response};
use crate::error::{BackendError, GatewayError};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Dispatches `create` / `learn` / `infer` against a shared gateway.
pub struct RequestRouter<F: EngineFactory> {
    gateway: Arc<SessionGateway<F>>,
}

impl<F: EngineFactory> Clone for RequestRouter<F> {
    fn clone(&self) -> Self {
        Self { gateway: Arc::clone(&self.gateway) }
    }
}

impl<F: EngineFactory> RequestRouter<F> {
    pub fn new(gateway: Arc<SessionGateway<F>>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<SessionGateway<F>> {
        &self.gateway
    }

    /// Dispatch a decoded request envelope.
    pub fn handle(&self, request: &Request) -> Result<Response, GatewayError> {
        match request.command {
            Command::Create => self.create(&request.tenant_id, &request.content).map(|()| Response::Ack),
            Command::Learn => self.learn(&request.tenant_id, &request.content).map(|()| Response::Ack),
            Command::Infer => self.infer(&request.tenant_id, &request.content).map(Response::Infer),
        }
    }

    /// Create the tenant's session using the first item's payload as the
    /// output-format identifier.
    pub fn create(&self, tenant: &str, content: &[ContentItem]) -> Result<(), GatewayError> {
        debug!(tenant, "create");

        let Some(first) = content.first().filter(|item| !item.payload.is_empty()) else {
            info!(tenant, "empty content - no session created");
            return Err(GatewayError::invalid_argument("create needs an output format in its first content item"));
        };
        let format = first
            .payload_text()
            .map_err(|err| GatewayError::invalid_argument(format!("output format is not valid UTF-8: {err}")))?
            .trim()
            .to_uppercase();

        if tenant.is_empty() {
            debug!(format = %format, "create without a tenant id maps to the default session");
            return Ok(());
        }

        self.gateway.get_or_create(tenant, &format)?;
        Ok(())
    }

    /// Accepted and ignored.
    pub fn learn(&self, tenant: &str, content: &[ContentItem]) -> Result<(), GatewayError> {
        debug!(tenant, items = content.len(), "learn");
        Ok(())
    }

    /// Parse every content item with the tenant's session (or the default one)
    /// and join the rendered outputs with newlines, in input order.
    pub fn infer(&self, tenant: &str, content: &[ContentItem]) -> Result<InferResponse, GatewayError> {
        debug!(tenant, items = content.len(), "infer");

        if content.is_empty() {
            info!(tenant, "empty content passed to infer");
            return Err(GatewayError::invalid_argument("infer needs at least one content item"));
        }
        let texts = content
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.payload_text().map_err(|err| {
                    GatewayError::invalid_argument(format!("content item {idx} is not valid UTF-8: {err}"))
                })
            })
            .collect::<Result<Vec<&str>, _>>()?;

        let session = self.gateway.get_or_default(tenant);
        let requested = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            session.with_lock(|pipeline| run_items(pipeline, &texts, requested.elapsed()))
        }))
        .unwrap_or_else(|panic| Err(BackendError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok((lines, run)) => {
                self.gateway.metrics().record_infer(Some(&run));
                debug!(
                    tenant,
                    format = session.format(),
                    items = run.items,
                    parsed = run.parsed,
                    skipped = run.skipped,
                    lock_wait = ?run.lock_wait,
                    elapsed = ?run.pipeline,
                    "infer complete"
                );
                Ok(InferResponse { message: lines.join("\n") })
            }
            Err(err) => {
                self.gateway.metrics().record_infer(None);
                warn!(tenant, format = session.format(), error = %err, "infer failed");
                Err(err.into())
            }
        }
    }
}

fn run_items<E: Engine>(
    pipeline: &mut Pipeline<E>,
    texts: &[&str],
    lock_wait: Duration,
) -> Result<(Vec<String>, InferMetrics), BackendError> {
    let started = Instant::now();
    let mut run = InferMetrics { items: texts.len(), lock_wait, ..Default::default() };
    let mut lines = Vec::with_capacity(texts.len());

    for (request_id, text) in texts.iter().enumerate() {
        match pipeline.run(text, request_id)? {
            Some(line) => {
                run.parsed += 1;
                lines.push(line);
            }
            None => run.skipped += 1,
        }
    }

    run.pipeline = started.elapsed();
    Ok((lines, run))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
