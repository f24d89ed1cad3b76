//! Multi-tenant request gateway for stateful parsing engines.
//!
//! Each tenant gets its own engine session, built lazily from an output
//! format identifier and cached for the life of the process. Tenants that
//! never asked for a session are served by a default session built at
//! startup.
//!
//! ```text
//! create(tenant, [format]) ─▶ build + cache the tenant's session
//! learn(tenant, content)   ─▶ Ack
//! infer(tenant, content)   ─▶ tenant's session (or the default) ─▶ one line per parse
//! ```
//!
//! The gateway is generic over the backend ([`EngineFactory`]); the built-in
//! [`lexicon`] backend and the [`server`] transport are what the
//! `parsegate` binary wires together.

#[macro_use]
mod macros;
mod api;
mod config;
mod engine;
mod error;

pub mod lexicon;
pub mod server;

pub use api::{Command, ContentItem, ContentType, InferResponse, Request, Response, ready};
pub use config::{GatewayConfig, ServerConfig};
pub use engine::{
    Engine, EngineFactory, Formatter, GatewayMetrics, GatewayStatus, InferMetrics, MetricsSnapshot, Pipeline, Reader,
    RequestRouter, Session, SessionGateway, SessionInfo,
};
pub use error::{BackendError, BuildError, ConfigError, GatewayError};
pub use lexicon::{InputFormat, LexiconConfig, LexiconFactory, OutputFormat};
