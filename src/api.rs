use crate::engine::{EngineFactory, RequestRouter, SessionGateway};
use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::str::Utf8Error;
use std::sync::Arc;

/// Boundary operation carried by a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Create,
    Learn,
    Infer,
}

/// Declared kind of a content item's payload.
///
/// Routing never depends on it: `create` reads the first payload as a format
/// identifier and `infer` treats every payload as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Url,
    Image,
    Unlearn,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Url => "url",
            ContentType::Image => "image",
            ContentType::Unlearn => "unlearn",
        }
    }
}

/// One unit of request content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentItem {
    pub kind: ContentType,
    pub payload: Vec<u8>,
    pub tags: Vec<String>,
}

impl ContentItem {
    pub fn new(kind: ContentType, payload: impl Into<Vec<u8>>) -> Self {
        Self { kind, payload: payload.into(), tags: Vec::new() }
    }

    /// A `text` item carrying `text` as UTF-8.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ContentType::Text, text.into().into_bytes())
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// The payload decoded as UTF-8.
    pub fn payload_text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.payload)
    }
}

/// A decoded request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Tenant scope; empty means the default session.
    pub tenant_id: String,
    pub command: Command,
    pub content: Vec<ContentItem>,
}

impl Request {
    pub fn new(tenant_id: impl Into<String>, command: Command, content: Vec<ContentItem>) -> Self {
        Self { tenant_id: tenant_id.into(), command, content }
    }
}

/// Result of `infer`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InferResponse {
    pub message: String,
}

/// Result of [`RequestRouter::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `create` and `learn` acknowledgment.
    Ack,
    Infer(InferResponse),
}

/// Build the default session and return a router ready to accept traffic.
///
/// This must complete before a transport starts accepting requests. An error
/// here is fatal: the process must not serve without a default session.
///
/// # Example
/// ```no_run
/// use parsegate::{ContentItem, LexiconConfig, LexiconFactory, ready};
///
/// let router = ready(LexiconFactory::new(LexiconConfig::default()), "CCGBANK").unwrap();
/// let out = router.infer("", &[ContentItem::text("The cat sat .")]).unwrap();
/// assert_eq!(out.message.lines().count(), 1);
/// ```
pub fn ready<F: EngineFactory>(factory: F, default_format: &str) -> Result<RequestRouter<F>, GatewayError> {
    let gateway = SessionGateway::initialize(factory, default_format)?;
    Ok(RequestRouter::new(Arc::new(gateway)))
}
