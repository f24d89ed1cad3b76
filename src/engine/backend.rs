//! Backend collaborator contracts.
//!
//! The gateway never looks inside a parser. A backend plugs in by implementing
//! [`EngineFactory`], which hands back a [`Pipeline`]: one stateful [`Engine`]
//! plus the [`Reader`] that feeds it and the [`Formatter`] that renders its
//! output.
//!
//! ```text
//! raw text ──Reader::read──▶ E::Input ──Engine::parse──▶ Option<E::Output>
//!                                                             │
//!                                      Formatter::format ◀────┘ (Some only)
//!                                             │
//!                                             ▼
//!                                           String
//! ```
//!
//! `Engine::parse` takes `&mut self`: engines are allowed to mutate internal
//! state during a parse, and the borrow checker plus the session lock make
//! sure only one caller is inside at a time.

use crate::error::{BackendError, BuildError};

/// A stateful, non-reentrant parsing engine.
pub trait Engine: Send + 'static {
    /// Engine input as produced by a [`Reader`].
    type Input;
    /// One parse result, consumed by a [`Formatter`].
    type Output;

    /// Parse one input unit. `Ok(None)` means the engine found no parse.
    fn parse(&mut self, input: &Self::Input) -> Result<Option<Self::Output>, BackendError>;
}

/// Converts raw request text into engine input.
pub trait Reader<I>: Send {
    fn read(&self, text: &str) -> Result<I, BackendError>;
}

/// Renders a parse result as response text.
///
/// `request_id` is the zero-based position of the content item within the
/// request; formats that do not number their output ignore it.
pub trait Formatter<O>: Send {
    fn format(&self, result: &O, request_id: usize) -> Result<String, BackendError>;
}

/// The triple owned by a session.
pub struct Pipeline<E: Engine> {
    pub engine: E,
    pub reader: Box<dyn Reader<E::Input>>,
    pub formatter: Box<dyn Formatter<E::Output>>,
}

impl<E: Engine> Pipeline<E> {
    pub fn new(
        engine: E,
        reader: impl Reader<E::Input> + 'static,
        formatter: impl Formatter<E::Output> + 'static,
    ) -> Self {
        Self { engine, reader: Box::new(reader), formatter: Box::new(formatter) }
    }

    /// Run one text through reader, engine and formatter.
    ///
    /// Returns `Ok(None)` when the engine produced no parse.
    pub fn run(&mut self, text: &str, request_id: usize) -> Result<Option<String>, BackendError> {
        let input = self.reader.read(text)?;
        match self.engine.parse(&input)? {
            Some(result) => self.formatter.format(&result, request_id).map(Some),
            None => Ok(None),
        }
    }
}

impl<E: Engine> std::fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &std::any::type_name::<E>())
            .field("reader", &"<reader>")
            .field("formatter", &"<formatter>")
            .finish()
    }
}

/// Builds engine triples from an output-format identifier.
///
/// Implementations must tolerate concurrent `build` calls for different
/// tenants; the gateway guarantees at most one in-flight call per tenant.
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: Engine;

    /// Build an independent pipeline rendering `format` (already upper-cased).
    fn build(&self, format: &str) -> Result<Pipeline<Self::Engine>, BuildError>;
}
