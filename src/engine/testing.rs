//! Test doubles shared by the engine tests.
//!
//! `EchoEngine` brackets its whitespace-split input and records how many
//! callers are inside `parse` at once; `MockFactory` counts builds and can be
//! told to stall, so the gateway's concurrency guarantees can be observed.

use super::backend::{Engine, EngineFactory, Formatter, Pipeline, Reader};
use crate::error::{BackendError, BuildError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Counts concurrent entries into a critical section.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
}

impl Probe {
    pub(crate) fn enter(&self) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        now
    }

    pub(crate) fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub(crate) struct EchoEngine {
    probe: Arc<Probe>,
    delay: Duration,
}

impl Engine for EchoEngine {
    type Input = Vec<String>;
    type Output = Vec<String>;

    fn parse(&mut self, input: &Vec<String>) -> Result<Option<Vec<String>>, BackendError> {
        self.probe.enter();
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.probe.leave();

        match input.first().map(String::as_str) {
            None => Ok(None),
            Some("FAIL") => Err(BackendError::Parse("asked to fail".into())),
            Some("PANIC") => panic!("asked to panic"),
            Some(_) => Ok(Some(input.clone())),
        }
    }
}

pub(crate) struct EchoReader;

impl Reader<Vec<String>> for EchoReader {
    fn read(&self, text: &str) -> Result<Vec<String>, BackendError> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }
}

pub(crate) struct EchoFormatter;

impl Formatter<Vec<String>> for EchoFormatter {
    fn format(&self, result: &Vec<String>, _request_id: usize) -> Result<String, BackendError> {
        Ok(format!("[{}]", result.join(" ")))
    }
}

/// Factory that counts builds and can stall inside `build`.
#[derive(Debug, Default)]
pub(crate) struct MockFactory {
    pub(crate) builds: Probe,
    pub(crate) parses: Arc<Probe>,
    build_delay: Duration,
    parse_delay: Duration,
    /// When non-zero, each build waits (up to `RENDEZVOUS_TIMEOUT`) until this
    /// many builds have arrived since the rendezvous was armed.
    rendezvous: AtomicUsize,
    /// Never decremented, so early leavers can't strand late arrivals.
    arrivals: AtomicUsize,
}

pub(crate) const RENDEZVOUS_TIMEOUT: Duration = Duration::from_secs(2);

impl MockFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = delay;
        self
    }

    pub(crate) fn with_parse_delay(mut self, delay: Duration) -> Self {
        self.parse_delay = delay;
        self
    }

    pub(crate) fn arm_rendezvous(&self, parties: usize) {
        self.arrivals.store(0, Ordering::SeqCst);
        self.rendezvous.store(parties, Ordering::SeqCst);
    }
}

impl EngineFactory for MockFactory {
    type Engine = EchoEngine;

    fn build(&self, format: &str) -> Result<Pipeline<EchoEngine>, BuildError> {
        self.builds.enter();
        let parties = self.rendezvous.load(Ordering::SeqCst);
        if parties > 0 {
            self.arrivals.fetch_add(1, Ordering::SeqCst);
            let deadline = Instant::now() + RENDEZVOUS_TIMEOUT;
            while self.arrivals.load(Ordering::SeqCst) < parties && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(2));
            }
        } else if !self.build_delay.is_zero() {
            thread::sleep(self.build_delay);
        }
        self.builds.leave();

        match format {
            "BOGUS" => Err(BuildError::unsupported_format(format, "unknown output format")),
            "MISSING" => Err(BuildError::model_load("/no/such/model", "model directory does not exist")),
            _ => {
                let engine = EchoEngine { probe: Arc::clone(&self.parses), delay: self.parse_delay };
                Ok(Pipeline::new(engine, EchoReader, EchoFormatter))
            }
        }
    }
}
