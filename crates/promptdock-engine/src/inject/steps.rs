//! Guarded steps and fallback chains.
//!
//! A step is one page primitive call. Its `Result` decides what happens
//! next: `Ok(true)` means it took effect, `Ok(false)` that the page declined
//! it, `Err` that it faulted. Faults are logged and recorded, never raised.

use futures::future::BoxFuture;
use promptdock_common::error::DomError;
use std::future::Future;
use tracing::debug;

/// What happened to the steps of one injection or clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepLog {
    /// Steps that took effect, in order.
    pub applied: Vec<&'static str>,
    /// Faulted or declined steps, with the reason.
    pub faults: Vec<(&'static str, String)>,
    /// Chains whose every step failed.
    pub exhausted: Vec<&'static str>,
}

impl StepLog {
    pub fn applied(&self, step: &str) -> bool {
        self.applied.contains(&step)
    }

    pub fn fault_count(&self) -> usize {
        self.faults.len()
    }

    /// Run a standalone step; a failure is recorded and swallowed.
    pub async fn guard<T, F>(&mut self, step: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, DomError>>,
    {
        match fut.await {
            Ok(value) => {
                self.applied.push(step);
                Some(value)
            }
            Err(e) => {
                debug!("Step '{}' failed: {}", step, e);
                self.faults.push((step, e.to_string()));
                None
            }
        }
    }
}

/// Outcome of a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    Applied(&'static str),
    Exhausted,
}

/// Ordered alternatives for one write; the first step that takes effect
/// ends the chain.
pub struct Fallback<'a> {
    label: &'static str,
    steps: Vec<(&'static str, BoxFuture<'a, Result<bool, DomError>>)>,
}

impl<'a> Fallback<'a> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            steps: Vec::new(),
        }
    }

    /// Add a step whose `Ok(false)` means "declined, try the next one".
    pub fn then<F>(mut self, step: &'static str, fut: F) -> Self
    where
        F: Future<Output = Result<bool, DomError>> + Send + 'a,
    {
        self.steps.push((step, Box::pin(fut)));
        self
    }

    /// Add a step that takes effect whenever it does not fault.
    pub fn then_unit<F>(self, step: &'static str, fut: F) -> Self
    where
        F: Future<Output = Result<(), DomError>> + Send + 'a,
    {
        self.then(step, async move { fut.await.map(|_| true) })
    }

    pub async fn run(self, log: &mut StepLog) -> ChainOutcome {
        for (step, fut) in self.steps {
            match fut.await {
                Ok(true) => {
                    log.applied.push(step);
                    return ChainOutcome::Applied(step);
                }
                Ok(false) => {
                    debug!("{}: step '{}' declined", self.label, step);
                    log.faults.push((step, "declined".to_string()));
                }
                Err(e) => {
                    debug!("{}: step '{}' failed: {}", self.label, step, e);
                    log.faults.push((step, e.to_string()));
                }
            }
        }
        debug!("{}: every fallback exhausted", self.label);
        log.exhausted.push(self.label);
        ChainOutcome::Exhausted
    }
}

/// Swallow the result of a follow-up step, logging failures.
pub fn quietly<T>(step: &str, result: Result<T, DomError>) {
    if let Err(e) = result {
        debug!("Follow-up step '{}' failed: {}", step, e);
    }
}
