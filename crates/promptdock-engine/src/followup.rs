//! Delayed corrective work keyed by element.
//!
//! Host frameworks sometimes re-render after a write and revert it. The
//! injector answers with writes and events scheduled a few tens of
//! milliseconds later. Those tasks are fire-and-forget, but a new command
//! for the same element cancels whatever is still pending for it so two
//! generations of corrections never race.

use promptdock_common::protocol::ElementRef;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Clone, Default)]
pub struct FollowUps {
    pending: Arc<Mutex<HashMap<ElementRef, Vec<JoinHandle<()>>>>>,
}

impl FollowUps {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ElementRef, Vec<JoinHandle<()>>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `task` after `delay`. Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, element: ElementRef, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut pending = self.lock();
        let handles = pending.entry(element).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Abort every unfinished task for `element`. Returns how many were
    /// still pending.
    pub fn cancel(&self, element: ElementRef) -> usize {
        let handles = self.lock().remove(&element).unwrap_or_default();
        let mut cancelled = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            debug!("Cancelled {} pending follow-ups for {}", cancelled, element);
        }
        cancelled
    }

    /// Unfinished tasks for `element`.
    pub fn pending(&self, element: ElementRef) -> usize {
        self.lock()
            .get(&element)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    pub fn cancel_all(&self) {
        let all: Vec<_> = self.lock().drain().flat_map(|(_, h)| h).collect();
        for handle in all {
            handle.abort();
        }
    }
}
