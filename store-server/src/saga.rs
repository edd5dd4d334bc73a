//! Saga - explicit compensation for cross-store sequences
//!
//! There is no transaction spanning the cache and the column store, so
//! every multi-store sequence is "mutate A, then mutate B; on B's failure,
//! best-effort undo A". Instead of hand-rolling the rollback at each call
//! site, callers register a named compensation after each successful step;
//! on failure [`Saga::compensate`] runs them newest-first, and on success
//! [`Saga::commit`] discards them.
//!
//! Compensations are infallible futures: they log their own failures
//! rather than propagate them, because a half-failed rollback must still
//! attempt the remaining steps.

use futures::future::BoxFuture;
use std::future::Future;

pub struct Saga {
    label: &'static str,
    compensations: Vec<(&'static str, BoxFuture<'static, ()>)>,
}

impl Saga {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            compensations: Vec::new(),
        }
    }

    /// Register the undo for a step that just succeeded
    pub fn record<F>(&mut self, step: &'static str, compensation: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.compensations.push((step, Box::pin(compensation)));
    }

    pub fn len(&self) -> usize {
        self.compensations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compensations.is_empty()
    }

    /// Undo every recorded step in reverse order
    pub async fn compensate(mut self) {
        if self.compensations.is_empty() {
            return;
        }
        tracing::warn!(
            saga = self.label,
            steps = self.compensations.len(),
            "Running compensations"
        );
        while let Some((step, compensation)) = self.compensations.pop() {
            tracing::debug!(saga = self.label, step, "Compensating step");
            compensation.await;
        }
    }

    /// The sequence completed; drop all recorded compensations
    pub fn commit(mut self) {
        self.compensations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    fn tracker() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> BoxFuture<'static, ()>) {
        let log: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let capture = {
            let log = log.clone();
            move |id: u32| -> BoxFuture<'static, ()> {
                let log = log.clone();
                Box::pin(async move {
                    log.lock().unwrap().push(id);
                })
            }
        };
        (log, capture)
    }

    #[tokio::test]
    async fn compensations_run_in_reverse_order() {
        let (log, capture) = tracker();
        let mut saga = Saga::new("test");
        saga.record("one", capture(1));
        saga.record("two", capture(2));
        saga.record("three", capture(3));
        assert_eq!(saga.len(), 3);

        saga.compensate().await;
        assert_eq!(*log.lock().unwrap(), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn commit_discards_compensations() {
        let (log, capture) = tracker();
        let mut saga = Saga::new("test");
        saga.record("one", capture(1));
        saga.commit();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_saga_compensates_quietly() {
        let saga = Saga::new("noop");
        assert!(saga.is_empty());
        saga.compensate().await;
    }
}
