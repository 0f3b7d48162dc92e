//! Per-mutation rename chains and the in-flight set.
//!
//! Every job submitted under the same key runs after the job submitted
//! before it. Chains are lazily driven: awaiting any [`Queued`] handle
//! drives the jobs queued ahead of it as well.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::oneshot;

type Tail = Shared<BoxFuture<'static, ()>>;

#[derive(Default)]
pub(super) struct QueueState {
    /// Latest job of each chain, tagged with the ticket it was issued.
    pub(super) tails: HashMap<String, (u64, Tail)>,
    /// Structural identities with queued renames, refcounted.
    pub(super) in_flight: HashMap<String, usize>,
    /// Mutations admitted by the gate that have not finished queueing.
    pub(super) admissions: usize,
    next_ticket: u64,
}

impl QueueState {
    fn release(&mut self, identity: &str) {
        if let Some(count) = self.in_flight.get_mut(identity) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(identity);
            }
        }
    }
}

impl fmt::Debug for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueState")
            .field("chains", &self.tails.len())
            .field("in_flight", &self.in_flight)
            .field("admissions", &self.admissions)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenameQueue {
    pub(super) state: Arc<Mutex<QueueState>>,
}

/// Handle to one submitted job.
pub struct Queued<T> {
    tail: Tail,
    result: oneshot::Receiver<T>,
}

impl<T> Queued<T> {
    /// Waits for the chain up to and including this job. `None` only if the
    /// job was dropped before producing a value.
    pub async fn settle(self) -> Option<T> {
        self.tail.await;
        self.result.await.ok()
    }
}

impl RenameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().expect("rename queue lock poisoned")
    }

    /// Appends `job` to the chain `key` and marks `identity` in flight until
    /// the job settles.
    pub fn submit<F, T>(&self, key: &str, identity: &str, job: F) -> Queued<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let mut state = self.lock();
        *state.in_flight.entry(identity.to_string()).or_insert(0) += 1;
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        let previous = state.tails.get(key).map(|(_, tail)| tail.clone());

        let shared = Arc::clone(&self.state);
        let chain = key.to_string();
        let identity = identity.to_string();
        let tail = async move {
            if let Some(previous) = previous {
                previous.await;
            }
            let _ = tx.send(job.await);
            let mut state = shared.lock().expect("rename queue lock poisoned");
            state.release(&identity);
            if state
                .tails
                .get(&chain)
                .is_some_and(|(current, _)| *current == ticket)
            {
                state.tails.remove(&chain);
            }
        }
        .boxed()
        .shared();

        state.tails.insert(key.to_string(), (ticket, tail.clone()));
        Queued { tail, result: rx }
    }

    pub fn is_in_flight(&self, identity: &str) -> bool {
        self.lock().in_flight.contains_key(identity)
    }

    /// True while any chain has unsettled jobs.
    pub fn has_pending(&self) -> bool {
        !self.lock().tails.is_empty()
    }

    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        state.tails.is_empty() && state.in_flight.is_empty() && state.admissions == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn jobs_on_one_key_run_in_submission_order() {
        let queue = RenameQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let order = Arc::clone(&order);
            queue.submit("Life admin", "Life admin", async move {
                tokio::task::yield_now().await;
                order.lock().unwrap().push("root");
            })
        };
        let second = {
            let order = Arc::clone(&order);
            queue.submit("Life admin", "Life admin/Me", async move {
                order.lock().unwrap().push("child");
                7
            })
        };

        assert!(queue.is_in_flight("Life admin/Me"));
        assert_eq!(second.settle().await, Some(7));
        assert_eq!(*order.lock().unwrap(), vec!["root", "child"]);
        assert_eq!(first.settle().await, Some(()));
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn in_flight_is_refcounted() {
        let queue = RenameQueue::new();
        let a = queue.submit("k", "Me", async {});
        let b = queue.submit("k", "Me", async {});
        a.settle().await;
        assert!(queue.is_in_flight("Me"));
        assert!(queue.has_pending());
        b.settle().await;
        assert!(!queue.is_in_flight("Me"));
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn unsettled_chain_keeps_queue_pending() {
        let queue = RenameQueue::new();
        let queued = queue.submit("k", "Me", async {});
        assert!(queue.has_pending());
        assert!(queue.is_in_flight("Me"));
        queued.settle().await;
        assert!(!queue.has_pending());
    }
}
