//! Thread-safe FIFO of render jobs with shutdown sentinels.
//!
//! The queue is the only resource shared across workers. Producers call
//! [`JobQueue::enqueue`]; consumers call [`JobQueue::dequeue`] with a bounded
//! wait so they can re-check a cancellation flag between ticks. Completion
//! tracking (`mark_done` / `wait_drained`) covers real jobs only; sentinels
//! are control flow, not work.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};

use crate::job::RenderJob;

/// A queued value: either work or a shutdown signal.
#[derive(Debug)]
pub enum QueueItem {
    Job(RenderJob),
    Sentinel,
}

#[derive(Debug)]
pub struct JobQueue {
    items: Mutex<VecDeque<QueueItem>>,
    // One permit per queued item, so a timed acquire never misses a wakeup.
    ready: Semaphore,
    open_jobs: Mutex<usize>,
    drained: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Semaphore::new(0),
            open_jobs: Mutex::new(0),
            drained: Notify::new(),
        }
    }

    /// Never blocks the caller beyond lock contention.
    pub fn enqueue(&self, item: QueueItem) {
        if matches!(item, QueueItem::Job(_)) {
            *self.open_jobs.lock().expect("job queue lock poisoned") += 1;
        }
        self.items
            .lock()
            .expect("job queue lock poisoned")
            .push_back(item);
        self.ready.add_permits(1);
    }

    /// Blocks up to `timeout`, then returns `None` so the caller can re-check
    /// its cancellation flag.
    pub async fn dequeue(&self, timeout: Duration) -> Option<QueueItem> {
        match tokio::time::timeout(timeout, self.ready.acquire()).await {
            Err(_elapsed) => None,
            Ok(Err(_closed)) => None,
            Ok(Ok(permit)) => {
                permit.forget();
                self.items
                    .lock()
                    .expect("job queue lock poisoned")
                    .pop_front()
            }
        }
    }

    /// Non-blocking variant used when draining leftovers.
    pub fn try_dequeue(&self) -> Option<QueueItem> {
        match self.ready.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.items
                    .lock()
                    .expect("job queue lock poisoned")
                    .pop_front()
            }
            Err(_) => None,
        }
    }

    /// Records the completion of one dequeued job.
    pub fn mark_done(&self) {
        let mut open = self.open_jobs.lock().expect("job queue lock poisoned");
        *open = open.saturating_sub(1);
        if *open == 0 {
            self.drained.notify_waiters();
        }
    }

    /// Completes once every enqueued job (sentinels excluded) has been
    /// marked done.
    pub async fn wait_drained(&self) {
        let notified = self.drained.notified();
        tokio::pin!(notified);
        loop {
            // Register before checking, so a notify_waiters racing with the
            // check cannot be lost.
            notified.as_mut().enable();
            if self.is_drained() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.drained.notified());
        }
    }

    pub fn is_drained(&self) -> bool {
        *self.open_jobs.lock().expect("job queue lock poisoned") == 0
    }

    /// Jobs enqueued and not yet marked done.
    pub fn open_jobs(&self) -> usize {
        *self.open_jobs.lock().expect("job queue lock poisoned")
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
