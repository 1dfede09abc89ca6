//! The background work queue (spec §4.9): a single in-process FIFO of
//! zero-argument tasks processed by one worker, used for asynchronous
//! (`wait_for_parent=false`) upward propagation. Grounded in
//! `original_source/ex03/client/src/background_tasks.py`'s
//! single-worker-thread-plus-`Queue` shape, reimplemented with a
//! `tokio::task` consuming an `mpsc::UnboundedReceiver` instead of a raw
//! OS thread and a blocking `Queue`.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A handle for enqueuing tasks. Cloning shares the same underlying
/// queue and worker.
#[derive(Clone)]
pub struct BackgroundQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl BackgroundQueue {
    /// Spawns the single worker and returns a handle plus its join handle
    /// (used at shutdown to drain the queue — spec §4.9, "The queue is
    /// drained at process shutdown by a termination flag").
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let worker = tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                task.await;
            }
            debug!("background queue drained, worker exiting");
        });
        (Self { tx }, worker)
    }

    /// Enqueues a task. Ordering of tasks enqueued by the same caller is
    /// preserved end-to-end (spec §4.9 invariant) because the channel is
    /// FIFO and there is exactly one consumer.
    pub fn enqueue<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // The channel only closes once every sender (including this one)
        // is dropped, so a failed send here would mean the worker itself
        // is gone — nothing to log to but nowhere for the task to run.
        let _ = self.tx.send(Box::pin(task));
    }
}
