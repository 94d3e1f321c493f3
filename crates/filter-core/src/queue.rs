//! The draw queue: the only way another thread may touch GPU state.
//!
//! Any thread holding a [`QueueHandle`] can enqueue a task. The rendering
//! thread drains the [`DrawQueue`] at the top of every frame, in enqueue
//! order, against its render state. Everything enqueued before a frame starts
//! has completed by the time that frame draws, and follow-up work those tasks
//! enqueue joins the same drain for a bounded number of passes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::trace;

/// A unit of work executed on the rendering thread.
pub type DrawTask<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// Passes over the queue per drain. Each pass runs only the tasks queued
/// when it starts, so a task that keeps re-enqueueing itself cannot hold
/// the frame back.
pub const MAX_DRAIN_PASSES: usize = 4;

/// Receiving side, owned by the rendering thread.
pub struct DrawQueue<T> {
    sender: Sender<DrawTask<T>>,
    receiver: Receiver<DrawTask<T>>,
    queued: Arc<AtomicUsize>,
}

/// Sending side; cheap to clone and `Send`.
pub struct QueueHandle<T> {
    sender: Sender<DrawTask<T>>,
    queued: Arc<AtomicUsize>,
}

impl<T> Clone for QueueHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            queued: self.queued.clone(),
        }
    }
}

impl<T> std::fmt::Debug for QueueHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandle").finish()
    }
}

impl<T> DrawQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn handle(&self) -> QueueHandle<T> {
        QueueHandle {
            sender: self.sender.clone(),
            queued: self.queued.clone(),
        }
    }

    /// Tasks enqueued and not yet run.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every task queued at entry, then up to [`MAX_DRAIN_PASSES`] - 1
    /// further passes over what those tasks (or other threads) enqueued
    /// meanwhile. Returns the number of tasks run.
    pub fn run_pending(&self, target: &mut T) -> usize {
        let mut ran = 0;
        for _ in 0..MAX_DRAIN_PASSES {
            let batch = self.queued.load(Ordering::SeqCst);
            if batch == 0 {
                break;
            }
            for _ in 0..batch {
                // An enqueue counts its task before sending it, so the count
                // can run ahead of the channel by a task still in flight.
                let Ok(task) = self.receiver.try_recv() else {
                    break;
                };
                self.queued.fetch_sub(1, Ordering::SeqCst);
                task(target);
                ran += 1;
            }
        }
        let left = self.len();
        if left > 0 {
            trace!(tasks = ran, left, "draw queue drain bounded, rest runs next frame");
        } else if ran > 0 {
            trace!(tasks = ran, "draw queue drained");
        }
        ran
    }
}

impl<T> Default for DrawQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueueHandle<T> {
    /// Fire-and-forget. Returns `false` if the rendering thread has dropped
    /// its queue; the task is discarded in that case.
    pub fn enqueue(&self, task: impl FnOnce(&mut T) + Send + 'static) -> bool {
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(Box::new(task)).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn tasks_run_in_enqueue_order() {
        let queue = DrawQueue::<Vec<u32>>::new();
        let handle = queue.handle();
        for i in 0..5 {
            handle.enqueue(move |log| log.push(i));
        }

        let mut log = Vec::new();
        assert_eq!(queue.run_pending(&mut log), 5);
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.run_pending(&mut log), 0);
    }

    #[test]
    fn tasks_enqueued_while_draining_join_the_same_drain() {
        let queue = DrawQueue::<Vec<&'static str>>::new();
        let handle = queue.handle();
        let inner = handle.clone();
        handle.enqueue(move |log| {
            log.push("outer");
            inner.enqueue(|log| log.push("nested"));
        });
        handle.enqueue(|log| log.push("second"));

        let mut log = Vec::new();
        queue.run_pending(&mut log);
        assert_eq!(log, vec!["outer", "second", "nested"]);
    }

    fn respawn(handle: QueueHandle<u32>) {
        let next = handle.clone();
        handle.enqueue(move |runs| {
            *runs += 1;
            respawn(next);
        });
    }

    #[test]
    fn self_requeueing_task_does_not_stall_the_drain() {
        let queue = DrawQueue::<u32>::new();
        respawn(queue.handle());

        let mut runs = 0;
        assert_eq!(queue.run_pending(&mut runs), MAX_DRAIN_PASSES);
        assert_eq!(runs, MAX_DRAIN_PASSES as u32);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.run_pending(&mut runs), MAX_DRAIN_PASSES);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn other_threads_enqueue_without_blocking() {
        let queue = DrawQueue::<Vec<u32>>::new();
        let handle = queue.handle();
        thread::spawn(move || {
            handle.enqueue(|log| log.push(1));
            handle.enqueue(|log| log.push(2));
        })
        .join()
        .unwrap();

        let mut log = Vec::new();
        queue.run_pending(&mut log);
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn enqueue_reports_a_dropped_queue() {
        let queue = DrawQueue::<()>::new();
        let handle = queue.handle();
        drop(queue);
        assert!(!handle.enqueue(|_| {}));
        assert_eq!(handle.queued.load(Ordering::SeqCst), 0);
    }
}
