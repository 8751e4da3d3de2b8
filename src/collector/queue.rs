//! Task and result channels for the collection pool
//!
//! Two channels connect the pieces of a run:
//!
//! - The **task queue** is unbounded and preloaded before any worker starts:
//!   every work unit first, then one [`Task::Shutdown`] marker per worker.
//!   A worker that dequeues `Shutdown` re-enqueues it before exiting, so the
//!   queue drains to "all done" with plain FIFO semantics no matter how
//!   unevenly the units complete.
//!
//! - The **result channel** is bounded. Workers block when it fills, so a
//!   slow sink applies backpressure instead of letting pages pile up in
//!   memory. Completion is signalled in-band: each worker sends exactly one
//!   [`ResultItem::WorkerDone`] after its last page.

use crate::error::WorkerError;
use crate::remote::Record;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

/// One independently collectible slice of the resource space: a key prefix,
/// a metric name or a stream name. Immutable once enqueued.
pub type WorkUnit = String;

/// Default capacity of the result channel (pending pages).
pub const DEFAULT_RESULT_CAPACITY: usize = 10_000;

/// One entry on the task queue.
#[derive(Debug, Clone)]
pub enum Task {
    /// Collect this work unit to pagination exhaustion
    Collect(WorkUnit),

    /// No more work; re-enqueue and exit
    Shutdown,
}

/// One entry on the result channel.
#[derive(Debug)]
pub enum ResultItem {
    /// A page of raw records from one paginated call
    Page(Vec<Record>),

    /// One worker has exhausted its assigned work
    WorkerDone,
}

/// Preloaded FIFO queue of work units shared by all workers.
pub struct TaskQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl TaskQueue {
    /// Build a queue holding every unit followed by `worker_count` shutdown
    /// markers.
    pub fn preloaded(units: impl IntoIterator<Item = WorkUnit>, worker_count: usize) -> Self {
        let (sender, receiver) = unbounded();

        // The receiver lives in `self`, so these sends cannot fail.
        for unit in units {
            let _ = sender.send(Task::Collect(unit));
        }
        for _ in 0..worker_count {
            let _ = sender.send(Task::Shutdown);
        }

        Self { sender, receiver }
    }

    /// Get a sender handle (one per worker, for sentinel re-enqueue).
    pub fn sender(&self) -> TaskSender {
        TaskSender {
            sender: self.sender.clone(),
        }
    }

    /// Get a receiver handle (one per worker).
    pub fn receiver(&self) -> TaskReceiver {
        TaskReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Current queue length, including shutdown markers.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Handle for putting tasks back on the queue.
#[derive(Clone)]
pub struct TaskSender {
    sender: Sender<Task>,
}

impl TaskSender {
    /// Put the shutdown marker back so sibling workers observe it too.
    /// A disconnected queue means every worker already exited; ignore it.
    pub fn requeue_shutdown(&self) {
        let _ = self.sender.send(Task::Shutdown);
    }
}

/// Handle for taking tasks off the queue.
#[derive(Clone)]
pub struct TaskReceiver {
    receiver: Receiver<Task>,
}

impl TaskReceiver {
    /// Blocking receive; `None` when the queue has disconnected.
    pub fn recv(&self) -> Option<Task> {
        self.receiver.recv().ok()
    }
}

/// Bounded channel carrying pages and completion signals to the sink.
pub struct ResultChannel {
    sender: Sender<ResultItem>,
    receiver: Receiver<ResultItem>,
    capacity: usize,
}

impl ResultChannel {
    /// Create a channel holding at most `capacity` pending items.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Get a sender handle (clone one per worker).
    pub fn sender(&self) -> ResultSender {
        ResultSender {
            sender: self.sender.clone(),
        }
    }

    /// Convert into the receiving half, dropping this side's sender so the
    /// channel disconnects once every worker is gone.
    pub fn into_receiver(self) -> ResultReceiver {
        ResultReceiver {
            receiver: self.receiver,
            capacity: self.capacity,
        }
    }

    /// Current number of pending items.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the channel is empty.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Producer handle for the result channel.
#[derive(Clone)]
pub struct ResultSender {
    sender: Sender<ResultItem>,
}

impl ResultSender {
    /// Forward one page, blocking while the channel is full.
    pub fn send_page(&self, page: Vec<Record>) -> Result<(), WorkerError> {
        self.sender
            .send(ResultItem::Page(page))
            .map_err(|_| WorkerError::ResultChannelClosed)
    }

    /// Emit this worker's completion signal.
    pub fn send_done(&self) -> Result<(), WorkerError> {
        self.sender
            .send(ResultItem::WorkerDone)
            .map_err(|_| WorkerError::ResultChannelClosed)
    }
}

/// Consumer handle for the result channel.
pub struct ResultReceiver {
    receiver: Receiver<ResultItem>,
    capacity: usize,
}

impl ResultReceiver {
    /// Blocking receive; `None` when every sender is gone.
    pub fn recv(&self) -> Option<ResultItem> {
        self.receiver.recv().ok()
    }

    /// Current number of pending items.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_preload_order() {
        let queue = TaskQueue::preloaded(vec!["a/".to_string(), "b/".to_string()], 2);
        assert_eq!(queue.len(), 4);

        let rx = queue.receiver();
        assert!(matches!(rx.recv(), Some(Task::Collect(u)) if u == "a/"));
        assert!(matches!(rx.recv(), Some(Task::Collect(u)) if u == "b/"));
        assert!(matches!(rx.recv(), Some(Task::Shutdown)));
        assert!(matches!(rx.recv(), Some(Task::Shutdown)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_shutdown_requeue() {
        let queue = TaskQueue::preloaded(Vec::new(), 1);
        let rx = queue.receiver();
        let tx = queue.sender();

        assert!(matches!(rx.recv(), Some(Task::Shutdown)));
        assert!(queue.is_empty());

        // Re-enqueued marker is visible to the next consumer.
        tx.requeue_shutdown();
        assert!(matches!(rx.recv(), Some(Task::Shutdown)));
    }

    #[test]
    fn test_result_channel_backpressure() {
        let channel = ResultChannel::with_capacity(2);
        let sender = channel.sender();

        sender.send_page(Vec::new()).unwrap();
        sender.send_page(Vec::new()).unwrap();
        assert_eq!(channel.len(), 2);

        // A third send blocks until the sink drains one item.
        let unblocked = Arc::new(AtomicBool::new(false));
        let unblocked_clone = Arc::clone(&unblocked);
        let blocked_sender = channel.sender();
        let producer = thread::spawn(move || {
            blocked_sender.send_page(Vec::new()).unwrap();
            unblocked_clone.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!unblocked.load(Ordering::SeqCst));
        assert_eq!(channel.len(), channel.capacity());

        let receiver = channel.receiver.clone();
        receiver.recv().unwrap();
        producer.join().unwrap();
        assert!(unblocked.load(Ordering::SeqCst));
    }

    #[test]
    fn test_receiver_disconnect_when_senders_dropped() {
        let channel = ResultChannel::with_capacity(4);
        let sender = channel.sender();
        let receiver = channel.into_receiver();

        sender.send_done().unwrap();
        drop(sender);

        assert!(matches!(receiver.recv(), Some(ResultItem::WorkerDone)));
        assert!(receiver.recv().is_none());
    }
}
