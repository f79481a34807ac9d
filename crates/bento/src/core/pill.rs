use std::thread;
use tracing::error;
use super::queue::PendingQueue;

/// # Pill
///
/// Keeps a worker panic from stranding submitters.
///
/// The worker thread holds a `Pill` for as long as it serves batches. If the
/// model panics, the pill is dropped during unwinding: it clears the queue's run
/// flag and resolves everything still pending as cancelled. Items that were
/// already inside the panicking batch lose their sinks to the unwind and resolve
/// as [`Outcome::Abandoned`](crate::Outcome::Abandoned).
///
/// Dropping a pill on a normal exit does nothing.
/// A queue already handed to a newer worker is left alone.
pub(crate) struct Pill<'a, I, O> {
    queue: &'a PendingQueue<I, O>,
    epoch: u64,
}

impl<'a, I, O> Pill<'a, I, O> {
    pub fn new(queue: &'a PendingQueue<I, O>, epoch: u64) -> Self {
        Self { queue, epoch }
    }
}

impl<I, O> Drop for Pill<'_, I, O> {
    fn drop(&mut self) {
        if thread::panicking() {
            if let Some(drained) = self.queue.stop_epoch(self.epoch) {
                error!(drained, "worker panicked; pending items cancelled");
            }
        }
    }
}
