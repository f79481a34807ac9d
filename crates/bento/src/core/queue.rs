//! The pending-work queue shared between producers and the worker.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use crate::communication::{Outcome, QueueItem};

struct QueueState<I, O> {
    /// Submitted items, oldest first
    items: VecDeque<QueueItem<I, O>>,

    /// Whether a worker is accepting batches
    running: bool,

    /// Bumped by every `mark_running`; a worker only serves its own epoch
    epoch: u64,
}

/// FIFO of submitted items plus the worker's run flag, guarded by one mutex.
///
/// Keeping `running` under the same lock as the items means the worker can never
/// miss a stop signal between checking the flag and parking on the condvar.
pub(crate) struct PendingQueue<I, O> {
    state: Mutex<QueueState<I, O>>,
    available: Condvar,
}

impl<I, O> PendingQueue<I, O> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                running: false,
                epoch: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// No user code runs under this lock, so a poisoned guard still holds a
    /// consistent queue.
    fn lock(&self) -> MutexGuard<'_, QueueState<I, O>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: QueueItem<I, O>) {
        self.lock().items.push_back(item);
        self.available.notify_one();
    }

    /// Appends every item as one contiguous run under a single lock acquisition.
    pub fn push_many(&self, items: impl IntoIterator<Item = QueueItem<I, O>>) {
        {
            let mut state = self.lock();
            state.items.extend(items);
        }
        self.available.notify_one();
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Opens a new epoch for a freshly started worker and returns it.
    pub fn mark_running(&self) -> u64 {
        let mut state = self.lock();
        state.running = true;
        state.epoch += 1;
        state.epoch
    }

    fn serves(state: &QueueState<I, O>, epoch: u64) -> bool {
        state.running && state.epoch == epoch
    }

    /// Blocks until items are available or the queue is stopped.
    ///
    /// Returns up to `max_items` items from the head in arrival order, or `None`
    /// once `running` has been cleared or a newer worker has taken over. Items
    /// still queued at that point belong to whoever stopped the queue.
    pub fn wait_for_batch(&self, epoch: u64, max_items: usize) -> Option<Vec<QueueItem<I, O>>> {
        let state = self.lock();
        let mut state = self
            .available
            .wait_while(state, |state| Self::serves(state, epoch) && state.items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        if !Self::serves(&state, epoch) {
            return None;
        }

        let take = max_items.max(1).min(state.items.len());
        Some(state.items.drain(..take).collect())
    }

    /// Clears `running`, wakes the worker and resolves every pending item as
    /// cancelled. Returns how many items were drained.
    pub fn stop_and_drain(&self) -> usize {
        let drained: Vec<_> = {
            let mut state = self.lock();
            state.running = false;
            state.items.drain(..).collect()
        };
        self.cancel(drained)
    }

    /// Like [`stop_and_drain`](Self::stop_and_drain), but only while `epoch` is
    /// still the current one. Returns `None` if a newer worker owns the queue.
    pub fn stop_epoch(&self, epoch: u64) -> Option<usize> {
        let drained: Vec<_> = {
            let mut state = self.lock();
            if state.epoch != epoch {
                return None;
            }
            state.running = false;
            state.items.drain(..).collect()
        };
        Some(self.cancel(drained))
    }

    fn cancel(&self, drained: Vec<QueueItem<I, O>>) -> usize {
        self.available.notify_all();

        let count = drained.len();
        for item in drained {
            item.resolve(Outcome::Cancelled);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn item(value: u32) -> (QueueItem<u32, u32>, oneshot::Receiver<Outcome<u32>>) {
        let (tx, rx) = oneshot::channel();
        (QueueItem::new(value, tx), rx)
    }

    #[test]
    fn test_wait_for_batch_respects_bound_and_order() {
        let queue = PendingQueue::new();
        let epoch = queue.mark_running();
        for value in 0..5 {
            queue.push(item(value).0);
        }

        let first: Vec<u32> = queue.wait_for_batch(epoch, 3).unwrap().iter().map(|i| *i.input()).collect();
        let second: Vec<u32> = queue.wait_for_batch(epoch, 3).unwrap().iter().map(|i| *i.input()).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(second, vec![3, 4]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_zero_max_items_still_takes_one() {
        let queue = PendingQueue::new();
        let epoch = queue.mark_running();
        queue.push(item(9).0);
        assert_eq!(queue.wait_for_batch(epoch, 0).unwrap().len(), 1);
    }

    #[test]
    fn test_wait_returns_none_when_not_running() {
        let queue = PendingQueue::<u32, u32>::new();
        queue.push(item(1).0);
        assert!(queue.wait_for_batch(0, 4).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_stop_wakes_blocked_waiter() {
        let queue = Arc::new(PendingQueue::<u32, u32>::new());
        let epoch = queue.mark_running();

        let waiter = {
            let queue = queue.clone();
            thread::spawn(move || queue.wait_for_batch(epoch, 4).is_none())
        };
        thread::sleep(Duration::from_millis(50));
        queue.stop_and_drain();

        assert!(waiter.join().unwrap(), "waiter should observe the stop");
        assert!(!queue.is_running());
    }

    #[test]
    fn test_push_wakes_blocked_waiter() {
        let queue = Arc::new(PendingQueue::<u32, u32>::new());
        let epoch = queue.mark_running();

        let waiter = {
            let queue = queue.clone();
            thread::spawn(move || queue.wait_for_batch(epoch, 4).map(|batch| batch.len()))
        };
        thread::sleep(Duration::from_millis(50));
        queue.push_many(vec![item(1).0, item(2).0]);

        assert_eq!(waiter.join().unwrap(), Some(2));
    }

    #[test]
    fn test_stop_and_drain_cancels_pending() {
        let queue = PendingQueue::new();
        queue.mark_running();
        let (first, mut rx1) = item(1);
        let (second, mut rx2) = item(2);
        queue.push(first);
        queue.push(second);

        assert_eq!(queue.stop_and_drain(), 2);
        assert_eq!(rx1.try_recv().unwrap(), Outcome::Cancelled);
        assert_eq!(rx2.try_recv().unwrap(), Outcome::Cancelled);
        assert_eq!(queue.stop_and_drain(), 0);
    }

    #[test]
    fn test_stale_epoch_stops_serving() {
        let queue = PendingQueue::new();
        let old = queue.mark_running();
        queue.stop_and_drain();
        let current = queue.mark_running();
        queue.push(item(5).0);

        assert!(queue.wait_for_batch(old, 4).is_none(), "an older worker must not take items");
        assert_eq!(queue.stop_epoch(old), None);
        assert!(queue.is_running());
        assert_eq!(queue.wait_for_batch(current, 4).unwrap().len(), 1);
    }

    #[test]
    fn test_stop_epoch_cancels_current() {
        let queue = PendingQueue::new();
        let epoch = queue.mark_running();
        let (pending, mut rx) = item(1);
        queue.push(pending);

        assert_eq!(queue.stop_epoch(epoch), Some(1));
        assert!(!queue.is_running());
        assert_eq!(rx.try_recv().unwrap(), Outcome::Cancelled);
    }
}
