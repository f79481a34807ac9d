use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::communication::{QueueItem, ResultHandle};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::model::{Loader, Model};
use super::queue::PendingQueue;
use super::worker::{run_worker, WorkerHandle};

/// Multiplexes any number of submitting threads onto one model running on a
/// dedicated worker thread.
///
/// Producers call [`submit`](Self::submit) or [`submit_many`](Self::submit_many)
/// and get a [`ResultHandle`] per input. The worker takes up to
/// `max_batch_size` items at a time from a FIFO queue, calls
/// [`Model::process_batch`] and resolves each handle with its positional result.
///
/// Every method takes `&self`, so a dispatcher can be shared behind an `Arc`.
/// `start` and `stop` are serialized against each other; `submit` only touches
/// the queue lock.
///
/// # Lifecycle
///
/// * `start` stops any previous worker (cancelling whatever is still queued),
///   spawns a new one and blocks until the loader has reported.
/// * `stop` cancels every pending item and joins the worker. It is idempotent.
/// * Dropping the dispatcher stops it.
///
/// # Example
///
/// ```
/// use bento::{BatchDispatcher, DispatchConfig, Model};
///
/// struct Square;
///
/// impl Model for Square {
///     type Input = u64;
///     type Output = u64;
///     type Backend = ();
///
///     fn process_batch(&mut self, inputs: Vec<u64>, _backend: &()) -> Vec<u64> {
///         inputs.into_iter().map(|x| x * x).collect()
///     }
/// }
///
/// let dispatcher = BatchDispatcher::<Square>::new();
/// dispatcher
///     .start(|| Ok::<_, std::io::Error>(Square), DispatchConfig::new(8))
///     .unwrap();
///
/// let handles = dispatcher.submit_many([1, 2, 3]);
/// let squares: Vec<u64> = handles.into_iter().map(|h| h.wait()).collect();
/// assert_eq!(squares, vec![1, 4, 9]);
///
/// dispatcher.stop();
/// ```
pub struct BatchDispatcher<M: Model> {
    /// Identifies this dispatcher in log output
    id: Uuid,

    /// Items waiting for the worker, shared with the worker thread
    queue: Arc<PendingQueue<M::Input, M::Output>>,

    /// The live worker, if any; also serializes `start` and `stop`
    worker: Mutex<Option<WorkerHandle>>,

    _model: PhantomData<fn() -> M>,
}

impl<M: Model> BatchDispatcher<M> {
    /// Creates a dispatcher with no worker. Items submitted now wait in the queue.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            queue: Arc::new(PendingQueue::new()),
            worker: Mutex::new(None),
            _model: PhantomData,
        }
    }

    /// Random id attached to every log line this dispatcher and its worker emit.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Starts a worker whose model needs no backend token.
    ///
    /// See [`start_with_backend`](Self::start_with_backend).
    pub fn start<L>(&self, loader: L, config: DispatchConfig) -> Result<(), DispatchError>
    where
        L: Loader<Model = M>,
        M::Backend: Default,
    {
        self.start_with_backend(loader, config, M::Backend::default())
    }

    /// Stops any running worker, then spawns a new one that loads its model with
    /// `loader` and passes `backend` to every batch.
    ///
    /// Blocks until the loader has run. On error no worker is left alive and
    /// [`config`](Self::config) returns `None`.
    pub fn start_with_backend<L>(
        &self,
        loader: L,
        config: DispatchConfig,
        backend: M::Backend,
    ) -> Result<(), DispatchError>
    where
        L: Loader<Model = M>,
    {
        let mut worker = self.lock_worker();
        self.stop_locked(&mut worker);

        if config.max_batch_size == 0 {
            warn!(dispatcher = %self.id, "max_batch_size of 0 clamped to 1");
        }
        let max_batch_size = config.effective_batch_size();
        let config = DispatchConfig { max_batch_size, ..config };

        let (status_tx, status_rx) = oneshot::channel();
        let mut handle = WorkerHandle::spawn(config, {
            let id = self.id;
            let queue = self.queue.clone();
            move || run_worker(id, loader, backend, queue, max_batch_size, status_tx)
        })?;

        // A dropped sender means the loader unwound before reporting.
        let status = futures::executor::block_on(status_rx)
            .unwrap_or(Err(DispatchError::LoaderPanicked));

        match status {
            Ok(()) => {
                info!(dispatcher = %self.id, max_batch_size, "dispatcher started");
                *worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                warn!(dispatcher = %self.id, error = %err, "dispatcher failed to start");
                handle.join();
                Err(err)
            }
        }
    }

    /// Enqueues one input and returns the handle its outcome will arrive on.
    pub fn submit(&self, input: M::Input) -> ResultHandle<M::Output> {
        let (tx, rx) = oneshot::channel();
        self.queue.push(QueueItem::new(input, tx));
        ResultHandle::new(rx)
    }

    /// Enqueues all inputs as one contiguous run and returns their handles in
    /// input order.
    ///
    /// No other submitter's items can land between them, although the worker may
    /// still split the run across batches.
    pub fn submit_many<T>(&self, inputs: T) -> Vec<ResultHandle<M::Output>>
    where
        T: IntoIterator<Item = M::Input>,
    {
        let (items, handles): (Vec<_>, Vec<_>) = inputs
            .into_iter()
            .map(|input| {
                let (tx, rx) = oneshot::channel();
                (QueueItem::new(input, tx), ResultHandle::new(rx))
            })
            .unzip();

        self.queue.push_many(items);
        handles
    }

    /// Cancels every pending item and joins the worker.
    ///
    /// Safe to call repeatedly or on a dispatcher that never started. Once this
    /// returns the model has been dropped and no further batches will run.
    ///
    /// The one exception is a call made on the worker thread itself, for example
    /// when the model drops the last `Arc` to its own dispatcher. The worker
    /// cannot join itself, so it is detached: the current batch still delivers
    /// its results and the thread exits right after, dropping the model there.
    pub fn stop(&self) {
        let mut worker = self.lock_worker();
        self.stop_locked(&mut worker);
    }

    /// Whether a worker is currently serving batches.
    pub fn is_running(&self) -> bool {
        self.queue.is_running()
    }

    /// Number of items submitted but not yet taken by the worker.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Configuration of the live worker, with the batch size already clamped.
    ///
    /// `None` whenever [`is_running`](Self::is_running) is false, including after
    /// the model panicked and took the worker down.
    pub fn config(&self) -> Option<DispatchConfig> {
        let worker = self.lock_worker();
        if !self.queue.is_running() {
            return None;
        }
        worker.as_ref().map(|worker| worker.config().clone())
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<WorkerHandle>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_locked(&self, worker: &mut Option<WorkerHandle>) {
        let mut drained = self.queue.stop_and_drain();

        if let Some(mut handle) = worker.take() {
            handle.join();
            // Items submitted while the last batch was finishing.
            drained += self.queue.stop_and_drain();
            info!(dispatcher = %self.id, drained, "dispatcher stopped");
        } else if drained > 0 {
            debug!(dispatcher = %self.id, drained, "cancelled items queued without a worker");
        }
    }
}

impl<M: Model> Default for BatchDispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Drop for BatchDispatcher<M> {
    fn drop(&mut self) {
        self.stop();
    }
}
