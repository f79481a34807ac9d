//! The dedicated worker thread and the handle used to join it.

use std::any::Any;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, error, info, info_span};
use uuid::Uuid;
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::model::{Loader, Model};
use super::batch::batching_loop;
use super::pill::Pill;
use super::queue::PendingQueue;

type Queue<M> = PendingQueue<<M as Model>::Input, <M as Model>::Output>;

/// Reports whether the loader produced a model.
pub(crate) type StartStatus = oneshot::Sender<Result<(), DispatchError>>;

/// A handle for the worker thread of one successful `start`.
///
/// Dropping the handle joins the thread, so it must only be dropped after the
/// queue has been stopped.
pub(crate) struct WorkerHandle {
    /// Handle to the spawned thread, becomes `None` once joined
    handle: Option<JoinHandle<()>>,

    /// Configuration the worker was started with
    config: DispatchConfig,
}

impl WorkerHandle {
    /// Spawns a named thread running `task`.
    pub fn spawn<F>(config: DispatchConfig, task: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(task)?;

        Ok(Self {
            handle: Some(handle),
            config,
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Blocks until the thread has exited. A panic on the thread is logged, not
    /// propagated.
    ///
    /// Called from the worker thread itself (the model dropped the last handle
    /// to its dispatcher) the thread is detached instead; it exits on its own
    /// once the current batch is delivered, since the queue is already stopped.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                debug!(thread = %self.config.thread_name, "stopped from the worker thread; detaching");
                return;
            }
            if let Err(payload) = handle.join() {
                error!(
                    thread = %self.config.thread_name,
                    panic = panic_message(payload.as_ref()),
                    "worker thread panicked"
                );
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.join();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Body of the worker thread.
///
/// Loads the model, reports the outcome through `status`, then serves batches
/// until the queue is stopped. The model is created and dropped on this thread.
pub(crate) fn run_worker<L: Loader>(
    dispatcher: Uuid,
    loader: L,
    backend: <L::Model as Model>::Backend,
    queue: Arc<Queue<L::Model>>,
    max_batch_size: usize,
    status: StartStatus,
) {
    let _span = info_span!("worker", %dispatcher).entered();

    let mut model = match loader.load() {
        Ok(model) => model,
        Err(err) => {
            let _ = status.send(Err(DispatchError::load_failed(err)));
            return;
        }
    };

    let epoch = queue.mark_running();
    let pill = Pill::new(&queue, epoch);
    let _ = status.send(Ok(()));
    info!(max_batch_size, epoch, "worker started");

    batching_loop(&mut model, &backend, &queue, epoch, max_batch_size);

    drop(pill);
    drop(model);
    info!("worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn test_spawn_names_thread() {
        let config = DispatchConfig::new(1).with_thread_name("named-worker");
        let (tx, rx) = std::sync::mpsc::channel();
        let mut worker = WorkerHandle::spawn(config, move || {
            tx.send(thread::current().name().map(str::to_string)).unwrap();
        })
        .unwrap();

        worker.join();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("named-worker"));
    }

    #[test]
    fn test_drop_joins_thread() {
        let finished = Arc::new(AtomicBool::new(false));
        {
            let finished = finished.clone();
            let _worker = WorkerHandle::spawn(DispatchConfig::default(), move || {
                thread::sleep(Duration::from_millis(50));
                finished.store(true, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_join_swallows_panic() {
        let mut worker = WorkerHandle::spawn(DispatchConfig::default(), || {
            panic!("boom");
        })
        .unwrap();

        worker.join();
        // This should not panic even though the handle is now None
        worker.join();
    }

    #[test]
    fn test_join_from_own_thread_detaches() {
        let (tx, rx) = std::sync::mpsc::channel::<WorkerHandle>();
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let worker = WorkerHandle::spawn(DispatchConfig::default(), move || {
            let mut own = rx.recv().unwrap();
            own.join();
            drop(own);
            done_tx.send(()).unwrap();
        })
        .unwrap();

        tx.send(worker).unwrap();
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("joining its own handle should neither block nor panic");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
