//! # Dispatcher Core
//!
//! The moving parts behind [`BatchDispatcher`].
//!
//! * [`queue`] - The mutex-and-condvar FIFO that producers push into and the
//!   worker drains in bounded batches. It also owns the worker's run flag.
//!
//! * [`batch`] - The worker's serving loop: take a batch, run the model, deliver
//!   one outcome per item by position.
//!
//! * [`worker`] - Spawning and joining the dedicated worker thread, and the
//!   thread body that loads the model before serving.
//!
//! * [`pill`] - A drop guard that cancels pending work if the worker panics.
//!
//! * [`dispatcher`] - The public [`BatchDispatcher`] tying these together.
pub(crate) mod batch;
pub(crate) mod dispatcher;
pub(crate) mod pill;
pub(crate) mod queue;
pub(crate) mod worker;

pub use dispatcher::BatchDispatcher;
