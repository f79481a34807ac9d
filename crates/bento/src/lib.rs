//! # Bento
//!
//! A thread-backed **batching dispatcher**: many producers submit single items,
//! one dedicated worker thread runs them through a batch-capable model, and
//! every producer gets its own result back.
//!
//! ## Overview
//!
//! Batch-oriented backends (GPU inference engines, vectorized codecs, bulk
//! database writers) are most efficient when fed many inputs per call, while
//! callers naturally produce one input at a time from many threads. A
//! [`BatchDispatcher`] sits between the two:
//!
//! - Producers call [`BatchDispatcher::submit`] or [`BatchDispatcher::submit_many`]
//!   from any thread and receive a [`ResultHandle`] per input.
//! - A worker thread takes up to `max_batch_size` queued items at a time, in
//!   arrival order, and calls [`Model::process_batch`] once per batch.
//! - Each handle resolves with an [`Outcome`]: the model's result for that
//!   position, or the reason there is none.
//!
//! ## Architecture
//!
//! ### Model and Loader
//!
//! The [`Model`] trait is the backend contract. A [`Loader`] builds the model on
//! the worker thread when the dispatcher starts, so models bound to the thread
//! that created them (device contexts, streams) work without being `Send`.
//!
//! ### Result handles
//!
//! A [`ResultHandle`] is a single-assignment channel. It can be `.await`ed,
//! blocked on with [`ResultHandle::wait`] / [`ResultHandle::wait_outcome`], or
//! polled with [`ResultHandle::try_outcome`]. Handles never hang: stopping the
//! dispatcher resolves every pending item as [`Outcome::Cancelled`].
//!
//! ### Fallback results
//!
//! When a model returns fewer results than inputs, the unmatched items resolve
//! as [`Outcome::Shortfall`]. [`ResultHandle::wait`] maps every non-processed
//! outcome to `O::default()`; callers that need to know *why* a result is
//! missing should use [`ResultHandle::wait_outcome`].
//!
//! ## Features
//!
//! - **serde** - `Serialize`/`Deserialize` for [`DispatchConfig`]
//! - **subscriber** - [`init_tracing`] helper built on `tracing-subscriber`
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (worker lifecycle at `info`, batches at
//! `debug`, fallbacks at `warn`) and never installs a subscriber itself.
//!

mod communication;
mod config;
mod core;
mod error;
mod model;

pub use communication::{Outcome, ResultHandle};
pub use config::{DispatchConfig, DEFAULT_THREAD_NAME};
pub use self::core::BatchDispatcher;
pub use error::{BoxError, DispatchError};
pub use model::{Loader, Model};

/// Initializes a global tracing subscriber filtered by `RUST_LOG`.
///
/// Intended for binaries and tests embedding the dispatcher. Panics if a global
/// subscriber is already set.
#[cfg_attr(docsrs, doc(cfg(feature = "subscriber")))]
#[cfg(feature = "subscriber")]
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
