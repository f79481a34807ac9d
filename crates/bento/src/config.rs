//! Worker configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default name given to the worker thread.
pub const DEFAULT_THREAD_NAME: &str = "bento-worker";

/// Settings bound to a worker for the lifetime of one `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    /// Upper bound on the number of items handed to one `process_batch` call.
    ///
    /// Zero is accepted here and clamped to one when the worker starts.
    pub max_batch_size: usize,

    /// Name of the spawned worker thread.
    pub thread_name: String,
}

impl DispatchConfig {
    /// Config with the given batch bound and the default thread name.
    pub fn new(max_batch_size: usize) -> Self {
        Self {
            max_batch_size,
            ..Default::default()
        }
    }

    /// Replaces the worker thread name, which shows up in panics and debuggers.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Batch size the worker actually uses, never below one.
    pub fn effective_batch_size(&self) -> usize {
        self.max_batch_size.max(1)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}
