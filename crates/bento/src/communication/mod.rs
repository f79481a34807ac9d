mod handle;
mod outcome;
mod queue_item;

pub use handle::ResultHandle;
pub use outcome::Outcome;
pub(crate) use queue_item::{QueueItem, Sink};
