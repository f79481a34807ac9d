use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use super::Outcome;

/// # ResultHandle
///
/// The submitter's side of one work item: a wrapper around a Tokio oneshot receiver.
///
/// A handle can be awaited from async code or waited on from plain threads. It
/// always resolves: if the sending side is dropped without a value (the worker
/// died mid-batch) the outcome is [`Outcome::Abandoned`].
pub struct ResultHandle<O> {
    /// The underlying channel receiver
    receiver: oneshot::Receiver<Outcome<O>>,
}

impl<O> ResultHandle<O> {
    pub(crate) fn new(receiver: oneshot::Receiver<Outcome<O>>) -> Self {
        Self {
            receiver,
        }
    }

    /// Blocks the current thread until the item resolves, keeping the outcome tag.
    ///
    /// Safe to call from inside an async runtime, though it parks that thread.
    pub fn wait_outcome(self) -> Outcome<O> {
        futures::executor::block_on(self)
    }

    /// Blocks until the item resolves and returns its result.
    ///
    /// Items that were not processed (stopped dispatcher, short model output,
    /// dead worker) yield `O::default()`. Use [`wait_outcome`](Self::wait_outcome)
    /// to tell these apart from a genuine result.
    pub fn wait(self) -> O
    where
        O: Default,
    {
        self.wait_outcome().unwrap_or_default()
    }

    /// Polls without blocking. `None` means the item is still pending.
    pub fn try_outcome(&mut self) -> Option<Outcome<O>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Outcome::Abandoned),
        }
    }
}

impl<O> Future for ResultHandle<O> {
    type Output = Outcome<O>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Outcome::Abandoned))
    }
}
