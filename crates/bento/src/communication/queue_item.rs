use tokio::sync::oneshot;
use super::Outcome;

/// # QueueItem
///
/// A submitted input paired with the single-assignment sink for its outcome.
///
/// The sink is consumed by [`QueueItem::resolve`], so an item can be resolved at
/// most once. Dropping an unresolved item closes the channel and the submitter
/// observes [`Outcome::Abandoned`].
///
/// ## Type Parameters
///
/// * `I` - The input handed to the model
/// * `O` - The model's per-item result
pub struct QueueItem<I, O> {
    /// The value to be processed
    input: I,

    /// Channel for sending the outcome back to the submitter
    sink: oneshot::Sender<Outcome<O>>,
}

impl<I, O> QueueItem<I, O> {
    pub fn new(input: I, sink: oneshot::Sender<Outcome<O>>) -> Self {
        Self {
            input,
            sink,
        }
    }

    #[cfg(test)]
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Separates the input from its sink so the input can be moved into a batch.
    pub fn into_parts(self) -> (I, Sink<O>) {
        (self.input, Sink(self.sink))
    }

    /// Resolves the item without it ever reaching the model.
    pub fn resolve(self, outcome: Outcome<O>) {
        Sink(self.sink).send(outcome);
    }
}

/// The write side of one item after its input has been taken.
pub struct Sink<O>(oneshot::Sender<Outcome<O>>);

impl<O> Sink<O> {
    /// Delivers the outcome. A submitter that dropped its handle is not an error.
    pub fn send(self, outcome: Outcome<O>) {
        let _ = self.0.send(outcome);
    }
}
