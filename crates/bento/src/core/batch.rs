use tracing::{debug, warn};
use crate::communication::{Outcome, QueueItem, Sink};
use crate::model::Model;
use super::queue::PendingQueue;

/// Serves batches from `queue` until it is stopped.
///
/// Batches run strictly one after another: every outcome of a batch is
/// delivered before the next batch is taken from the queue.
pub(crate) fn batching_loop<M: Model>(
    model: &mut M,
    backend: &M::Backend,
    queue: &PendingQueue<M::Input, M::Output>,
    epoch: u64,
    max_batch_size: usize,
) {
    while let Some(batch) = queue.wait_for_batch(epoch, max_batch_size) {
        let (inputs, sinks): (Vec<_>, Vec<_>) = batch
            .into_iter()
            .map(QueueItem::into_parts)
            .unzip();

        debug!(batch = inputs.len(), "dispatching batch");
        let outputs = model.process_batch(inputs, backend);
        deliver_outputs(outputs, sinks);
    }
}

/// Pairs outputs with sinks by position.
///
/// Sinks past the end of `outputs` resolve as [`Outcome::Shortfall`]; surplus
/// outputs are discarded.
pub(crate) fn deliver_outputs<O>(outputs: Vec<O>, sinks: Vec<Sink<O>>) {
    let expected = sinks.len();
    let produced = outputs.len();
    if produced < expected {
        warn!(expected, produced, "model returned fewer results than inputs");
    } else if produced > expected {
        warn!(expected, produced, "model returned more results than inputs; extras dropped");
    }

    let mut outputs = outputs.into_iter();
    for sink in sinks {
        match outputs.next() {
            Some(output) => sink.send(Outcome::Processed(output)),
            None => sink.send(Outcome::Shortfall),
        }
    }
}
