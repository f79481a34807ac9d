use crate::error::BoxError;

/// A batch-capable compute backend driven by a [`BatchDispatcher`](crate::BatchDispatcher).
///
/// The model is built by a [`Loader`] on the worker thread and never leaves it,
/// so implementations do not need to be `Send`. This matters for backends whose
/// contexts are bound to the thread that created them.
///
/// # Contract
///
/// * Element `i` of the returned vector is the result for `inputs[i]`.
/// * The output may be shorter than the input; missing positions resolve as
///   [`Outcome::Shortfall`](crate::Outcome::Shortfall). It must never be reordered.
/// * `process_batch` is never called concurrently on the same instance.
///
/// # Example
///
/// ```
/// use bento::Model;
///
/// struct Doubler;
///
/// impl Model for Doubler {
///     type Input = u32;
///     type Output = u32;
///     type Backend = ();
///
///     fn process_batch(&mut self, inputs: Vec<u32>, _backend: &()) -> Vec<u32> {
///         inputs.into_iter().map(|x| x * 2).collect()
///     }
/// }
/// ```
pub trait Model: 'static {
    /// Item submitted by producers.
    type Input: Send + 'static;

    /// Result delivered back to each producer.
    type Output: Send + 'static;

    /// Opaque token (device, stream, session) threaded unmodified into every batch.
    type Backend: Send + 'static;

    /// Processes one batch synchronously on the worker thread.
    fn process_batch(&mut self, inputs: Vec<Self::Input>, backend: &Self::Backend) -> Vec<Self::Output>;
}

/// Factory invoked exactly once per `start`, on the worker thread.
///
/// Any `FnOnce() -> Result<M, E>` closure is a loader.
pub trait Loader: Send + 'static {
    /// The model this loader builds.
    type Model: Model;

    /// Why loading failed. Surfaced as [`DispatchError::LoadFailed`](crate::DispatchError::LoadFailed).
    type Error: Into<BoxError>;

    /// Builds the model. Runs on the worker thread before any batch is served;
    /// returning an error makes `start` fail and leaves no worker behind.
    fn load(self) -> Result<Self::Model, Self::Error>;
}

impl<F, M, E> Loader for F
where
    F: FnOnce() -> Result<M, E> + Send + 'static,
    M: Model,
    E: Into<BoxError>,
{
    type Model = M;
    type Error = E;

    fn load(self) -> Result<M, E> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Model for Echo {
        type Input = String;
        type Output = String;
        type Backend = ();

        fn process_batch(&mut self, inputs: Vec<String>, _backend: &()) -> Vec<String> {
            inputs
        }
    }

    fn load_with<L: Loader>(loader: L) -> Result<L::Model, BoxError> {
        loader.load().map_err(Into::into)
    }

    #[test]
    fn test_closure_is_loader() {
        let mut model = load_with(|| Ok::<_, BoxError>(Echo)).unwrap();
        assert_eq!(model.process_batch(vec!["a".into()], &()), vec!["a".to_string()]);
    }

    #[test]
    fn test_closure_error_is_reported() {
        let err = match load_with(|| Err::<Echo, _>("no weights")) {
            Err(err) => err,
            Ok(_) => panic!("loader should fail"),
        };
        assert_eq!(err.to_string(), "no weights");
    }
}
