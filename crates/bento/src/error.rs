use thiserror::Error;

/// Boxed error returned by a [`Loader`](crate::Loader).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reasons a [`BatchDispatcher`](crate::BatchDispatcher) failed to start.
///
/// Whatever the variant, no worker thread is left alive and the dispatcher
/// holds no active configuration once one of these has been returned.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The loader ran on the worker thread and reported that no model could be built.
    #[error("model loader failed: {0}")]
    LoadFailed(#[source] BoxError),

    /// The loader panicked before reporting an outcome.
    #[error("model loader panicked")]
    LoaderPanicked,

    /// The worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl DispatchError {
    pub(crate) fn load_failed<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::LoadFailed(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_load_failed_keeps_source() {
        let err = DispatchError::load_failed("engine file missing");
        assert_eq!(err.to_string(), "model loader failed: engine file missing");
        assert_eq!(err.source().unwrap().to_string(), "engine file missing");
    }

    #[test]
    fn test_spawn_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
        let err: DispatchError = io.into();
        assert!(matches!(err, DispatchError::Spawn(_)));
        assert!(err.to_string().contains("no threads left"));
    }
}
