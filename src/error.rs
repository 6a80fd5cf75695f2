//! Error types for admission control.

use thiserror::Error;

/// Failures talking to the quota store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store round trip failed (network, timeout).
    #[error("quota store unavailable: {0}")]
    Unavailable(String),
    /// Establishing or tearing down the store connection failed.
    #[error("quota store connection failed: {0}")]
    Connection(String),
}

/// Failures rendering or probing the rejection view.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The named view does not exist.
    #[error("unknown rejection view `{0}`")]
    UnknownView(String),
    /// The view exists but failed to render.
    #[error("rejection view failed to render: {0}")]
    Render(String),
}

/// Startup configuration failures. Fatal: the service must not accept
/// traffic when `start()` returns one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured rejection view cannot be rendered.
    #[error("rejection view `{view}` is not usable: {reason}")]
    View { view: String, reason: String },
    /// The quota store connection could not be established.
    #[error("quota store failed to connect: {0}")]
    Store(#[source] StoreError),
}

/// Failures produced while deciding admission for one request.
///
/// Quota exhaustion is not an error; it is a designed outcome carried by
/// [`Admission::Exceeded`](crate::engine::Admission).
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The quota store round trip failed. Never retried by the engine; the
    /// fail-open/fail-closed choice is made by configuration, not here.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The pluggable origin resolver failed.
    #[error("origin resolution failed: {0}")]
    Origin(String),
    /// The user-supplied skip predicate failed.
    #[error("skip predicate failed: {0}")]
    Skip(String),
    /// An awaited event listener failed. Emission is synchronous, so a
    /// faulty listener fails the admission step for that request.
    #[error("rate limit event listener failed: {0}")]
    Listener(String),
    /// The rejection view failed to render at admission time.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Unified error type for the admission middleware, generic over the inner
/// service's error.
#[derive(Debug, Error)]
pub enum RateLimitError<E> {
    /// The admission step itself failed.
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    /// The wrapped service failed.
    #[error(transparent)]
    Inner(E),
}

impl<E> RateLimitError<E> {
    /// Check whether this error came from the quota store.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Admission(AdmissionError::Store(_)))
    }

    /// Check whether this error came from an awaited event listener.
    pub fn is_listener(&self) -> bool {
        matches!(self, Self::Admission(AdmissionError::Listener(_)))
    }

    /// Check whether this error wraps the inner service's error.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Borrow the admission failure if present.
    pub fn as_admission(&self) -> Option<&AdmissionError> {
        match self {
            Self::Admission(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the inner service error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct DummyError;

    impl fmt::Display for DummyError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "dummy")
        }
    }

    impl std::error::Error for DummyError {}

    #[test]
    fn store_error_display_mentions_store() {
        let err: RateLimitError<DummyError> =
            AdmissionError::Store(StoreError::Unavailable("connection refused".into())).into();
        assert!(err.is_store());
        assert!(format!("{}", err).contains("quota store unavailable"));
    }

    #[test]
    fn listener_error_is_classified() {
        let err: RateLimitError<DummyError> =
            AdmissionError::Listener("audit sink down".into()).into();
        assert!(err.is_listener());
        assert!(!err.is_inner());
    }

    #[test]
    fn into_inner_extracts_service_error() {
        let err = RateLimitError::Inner(DummyError);
        assert!(err.is_inner());
        assert!(err.into_inner().is_some());
    }

    #[test]
    fn config_error_names_the_view() {
        let err = ConfigError::View { view: "quota-exceeded".into(), reason: "not found".into() };
        assert!(format!("{}", err).contains("quota-exceeded"));
    }
}
