//! Error decorator that remembers where an error was raised.
//!
//! Storage errors travel a long way before somebody logs them: a flush worker
//! retries a batch statement, fails again, and only then writes a line. By
//! wrapping the original error into a [`LocatedError`] at the point where it
//! leaves the driver, the log line names the code location that produced it.
//!
//! ```rust
//! use std::error::Error;
//! use swarm_tracker_located_error::{Located, LocatedError};
//!
//! #[derive(thiserror::Error, Debug)]
//! enum TestError {
//!     #[error("Test")]
//!     Test,
//! }
//!
//! let e: LocatedError<'_, TestError> = Located(TestError::Test).into();
//!
//! assert!(e.to_string().contains("Test"));
//! assert!(e.to_string().contains("located-error"));
//! ```
use std::error::Error;
use std::panic::Location;
use std::sync::Arc;

/// A shared, thread-safe, dynamically typed error.
pub type DynError = Arc<dyn std::error::Error + Send + Sync>;

/// Wrapper used to turn any error into a [`LocatedError`] with `.into()`.
pub struct Located<E>(pub E);

/// An error with the caller location where it was converted.
#[derive(Debug)]
pub struct LocatedError<'a, E>
where
    E: Error + ?Sized + Send + Sync,
{
    source: Arc<E>,
    location: Box<Location<'a>>,
}

impl<'a, E> LocatedError<'a, E>
where
    E: Error + ?Sized + Send + Sync,
{
    #[must_use]
    pub fn location(&self) -> &Location<'a> {
        &self.location
    }
}

impl<E> std::fmt::Display for LocatedError<'_, E>
where
    E: Error + ?Sized + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.source, self.location)
    }
}

impl<E> Error for LocatedError<'_, E>
where
    E: Error + ?Sized + Send + Sync + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl<E> Clone for LocatedError<'_, E>
where
    E: Error + ?Sized + Send + Sync,
{
    fn clone(&self) -> Self {
        LocatedError {
            source: self.source.clone(),
            location: self.location.clone(),
        }
    }
}

impl<E> From<Located<E>> for LocatedError<'_, E>
where
    E: Error + Send + Sync,
{
    #[track_caller]
    fn from(e: Located<E>) -> Self {
        let e = LocatedError {
            source: Arc::new(e.0),
            location: Box::new(*Location::caller()),
        };
        tracing::debug!("{e}");
        e
    }
}

impl From<DynError> for LocatedError<'_, dyn std::error::Error + Send + Sync> {
    #[track_caller]
    fn from(e: DynError) -> Self {
        LocatedError {
            source: e,
            location: Box::new(*Location::caller()),
        }
    }
}
