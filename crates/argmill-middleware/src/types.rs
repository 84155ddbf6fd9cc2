//! Common types used throughout the middleware engine.

use argmill_core::ArgmillResult;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A value that is either available now or will be produced later.
///
/// [`ExecutionEngine::run`](crate::ExecutionEngine::run) returns
/// `Resolved` when every middleware and the handler completed synchronously,
/// and `Deferred` as soon as any of them handed back a future.
///
/// # Example
///
/// ```
/// use argmill_middleware::Resolution;
///
/// let ready: Resolution<u32> = Resolution::Resolved(3);
/// assert!(!ready.is_deferred());
/// assert_eq!(ready.into_resolved(), Some(3));
/// ```
pub enum Resolution<T> {
    /// The value is available immediately.
    Resolved(T),
    /// The value is produced by a future.
    Deferred(BoxFuture<'static, ArgmillResult<T>>),
}

impl<T: Send + 'static> Resolution<T> {
    /// Returns `true` if the value is produced by a future.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Waits for the value.
    pub async fn resolve(self) -> ArgmillResult<T> {
        match self {
            Self::Resolved(value) => Ok(value),
            Self::Deferred(future) => future.await,
        }
    }

    /// Returns the value when it is immediately available.
    #[must_use]
    pub fn into_resolved(self) -> Option<T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }

    /// Wraps the eventual result of a deferred value with `f`.
    ///
    /// `f` sees both successes and failures; immediate values pass through.
    #[must_use]
    pub fn inspect_deferred<F>(self, f: F) -> Self
    where
        F: FnOnce(&ArgmillResult<T>) + Send + 'static,
    {
        match self {
            Self::Resolved(value) => Self::Resolved(value),
            Self::Deferred(future) => Self::Deferred(Box::pin(async move {
                let result = future.await;
                f(&result);
                result
            })),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(value) => f.debug_tuple("Resolved").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}
