//! Deferred results shared by the evaluator and registered callables.
//!
//! Every operator, function and transform returns a [`Deferred`]: either a
//! result that is already known or a future that will produce one. The
//! evaluator awaits both the same way, so a grammar may freely mix plain and
//! asynchronous callables.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::{evaluator::EvalError, value::Value};

/// A boxed evaluation in progress.
pub type EvalFuture<'a> = BoxFuture<'a, Result<Value, EvalError>>;

/// The result of a registered callable.
///
/// # Examples
///
/// ```
/// use sage_lang::{Deferred, EvalError, Value};
///
/// let now: Deferred = Value::Integer(1).into();
/// let failed: Deferred = Err::<Value, _>(EvalError::callback("oops")).into();
/// let later = Deferred::pending(async { Ok(Value::Integer(2)) });
/// # let _ = (now, failed, later);
/// ```
pub enum Deferred<'a> {
    /// Result available immediately
    Ready(Result<Value, EvalError>),
    /// Result produced by a future
    Pending(EvalFuture<'a>),
}

impl<'a> Deferred<'a> {
    /// Wraps a future.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, EvalError>> + Send + 'a,
    {
        Deferred::Pending(future.boxed())
    }

    /// Waits for the result.
    pub async fn resolve(self) -> Result<Value, EvalError> {
        match self {
            Deferred::Ready(result) => result,
            Deferred::Pending(future) => future.await,
        }
    }
}

impl From<Value> for Deferred<'_> {
    fn from(value: Value) -> Self {
        Deferred::Ready(Ok(value))
    }
}

impl From<Result<Value, EvalError>> for Deferred<'_> {
    fn from(result: Result<Value, EvalError>) -> Self {
        Deferred::Ready(result)
    }
}

impl fmt::Debug for Deferred<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deferred::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Deferred::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_resolves_without_polling_twice() {
        let deferred: Deferred = Value::Integer(3).into();
        let result = deferred.resolve().now_or_never();
        assert!(matches!(result, Some(Ok(Value::Integer(3)))));
    }

    #[test]
    fn test_pending_ready_future_resolves_immediately() {
        let deferred = Deferred::pending(async { Ok(Value::from("later")) });
        let result = deferred.resolve().now_or_never();
        assert!(matches!(result, Some(Ok(Value::String(s))) if s == "later"));
    }
}
