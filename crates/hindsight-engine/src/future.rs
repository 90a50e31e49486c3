//! Deferred results.

use std::fmt;

use tokio::sync::oneshot;

use crate::error::{EngineError, EngineResult};

/// Handle to a result that is computed after it is requested.
///
/// Returned by async-mode contexts; the work is dispatched when the context's
/// scope exits. If the producing side is dropped (the scope never exited, or
/// dispatch failed) the handle resolves to [`EngineError::Cancelled`].
pub struct PricingFuture<T> {
    receiver: oneshot::Receiver<EngineResult<T>>,
}

/// Producer side of a [`PricingFuture`].
pub(crate) struct PricingPromise<T> {
    sender: oneshot::Sender<EngineResult<T>>,
}

impl<T> PricingFuture<T> {
    /// Creates a connected promise/future pair.
    pub(crate) fn pair() -> (PricingPromise<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        (PricingPromise { sender }, Self { receiver })
    }

    /// Waits for the result.
    pub async fn result(self) -> EngineResult<T> {
        self.receiver.await.unwrap_or(Err(EngineError::Cancelled))
    }

    /// Takes the result if it has arrived, without waiting.
    ///
    /// Returns `None` while the work is still outstanding.
    pub fn try_result(&mut self) -> Option<EngineResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(EngineError::Cancelled)),
        }
    }
}

impl<T> fmt::Debug for PricingFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricingFuture").finish_non_exhaustive()
    }
}

impl<T> PricingPromise<T> {
    /// Delivers the result. A dropped future is not an error.
    pub(crate) fn fulfil(self, result: EngineResult<T>) {
        let _ = self.sender.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fulfilled_future_resolves() {
        let (promise, future) = PricingFuture::pair();
        promise.fulfil(Ok(3));
        assert_eq!(future.result().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_dropped_promise_cancels() {
        let (promise, future) = PricingFuture::<u32>::pair();
        drop(promise);
        assert!(matches!(future.result().await, Err(EngineError::Cancelled)));
    }

    #[test]
    fn test_try_result_before_and_after() {
        let (promise, mut future) = PricingFuture::pair();
        assert!(future.try_result().is_none());
        promise.fulfil(Ok("done"));
        assert_eq!(future.try_result().unwrap().unwrap(), "done");
    }
}
