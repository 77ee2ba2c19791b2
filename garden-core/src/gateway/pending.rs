//! Cancellable handles for in-flight requests.

use super::GatewayError;
use std::future::Future;
use std::sync::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::debug;

/// A request running on a tokio runtime.
///
/// The frame loop polls it with [`try_take`](Self::try_take) and never
/// blocks. Dropping the handle aborts the task, so a result that arrives
/// after its consumer is gone is never applied.
pub struct PendingRequest<T> {
    label: &'static str,
    receiver: Mutex<oneshot::Receiver<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> PendingRequest<T> {
    /// Run `future` on `runtime`.
    pub fn spawn<F>(runtime: &Handle, label: &'static str, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = runtime.spawn(async move {
            // Receiver gone means the request was cancelled
            let _ = tx.send(future.await);
        });
        debug!(label, "request started");
        Self {
            label,
            receiver: Mutex::new(rx),
            task,
        }
    }
}

impl<T> PendingRequest<T> {
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// `None` while the request is running. The result is handed out once;
    /// afterwards, or if the task died, this yields [`GatewayError::Cancelled`].
    pub fn try_take(&mut self) -> Option<Result<T, GatewayError>> {
        let receiver = match self.receiver.get_mut() {
            Ok(receiver) => receiver,
            Err(poisoned) => poisoned.into_inner(),
        };
        match receiver.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(GatewayError::Cancelled)),
        }
    }

    /// Abort the request. Its result, if any, is discarded.
    pub fn cancel(self) {
        debug!(label = self.label, "request cancelled");
    }
}

impl<T> Drop for PendingRequest<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T> std::fmt::Debug for PendingRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("label", &self.label)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
