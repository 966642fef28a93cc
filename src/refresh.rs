// Cancellable refresh tasks and per-resource in-flight bookkeeping.
//
// Every refresh runs as a tokio task racing its work against a
// CancellationToken. The owner keeps a `Slot` per resource: starting a new
// refresh cancels the previous token and bumps the generation, and a task may
// only apply its result while its generation is still current. That check runs
// under the owner's lock, so a superseded task never mutates state even if its
// response arrives late.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Handle to one in-flight refresh.
///
/// Dropping the handle detaches the task; it still runs to completion and
/// still applies its result if it was not superseded.
#[derive(Debug)]
pub struct RefreshHandle<T> {
    token: CancellationToken,
    task: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> RefreshHandle<T> {
    /// Spawns `work` on the runtime, racing it against `token`.
    pub(crate) fn spawn<F>(token: CancellationToken, work: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => Err(Error::Cancelled),
                result = work => result,
            }
        });
        Self { token, task }
    }
}

impl<T> RefreshHandle<T> {
    /// Asks the task to stop. The request in flight is dropped at its next
    /// suspension point and the task resolves to [`Error::Cancelled`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Token that cancels this refresh; lets a parent operation cancel children.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for the task and returns its outcome.
    pub async fn value(self) -> Result<T> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Error::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

/// In-flight state of one refreshable resource.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    generation: u64,
    current: Option<CancellationToken>,
}

impl Slot {
    /// Cancels the running refresh (if any) and registers a new one.
    pub(crate) fn begin(&mut self) -> (u64, CancellationToken) {
        self.cancel();
        self.generation += 1;
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        (self.generation, token)
    }

    /// Cancels the running refresh without starting another.
    pub(crate) fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// True while `generation` is the latest refresh and nobody canceled it.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
            && self
                .current
                .as_ref()
                .is_some_and(|token| !token.is_cancelled())
    }

    /// Clears the slot if `generation` is still the registered refresh.
    pub(crate) fn finish(&mut self, generation: u64) {
        if self.generation == generation {
            self.current = None;
        }
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}
