// Stacks screen controller: reload coordination, derived view state, stack start/stop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{EndpointId, Preferences, Stack, StackId};
use crate::refresh::{RefreshHandle, Slot};
use crate::stacks_query::{StackFilter, StackItem, visible_stacks};
use crate::store::{ContainersHandle, PortainerStore, Resource};

/// What the stacks screen should show. Always derived, never stored.
#[derive(Debug, Clone)]
pub enum ViewState {
    /// First load in flight, nothing to show yet. Also reported before any
    /// reload was requested.
    Loading,
    /// Reload in flight; the stale stacks stay visible.
    Reloading(Arc<Vec<Stack>>),
    Success(Arc<Vec<Stack>>),
    /// Last reload failed before any stacks were ever loaded.
    Failure(Error),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading | ViewState::Reloading(_))
    }
}

struct ViewInner {
    reload: Slot,
    children: Vec<CancellationToken>,
    last_error: Option<Error>,
    query: String,
    preferences: Preferences,
}

pub struct StacksViewModel {
    store: Arc<PortainerStore>,
    inner: Mutex<ViewInner>,
}

impl StacksViewModel {
    pub fn new(store: Arc<PortainerStore>, preferences: Preferences) -> Self {
        Self {
            store,
            inner: Mutex::new(ViewInner {
                reload: Slot::default(),
                children: Vec::new(),
                last_error: None,
                query: String::new(),
                preferences,
            }),
        }
    }

    pub fn store(&self) -> &Arc<PortainerStore> {
        &self.store
    }

    /// Cancels the previous reload and starts a new one.
    ///
    /// `None` falls back to the include-limited-stacks preference. When
    /// containers are included both fetches run concurrently and both must
    /// succeed. A superseded reload resolves to [`Error::Cancelled`] and
    /// changes neither the store nor [`last_error`](Self::last_error).
    pub fn get_stacks(self: &Arc<Self>, including_containers: Option<bool>) -> RefreshHandle<()> {
        let (generation, token, stacks, containers) = {
            let mut inner = self.lock();
            let including =
                including_containers.unwrap_or(inner.preferences.include_limited_stacks);
            // children of the superseded reload must not reach the store
            for child in inner.children.drain(..) {
                child.cancel();
            }
            let (generation, token) = inner.reload.begin();
            debug!(generation, including_containers = including, "Reloading stacks");
            let stacks = self.store.refresh_stacks();
            let containers = including.then(|| self.store.refresh_containers());
            inner.children = std::iter::once(stacks.cancellation_token())
                .chain(containers.as_ref().map(RefreshHandle::cancellation_token))
                .collect();
            (generation, token, stacks, containers)
        };
        // canceling (or finishing) the reload cancels whatever child is still running
        let guards: Vec<_> = std::iter::once(stacks.cancellation_token())
            .chain(containers.as_ref().map(RefreshHandle::cancellation_token))
            .map(CancellationToken::drop_guard)
            .collect();

        let view = Arc::clone(self);
        RefreshHandle::spawn(token, async move {
            let _guards = guards;
            let result = match containers {
                Some(containers) => future::try_join(stacks.value(), containers.value())
                    .await
                    .map(drop),
                None => stacks.value().await.map(drop),
            };
            view.finish(generation, result)
        })
    }

    /// Stack rows for the current query, preferences and store contents.
    pub fn stacks(&self) -> Vec<StackItem> {
        let snapshot = self.store.snapshot();
        let filter = self.filter(snapshot.selected_endpoint_id);
        visible_stacks(&snapshot.stacks, &snapshot.containers, &filter)
    }

    pub fn view_state(&self) -> ViewState {
        let snapshot = self.store.snapshot();
        let (reloading, last_error) = {
            let inner = self.lock();
            (inner.reload.in_flight(), inner.last_error.clone())
        };
        let in_flight = reloading || self.store.is_refreshing(Resource::Stacks);
        if in_flight {
            return if snapshot.stacks_loaded {
                ViewState::Reloading(Arc::clone(&snapshot.stacks))
            } else {
                ViewState::Loading
            };
        }
        match last_error {
            Some(e) if !snapshot.stacks_loaded => ViewState::Failure(e),
            _ if snapshot.stacks_loaded => ViewState::Success(Arc::clone(&snapshot.stacks)),
            _ => ViewState::Loading,
        }
    }

    /// Error of the last completed reload; kept while stale stacks are shown.
    pub fn last_error(&self) -> Option<Error> {
        self.lock().last_error.clone()
    }

    /// True when a completed load produced no rows to show.
    pub fn is_background_placeholder_visible(&self) -> bool {
        matches!(self.view_state(), ViewState::Success(_)) && self.stacks().is_empty()
    }

    pub fn query(&self) -> String {
        self.lock().query.clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.lock().query = query.into();
    }

    pub fn preferences(&self) -> Preferences {
        self.lock().preferences.clone()
    }

    pub fn set_preferences(&self, preferences: Preferences) {
        self.lock().preferences = preferences;
    }

    /// Starts or stops a stack; the returned handle tracks the container refresh that follows.
    pub async fn set_stack_state(
        &self,
        stack_id: StackId,
        started: bool,
    ) -> Result<ContainersHandle> {
        self.store.set_stack_state(stack_id, started).await
    }

    fn filter(&self, selected_endpoint_id: Option<EndpointId>) -> StackFilter {
        let inner = self.lock();
        StackFilter::new(inner.query.clone(), &inner.preferences, selected_endpoint_id)
    }

    fn finish(&self, generation: u64, result: Result<()>) -> Result<()> {
        let mut inner = self.lock();
        if !inner.reload.is_current(generation) {
            return Err(Error::Cancelled);
        }
        inner.reload.finish(generation);
        inner.children.clear();
        match result {
            Ok(()) => {
                inner.last_error = None;
                Ok(())
            }
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => {
                warn!(error = %e, "Stacks reload failed");
                inner.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_states() {
        assert!(ViewState::Loading.is_loading());
        assert!(ViewState::Reloading(Arc::default()).is_loading());
        assert!(!ViewState::Success(Arc::default()).is_loading());
        assert!(!ViewState::Failure(Error::NoEndpointSelected).is_loading());
    }
}
