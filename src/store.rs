// In-memory fleet state: endpoints, containers of the selected endpoint, stacks.
//
// Reads go through an `ArcSwap` snapshot and never block. Writes happen only
// when a refresh completes, under the in-flight lock, and only if that refresh
// is still the current one for its resource.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::models::{
    Container, ContainerDetails, Endpoint, EndpointId, ExecuteAction, Stack, StackId,
};
use crate::portainer_repo::PortainerApi;
use crate::refresh::{RefreshHandle, Slot};

const EVENT_CAPACITY: usize = 64;

/// Refreshable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Endpoints,
    Containers,
    Stacks,
}

impl Resource {
    fn changed_event(self) -> StoreEvent {
        match self {
            Resource::Endpoints => StoreEvent::EndpointsChanged,
            Resource::Containers => StoreEvent::ContainersChanged,
            Resource::Stacks => StoreEvent::StacksChanged,
        }
    }
}

/// Emitted after the store state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    EndpointsChanged,
    ContainersChanged,
    StacksChanged,
    SelectedEndpointChanged,
}

/// Consistent view of everything the store holds.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub endpoints: Arc<Vec<Endpoint>>,
    pub containers: Arc<Vec<Container>>,
    pub stacks: Arc<Vec<Stack>>,
    pub selected_endpoint_id: Option<EndpointId>,
    pub endpoints_loaded: bool,
    pub containers_loaded: bool,
    pub stacks_loaded: bool,
}

impl StoreSnapshot {
    pub fn selected_endpoint(&self) -> Option<&Endpoint> {
        let id = self.selected_endpoint_id?;
        self.endpoints.iter().find(|e| e.id == id)
    }
}

#[derive(Default)]
struct InFlight {
    endpoints: Slot,
    containers: Slot,
    stacks: Slot,
    errors: HashMap<Resource, Error>,
}

impl InFlight {
    fn slot(&mut self, resource: Resource) -> &mut Slot {
        match resource {
            Resource::Endpoints => &mut self.endpoints,
            Resource::Containers => &mut self.containers,
            Resource::Stacks => &mut self.stacks,
        }
    }
}

pub type ContainersHandle = RefreshHandle<Arc<Vec<Container>>>;
pub type StacksHandle = RefreshHandle<Arc<Vec<Stack>>>;
pub type EndpointsHandle = RefreshHandle<Arc<Vec<Endpoint>>>;

/// Latest known fleet state, fetched through a [`PortainerApi`].
pub struct PortainerStore {
    api: Arc<dyn PortainerApi>,
    state: ArcSwap<StoreSnapshot>,
    in_flight: Mutex<InFlight>,
    events: broadcast::Sender<StoreEvent>,
}

impl PortainerStore {
    pub fn new(api: Arc<dyn PortainerApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            state: ArcSwap::from_pointee(StoreSnapshot::default()),
            in_flight: Mutex::new(InFlight::default()),
            events,
        }
    }

    pub fn api(&self) -> &Arc<dyn PortainerApi> {
        &self.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.state.load_full()
    }

    pub fn containers(&self) -> Arc<Vec<Container>> {
        Arc::clone(&self.state.load().containers)
    }

    pub fn stacks(&self) -> Arc<Vec<Stack>> {
        Arc::clone(&self.state.load().stacks)
    }

    pub fn endpoints(&self) -> Arc<Vec<Endpoint>> {
        Arc::clone(&self.state.load().endpoints)
    }

    pub fn selected_endpoint_id(&self) -> Option<EndpointId> {
        self.state.load().selected_endpoint_id
    }

    /// The selected endpoint, if it is among the loaded endpoints.
    pub fn selected_endpoint(&self) -> Option<Endpoint> {
        self.state.load().selected_endpoint().cloned()
    }

    pub fn has_loaded_containers(&self) -> bool {
        self.state.load().containers_loaded
    }

    pub fn has_loaded_stacks(&self) -> bool {
        self.state.load().stacks_loaded
    }

    pub fn has_loaded_endpoints(&self) -> bool {
        self.state.load().endpoints_loaded
    }

    /// Error of the last completed refresh of `resource`; cleared by the next success.
    pub fn last_error(&self, resource: Resource) -> Option<Error> {
        self.lock().errors.get(&resource).cloned()
    }

    pub fn is_refreshing(&self, resource: Resource) -> bool {
        self.lock().slot(resource).in_flight()
    }

    /// Switches the endpoint containers are fetched from.
    ///
    /// An in-flight container refresh is canceled and the containers of the
    /// previous endpoint are dropped.
    pub fn select_endpoint(&self, endpoint_id: Option<EndpointId>) {
        let mut in_flight = self.lock();
        let current = self.state.load();
        if current.selected_endpoint_id == endpoint_id {
            return;
        }
        in_flight.containers.cancel();
        let mut next = StoreSnapshot::clone(&current);
        next.selected_endpoint_id = endpoint_id;
        next.containers = Arc::default();
        next.containers_loaded = false;
        self.state.store(Arc::new(next));
        in_flight.errors.remove(&Resource::Containers);
        drop(in_flight);
        debug!(?endpoint_id, "Selected endpoint changed");
        let _ = self.events.send(StoreEvent::SelectedEndpointChanged);
        let _ = self.events.send(StoreEvent::ContainersChanged);
    }

    pub fn refresh_endpoints(self: &Arc<Self>) -> EndpointsHandle {
        let api = Arc::clone(&self.api);
        self.refresh(
            Resource::Endpoints,
            async move { api.endpoints().await },
            |state, endpoints| {
                state.endpoints = endpoints;
                state.endpoints_loaded = true;
            },
        )
    }

    /// Fetches containers of the selected endpoint.
    pub fn refresh_containers(self: &Arc<Self>) -> ContainersHandle {
        let api = Arc::clone(&self.api);
        let endpoint_id = self.selected_endpoint_id();
        self.refresh(
            Resource::Containers,
            async move {
                let endpoint_id = endpoint_id.ok_or(Error::NoEndpointSelected)?;
                api.containers(endpoint_id).await
            },
            |state, containers| {
                state.containers = containers;
                state.containers_loaded = true;
            },
        )
    }

    pub fn refresh_stacks(self: &Arc<Self>) -> StacksHandle {
        let api = Arc::clone(&self.api);
        self.refresh(
            Resource::Stacks,
            async move { api.stacks().await },
            |state, stacks| {
                state.stacks = stacks;
                state.stacks_loaded = true;
            },
        )
    }

    /// Starts or stops a stack on the selected endpoint, then refreshes containers.
    ///
    /// The command is not retried; the returned handle tracks the follow-up refresh.
    #[instrument(skip(self), fields(operation = "set_stack_state"))]
    pub async fn set_stack_state(
        self: &Arc<Self>,
        stack_id: StackId,
        started: bool,
    ) -> Result<ContainersHandle> {
        let endpoint_id = self
            .selected_endpoint_id()
            .ok_or(Error::NoEndpointSelected)?;
        self.api
            .set_stack_state(stack_id, endpoint_id, started)
            .await?;
        Ok(self.refresh_containers())
    }

    /// Runs a lifecycle action on a container of the selected endpoint, then
    /// refreshes containers.
    #[instrument(skip(self), fields(operation = "execute"))]
    pub async fn execute(
        self: &Arc<Self>,
        container_id: &str,
        action: ExecuteAction,
    ) -> Result<ContainersHandle> {
        let endpoint_id = self
            .selected_endpoint_id()
            .ok_or(Error::NoEndpointSelected)?;
        self.api.execute(endpoint_id, container_id, action).await?;
        Ok(self.refresh_containers())
    }

    /// Fetches container details from the selected endpoint. Never cached.
    pub async fn inspect_container(&self, container_id: &str) -> Result<ContainerDetails> {
        let endpoint_id = self
            .selected_endpoint_id()
            .ok_or(Error::NoEndpointSelected)?;
        self.api.inspect_container(endpoint_id, container_id).await
    }

    fn lock(&self) -> MutexGuard<'_, InFlight> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh<T, F, A>(
        self: &Arc<Self>,
        resource: Resource,
        fetch: F,
        apply: A,
    ) -> RefreshHandle<Arc<Vec<T>>>
    where
        T: Send + Sync + 'static,
        F: Future<Output = Result<Vec<T>>> + Send + 'static,
        A: FnOnce(&mut StoreSnapshot, Arc<Vec<T>>) + Send + 'static,
    {
        let (generation, token) = self.lock().slot(resource).begin();
        let store = Arc::clone(self);
        RefreshHandle::spawn(token, async move {
            let result = fetch.await;
            store.complete(resource, generation, result, apply)
        })
    }

    /// Applies a finished fetch if `generation` is still current for `resource`.
    fn complete<T, A>(
        &self,
        resource: Resource,
        generation: u64,
        result: Result<Vec<T>>,
        apply: A,
    ) -> Result<Arc<Vec<T>>>
    where
        A: FnOnce(&mut StoreSnapshot, Arc<Vec<T>>),
    {
        let mut in_flight = self.lock();
        if !in_flight.slot(resource).is_current(generation) {
            debug!(?resource, generation, "Dropping superseded refresh result");
            return Err(Error::Cancelled);
        }
        in_flight.slot(resource).finish(generation);
        match result {
            Ok(items) => {
                let items = Arc::new(items);
                let mut next = StoreSnapshot::clone(&self.state.load());
                apply(&mut next, Arc::clone(&items));
                self.state.store(Arc::new(next));
                in_flight.errors.remove(&resource);
                drop(in_flight);
                debug!(?resource, count = items.len(), "Refresh applied");
                let _ = self.events.send(resource.changed_event());
                Ok(items)
            }
            Err(e) => {
                warn!(?resource, error = %e, "Refresh failed");
                in_flight.errors.insert(resource, e.clone());
                Err(e)
            }
        }
    }
}
