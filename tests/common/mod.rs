// Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use harbour::error::{Error, Result};
use harbour::models::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub fn stack(id: StackId, name: &str, endpoint_id: Option<EndpointId>) -> Stack {
    Stack {
        id,
        name: name.into(),
        kind: Some(StackType::Compose),
        endpoint_id,
        status: Some(StackStatus::Active),
        entry_point: Some("docker-compose.yml".into()),
        project_path: None,
    }
}

pub fn container(id: &str, name: &str, stack: Option<&str>) -> Container {
    let labels = stack.map(|s| {
        HashMap::from([("com.docker.compose.project".to_string(), s.to_string())])
    });
    Container {
        id: id.into(),
        names: Some(vec![format!("/{name}")]),
        image: Some("nginx:latest".into()),
        image_id: None,
        command: None,
        created: None,
        ports: None,
        labels,
        state: Some(ContainerStatus::Running),
        status: Some("Up 2 hours".into()),
        network_settings: None,
        mounts: None,
    }
}

pub fn endpoint(id: EndpointId, name: &str) -> Endpoint {
    Endpoint {
        id,
        name: Some(name.into()),
        status: Some(EndpointStatus::Up),
        kind: Some(EndpointType::Docker),
        url: Some("unix:///var/run/docker.sock".into()),
        public_url: None,
        group_id: Some(1),
        snapshots: None,
        kubernetes: None,
        azure_credentials: None,
        tls_config: None,
    }
}

/// Holds a scripted reply back until released; reports when the call arrived.
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the gated call has reached the mock.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Scripted response for one API call.
pub struct Reply<T> {
    pub result: Result<T>,
    pub gate: Option<Gate>,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            gate: None,
        }
    }

    pub fn err(error: Error) -> Self {
        Self {
            result: Err(error),
            gate: None,
        }
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }
}

/// In-memory `PortainerApi`; each call pops the next scripted reply.
#[derive(Default)]
pub struct MockApi {
    pub endpoints: Mutex<Vec<Reply<Vec<Endpoint>>>>,
    pub containers: Mutex<Vec<Reply<Vec<Container>>>>,
    pub stacks: Mutex<Vec<Reply<Vec<Stack>>>>,
    pub stack_state_calls: Mutex<Vec<(StackId, EndpointId, bool)>>,
    pub execute_calls: Mutex<Vec<(EndpointId, String, ExecuteAction)>>,
    pub container_calls: AtomicUsize,
}

pub fn server_error(message: &str) -> Error {
    Error::HttpStatus {
        status: 500,
        message: Some(message.into()),
    }
}

impl MockApi {
    pub fn push_stacks(&self, reply: Reply<Vec<Stack>>) {
        self.stacks.lock().unwrap().push(reply);
    }

    pub fn push_containers(&self, reply: Reply<Vec<Container>>) {
        self.containers.lock().unwrap().push(reply);
    }

    pub fn push_endpoints(&self, reply: Reply<Vec<Endpoint>>) {
        self.endpoints.lock().unwrap().push(reply);
    }

    pub fn container_calls(&self) -> usize {
        self.container_calls.load(Ordering::SeqCst)
    }

    pub fn pending_stacks(&self) -> usize {
        self.stacks.lock().unwrap().len()
    }
}

async fn answer<T>(queue: &Mutex<Vec<Reply<T>>>) -> Result<T> {
    let reply = {
        let mut queue = queue.lock().unwrap();
        assert!(!queue.is_empty(), "unexpected API call");
        queue.remove(0)
    };
    if let Some(gate) = reply.gate {
        gate.entered.notify_one();
        gate.release.notified().await;
    }
    reply.result
}

#[async_trait]
impl harbour::portainer_repo::PortainerApi for MockApi {
    async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        answer(&self.endpoints).await
    }

    async fn containers(&self, _endpoint_id: EndpointId) -> Result<Vec<Container>> {
        self.container_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.containers).await
    }

    async fn inspect_container(
        &self,
        _endpoint_id: EndpointId,
        _container_id: &str,
    ) -> Result<ContainerDetails> {
        Err(Error::HttpStatus {
            status: 404,
            message: Some("No such container".into()),
        })
    }

    async fn stacks(&self) -> Result<Vec<Stack>> {
        answer(&self.stacks).await
    }

    async fn set_stack_state(
        &self,
        stack_id: StackId,
        endpoint_id: EndpointId,
        started: bool,
    ) -> Result<()> {
        self.stack_state_calls
            .lock()
            .unwrap()
            .push((stack_id, endpoint_id, started));
        Ok(())
    }

    async fn execute(
        &self,
        endpoint_id: EndpointId,
        container_id: &str,
        action: ExecuteAction,
    ) -> Result<()> {
        self.execute_calls
            .lock()
            .unwrap()
            .push((endpoint_id, container_id.to_string(), action));
        Ok(())
    }

    async fn motd(&self) -> Result<Motd> {
        Ok(Motd {
            title: "Hello".into(),
            message: "Welcome".into(),
            style: None,
            hash: None,
        })
    }
}
