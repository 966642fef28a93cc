// Portainer REST API access

mod paths;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::PortainerConfig;
use crate::decode::{self, ListPolicy};
use crate::error::{Error, Result};
use crate::models::{
    Container, ContainerDetails, Endpoint, EndpointId, ExecuteAction, Motd, Stack, StackId,
};
use crate::version;

/// Header carrying a Portainer access token.
const API_KEY_HEADER: &str = "X-API-Key";

/// Operations the store needs from a Portainer server.
#[async_trait]
pub trait PortainerApi: Send + Sync {
    async fn endpoints(&self) -> Result<Vec<Endpoint>>;

    /// All containers (running or not) on one endpoint.
    async fn containers(&self, endpoint_id: EndpointId) -> Result<Vec<Container>>;

    async fn inspect_container(
        &self,
        endpoint_id: EndpointId,
        container_id: &str,
    ) -> Result<ContainerDetails>;

    async fn stacks(&self) -> Result<Vec<Stack>>;

    /// Starts (`started = true`) or stops a stack deployed on `endpoint_id`.
    async fn set_stack_state(
        &self,
        stack_id: StackId,
        endpoint_id: EndpointId,
        started: bool,
    ) -> Result<()>;

    async fn execute(
        &self,
        endpoint_id: EndpointId,
        container_id: &str,
        action: ExecuteAction,
    ) -> Result<()>;

    async fn motd(&self) -> Result<Motd>;
}

/// Error body Portainer returns with non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    details: Option<String>,
}

/// HTTP implementation of [`PortainerApi`].
pub struct PortainerRepo {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    list_policy: ListPolicy,
}

impl PortainerRepo {
    pub fn connect(config: &PortainerConfig, list_policy: ListPolicy) -> Result<Self> {
        let base_url = base_url(&config.url)?;
        let client = Client::builder()
            .user_agent(version::user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            list_policy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.details.or(b.message))
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()));
        debug!(status = status.as_u16(), ?message, "Portainer request failed");
        Err(Error::HttpStatus {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.client.get(self.url(path)?)).await?;
        let bytes = response.bytes().await?;
        Ok(decode::decode(&bytes)?)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let response = self
            .send(self.client.get(self.url(path)?).query(query))
            .await?;
        let bytes = response.bytes().await?;
        let decoded = decode::decode_list(&bytes, self.list_policy)?;
        for skipped in &decoded.skipped {
            warn!(
                path,
                index = skipped.index,
                error = %skipped.error,
                "Skipping element that failed to decode"
            );
        }
        Ok(decoded.items)
    }

    async fn post(&self, path: &str, query: &[(&str, String)]) -> Result<()> {
        self.send(self.client.post(self.url(path)?).query(query))
            .await?;
        Ok(())
    }
}

/// Parses the server URL; a trailing `/` is added so relative paths join under it.
fn base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl PortainerApi for PortainerRepo {
    #[instrument(skip(self), fields(repo = "portainer", operation = "endpoints"))]
    async fn endpoints(&self) -> Result<Vec<Endpoint>> {
        self.get_list(paths::ENDPOINTS, &[]).await
    }

    #[instrument(skip(self), fields(repo = "portainer", operation = "containers"))]
    async fn containers(&self, endpoint_id: EndpointId) -> Result<Vec<Container>> {
        self.get_list(&paths::containers(endpoint_id), &[("all", "true")])
            .await
    }

    #[instrument(skip(self), fields(repo = "portainer", operation = "inspect_container"))]
    async fn inspect_container(
        &self,
        endpoint_id: EndpointId,
        container_id: &str,
    ) -> Result<ContainerDetails> {
        self.get_one(&paths::container_inspect(endpoint_id, container_id))
            .await
    }

    #[instrument(skip(self), fields(repo = "portainer", operation = "stacks"))]
    async fn stacks(&self) -> Result<Vec<Stack>> {
        self.get_list(paths::STACKS, &[]).await
    }

    #[instrument(skip(self), fields(repo = "portainer", operation = "set_stack_state"))]
    async fn set_stack_state(
        &self,
        stack_id: StackId,
        endpoint_id: EndpointId,
        started: bool,
    ) -> Result<()> {
        self.post(
            &paths::stack_state(stack_id, started),
            &[("endpointId", endpoint_id.to_string())],
        )
        .await
    }

    #[instrument(skip(self), fields(repo = "portainer", operation = "execute"))]
    async fn execute(
        &self,
        endpoint_id: EndpointId,
        container_id: &str,
        action: ExecuteAction,
    ) -> Result<()> {
        self.post(
            &paths::container_action(endpoint_id, container_id, action),
            &[],
        )
        .await
    }

    #[instrument(skip(self), fields(repo = "portainer", operation = "motd"))]
    async fn motd(&self) -> Result<Motd> {
        self.get_one(paths::MOTD).await
    }
}
