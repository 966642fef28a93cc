// Portainer API paths, relative to the server base URL

use crate::models::{EndpointId, ExecuteAction, StackId};

pub(super) const ENDPOINTS: &str = "api/endpoints";
pub(super) const STACKS: &str = "api/stacks";
pub(super) const MOTD: &str = "api/motd";

pub(super) fn containers(endpoint_id: EndpointId) -> String {
    format!("api/endpoints/{endpoint_id}/docker/containers/json")
}

pub(super) fn container_inspect(endpoint_id: EndpointId, container_id: &str) -> String {
    format!("api/endpoints/{endpoint_id}/docker/containers/{container_id}/json")
}

pub(super) fn container_action(
    endpoint_id: EndpointId,
    container_id: &str,
    action: ExecuteAction,
) -> String {
    format!(
        "api/endpoints/{endpoint_id}/docker/containers/{container_id}/{}",
        action.as_str()
    )
}

pub(super) fn stack_state(stack_id: StackId, started: bool) -> String {
    let verb = if started { "start" } else { "stop" };
    format!("api/stacks/{stack_id}/{verb}")
}
