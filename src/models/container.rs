// Docker container models: list item, inspect details, state, config

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::{Mount, MountPoint, NetworkSettings, Port};

/// Compose label naming the owning project.
const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
/// Swarm label naming the owning stack.
const STACK_NAMESPACE_LABEL: &str = "com.docker.stack.namespace";

/// Docker container lifecycle state; lowercase on the wire (e.g. "running").
///
/// Ordered by lifecycle, not by name: created < running < paused < restarting
/// < removing < exited < dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerStatus {
    pub const LIFECYCLE: [ContainerStatus; 7] = [
        ContainerStatus::Created,
        ContainerStatus::Running,
        ContainerStatus::Paused,
        ContainerStatus::Restarting,
        ContainerStatus::Removing,
        ContainerStatus::Exited,
        ContainerStatus::Dead,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
        }
    }

    fn lifecycle_index(self) -> usize {
        match self {
            ContainerStatus::Created => 0,
            ContainerStatus::Running => 1,
            ContainerStatus::Paused => 2,
            ContainerStatus::Restarting => 3,
            ContainerStatus::Removing => 4,
            ContainerStatus::Exited => 5,
            ContainerStatus::Dead => 6,
        }
    }
}

/// Rank of a possibly-unknown status: position in the lifecycle, `-1` when unknown.
pub fn status_rank(status: Option<ContainerStatus>) -> isize {
    status.map_or(-1, |s| s.lifecycle_index() as isize)
}

impl Ord for ContainerStatus {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lifecycle_index().cmp(&other.lifecycle_index())
    }
}

impl PartialOrd for ContainerStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown container status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContainerStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::LIFECYCLE
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Container lifecycle command accepted by the Docker API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecuteAction {
    Start,
    Stop,
    Restart,
    Kill,
    Pause,
    Unpause,
}

impl ExecuteAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecuteAction::Start => "start",
            ExecuteAction::Stop => "stop",
            ExecuteAction::Restart => "restart",
            ExecuteAction::Kill => "kill",
            ExecuteAction::Pause => "pause",
            ExecuteAction::Unpause => "unpause",
        }
    }

    /// State the container is expected to reach once the action lands.
    pub fn expected_state(self) -> ContainerStatus {
        match self {
            ExecuteAction::Start => ContainerStatus::Running,
            ExecuteAction::Stop => ContainerStatus::Exited,
            ExecuteAction::Restart => ContainerStatus::Restarting,
            ExecuteAction::Kill => ContainerStatus::Exited,
            ExecuteAction::Pause => ContainerStatus::Paused,
            ExecuteAction::Unpause => ContainerStatus::Running,
        }
    }
}

impl fmt::Display for ExecuteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecuteAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ExecuteAction::Start),
            "stop" => Ok(ExecuteAction::Stop),
            "restart" => Ok(ExecuteAction::Restart),
            "kill" => Ok(ExecuteAction::Kill),
            "pause" => Ok(ExecuteAction::Pause),
            "unpause" => Ok(ExecuteAction::Unpause),
            other => Err(format!(
                "unknown action {other:?} (expected start, stop, restart, kill, pause or unpause)"
            )),
        }
    }
}

/// Container as returned by `GET /containers/json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names")]
    pub names: Option<Vec<String>>,
    #[serde(rename = "Image")]
    pub image: Option<String>,
    #[serde(rename = "ImageID")]
    pub image_id: Option<String>,
    #[serde(rename = "Command")]
    pub command: Option<String>,
    /// Unix seconds on the wire.
    #[serde(rename = "Created", with = "chrono::serde::ts_seconds_option", default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(rename = "Ports")]
    pub ports: Option<Vec<Port>>,
    #[serde(rename = "Labels")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(rename = "State")]
    pub state: Option<ContainerStatus>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "NetworkSettings")]
    pub network_settings: Option<NetworkSettings>,
    #[serde(rename = "Mounts")]
    pub mounts: Option<Vec<MountPoint>>,
}

impl Container {
    /// First name without the leading `/` Docker adds.
    pub fn display_name(&self) -> Option<&str> {
        self.names
            .as_ref()
            .and_then(|names| names.first())
            .map(|name| name.trim_start_matches('/'))
    }

    /// Name of the compose project or swarm stack this container belongs to.
    pub fn stack(&self) -> Option<&str> {
        let labels = self.labels.as_ref()?;
        labels
            .get(COMPOSE_PROJECT_LABEL)
            .or_else(|| labels.get(STACK_NAMESPACE_LABEL))
            .map(String::as_str)
    }
}

/// Container as returned by `GET /containers/{id}/json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDetails {
    #[serde(rename = "Id")]
    pub id: String,
    /// RFC 3339 on the wire.
    #[serde(rename = "Created")]
    pub created: DateTime<Utc>,
    #[serde(rename = "Path")]
    pub path: Option<String>,
    #[serde(rename = "Args")]
    pub args: Vec<String>,
    #[serde(rename = "State")]
    pub state: ContainerState,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "ResolvConfPath")]
    pub resolv_conf_path: Option<String>,
    #[serde(rename = "HostnamePath")]
    pub hostname_path: Option<String>,
    #[serde(rename = "HostsPath")]
    pub hosts_path: Option<String>,
    #[serde(rename = "LogPath")]
    pub log_path: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "RestartCount")]
    pub restart_count: i64,
    #[serde(rename = "Driver")]
    pub driver: String,
    #[serde(rename = "Platform")]
    pub platform: Option<String>,
    #[serde(rename = "MountLabel")]
    pub mount_label: Option<String>,
    #[serde(rename = "ProcessLabel")]
    pub process_label: Option<String>,
    #[serde(rename = "AppArmorProfile")]
    pub app_armor_profile: Option<String>,
    #[serde(rename = "HostConfig")]
    pub host_config: Option<HostConfig>,
    #[serde(rename = "GraphDriver")]
    pub graph_driver: GraphDriver,
    #[serde(rename = "SizeRw")]
    pub size_rw: Option<i64>,
    #[serde(rename = "SizeRootFs")]
    pub size_root_fs: Option<i64>,
    #[serde(rename = "Mounts")]
    pub mounts: Option<Vec<MountPoint>>,
    #[serde(rename = "Config")]
    pub config: Option<ContainerConfig>,
    #[serde(rename = "NetworkSettings")]
    pub network_settings: Option<NetworkSettings>,
}

impl ContainerDetails {
    /// Name without the leading `/`.
    pub fn display_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerState {
    #[serde(rename = "Status")]
    pub status: ContainerStatus,
    #[serde(rename = "Running")]
    pub running: bool,
    #[serde(rename = "Paused")]
    pub paused: bool,
    #[serde(rename = "Restarting")]
    pub restarting: bool,
    #[serde(rename = "OOMKilled")]
    pub oom_killed: bool,
    #[serde(rename = "Dead")]
    pub dead: bool,
    #[serde(rename = "Pid")]
    pub pid: i64,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "StartedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "FinishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "Health")]
    pub health: Option<ContainerHealth>,
}

/// Result of the container's health check, when one is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHealth {
    /// "starting", "healthy" or "unhealthy".
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "FailingStreak")]
    pub failing_streak: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "Domainname", alias = "DomainName")]
    pub domain_name: Option<String>,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "AttachStdin")]
    pub attach_stdin: bool,
    #[serde(rename = "AttachStdout")]
    pub attach_stdout: bool,
    #[serde(rename = "AttachStderr")]
    pub attach_stderr: bool,
    #[serde(rename = "ExposedPorts")]
    pub exposed_ports: Option<HashMap<String, HashMap<String, String>>>,
    #[serde(rename = "Tty")]
    pub tty: bool,
    #[serde(rename = "OpenStdin")]
    pub open_stdin: bool,
    #[serde(rename = "StdinOnce")]
    pub stdin_once: bool,
    #[serde(rename = "Env")]
    pub env: Option<Vec<String>>,
    #[serde(rename = "Cmd")]
    pub cmd: Option<Vec<String>>,
    #[serde(rename = "Healthcheck", alias = "HealthCheck")]
    pub health_check: Option<HealthConfig>,
    #[serde(rename = "ArgsEscaped")]
    pub args_escaped: Option<bool>,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Volumes")]
    pub volumes: Option<HashMap<String, HashMap<String, String>>>,
    #[serde(rename = "WorkingDir")]
    pub working_dir: String,
    #[serde(rename = "Entrypoint")]
    pub entrypoint: Option<Vec<String>>,
    #[serde(rename = "NetworkDisabled")]
    pub network_disabled: Option<bool>,
    #[serde(rename = "MacAddress")]
    pub mac_address: Option<String>,
    #[serde(rename = "OnBuild")]
    pub on_build: Option<Vec<String>>,
    #[serde(rename = "Labels")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(rename = "StopSignal")]
    pub stop_signal: Option<String>,
    #[serde(rename = "StopTimeout")]
    pub stop_timeout: Option<i64>,
    #[serde(rename = "Shell")]
    pub shell: Option<Vec<String>>,
}

/// Health check definition; durations are nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(rename = "Test")]
    pub test: Vec<String>,
    #[serde(rename = "Interval")]
    pub interval: Option<i64>,
    #[serde(rename = "Timeout")]
    pub timeout: Option<i64>,
    #[serde(rename = "Retries")]
    pub retries: Option<i64>,
    #[serde(rename = "StartPeriod")]
    pub start_period: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDriver {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Data")]
    pub data: Option<GraphDriverData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDriverData {
    #[serde(rename = "LowerDir")]
    pub lower_dir: Option<String>,
    #[serde(rename = "MergedDir")]
    pub merged_dir: Option<String>,
    #[serde(rename = "UpperDir")]
    pub upper_dir: Option<String>,
    #[serde(rename = "WorkDir")]
    pub work_dir: Option<String>,
}

/// Subset of the engine's HostConfig that the client displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(rename = "AutoRemove")]
    pub auto_remove: Option<bool>,
    #[serde(rename = "Binds")]
    pub binds: Option<Vec<String>>,
    #[serde(rename = "NetworkMode")]
    pub network_mode: Option<String>,
    #[serde(rename = "Privileged")]
    pub privileged: Option<bool>,
    #[serde(rename = "PublishAllPorts")]
    pub publish_all_ports: Option<bool>,
    #[serde(rename = "ReadonlyRootfs")]
    pub readonly_rootfs: Option<bool>,
    #[serde(rename = "RestartPolicy")]
    pub restart_policy: Option<RestartPolicy>,
    #[serde(rename = "Runtime")]
    pub runtime: Option<String>,
    #[serde(rename = "ShmSize")]
    pub shm_size: Option<i64>,
    #[serde(rename = "Memory")]
    pub memory: Option<i64>,
    #[serde(rename = "NanoCpus")]
    pub nano_cpus: Option<i64>,
    #[serde(rename = "CpuShares")]
    pub cpu_shares: Option<i64>,
    #[serde(rename = "PortBindings")]
    pub port_bindings: Option<HashMap<String, Option<Vec<super::PortBinding>>>>,
    #[serde(rename = "Mounts")]
    pub mounts: Option<Vec<Mount>>,
    #[serde(rename = "LogConfig")]
    pub log_config: Option<LogConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// "", "no", "always", "unless-stopped" or "on-failure".
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "MaximumRetryCount")]
    pub maximum_retry_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Config")]
    pub config: Option<HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container_with_labels(labels: &[(&str, &str)]) -> Container {
        Container {
            id: "abc".into(),
            names: Some(vec!["/web-1".into()]),
            image: None,
            image_id: None,
            command: None,
            created: None,
            ports: None,
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            state: Some(ContainerStatus::Running),
            status: None,
            network_settings: None,
            mounts: None,
        }
    }

    #[test]
    fn display_name_strips_leading_slash() {
        let c = container_with_labels(&[]);
        assert_eq!(c.display_name(), Some("web-1"));
    }

    #[test]
    fn stack_prefers_compose_project_label() {
        let c = container_with_labels(&[
            (STACK_NAMESPACE_LABEL, "swarm"),
            (COMPOSE_PROJECT_LABEL, "compose"),
        ]);
        assert_eq!(c.stack(), Some("compose"));
        let c = container_with_labels(&[(STACK_NAMESPACE_LABEL, "swarm")]);
        assert_eq!(c.stack(), Some("swarm"));
        let c = container_with_labels(&[("other", "x")]);
        assert_eq!(c.stack(), None);
    }

    #[test]
    fn execute_action_expected_states() {
        assert_eq!(ExecuteAction::Kill.expected_state(), ContainerStatus::Exited);
        assert_eq!(ExecuteAction::Unpause.expected_state(), ContainerStatus::Running);
        assert_eq!("pause".parse::<ExecuteAction>(), Ok(ExecuteAction::Pause));
        assert!("explode".parse::<ExecuteAction>().is_err());
    }

    #[test]
    fn status_from_str_round_trips_display() {
        for status in ContainerStatus::LIFECYCLE {
            assert_eq!(status.to_string().parse::<ContainerStatus>(), Ok(status));
        }
        assert_eq!(
            "zombie".parse::<ContainerStatus>(),
            Err(UnknownStatus("zombie".into()))
        );
    }

    #[test]
    fn lifecycle_index_matches_lifecycle_table() {
        for (index, status) in ContainerStatus::LIFECYCLE.into_iter().enumerate() {
            assert_eq!(status.lifecycle_index(), index);
            assert_eq!(status_rank(Some(status)), index as isize);
        }
        assert_eq!(status_rank(None), -1);
    }
}
