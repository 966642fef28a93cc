// Portainer endpoint (environment) models and their snapshots

use serde::{Deserialize, Serialize};

pub type EndpointId = i64;

int_enum! {
    /// Reachability as last seen by Portainer.
    pub enum EndpointStatus {
        Up = 1,
        Down = 2,
    }
}

int_enum! {
    pub enum EndpointType {
        Docker = 1,
        Agent = 2,
        Azure = 3,
    }
}

/// Docker environment managed by Portainer (`GET /api/endpoints`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "Id")]
    pub id: EndpointId,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<EndpointStatus>,
    #[serde(rename = "Type")]
    pub kind: Option<EndpointType>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "PublicURL")]
    pub public_url: Option<String>,
    #[serde(rename = "GroupId")]
    pub group_id: Option<i64>,
    #[serde(rename = "Snapshots")]
    pub snapshots: Option<Vec<DockerSnapshot>>,
    #[serde(rename = "Kubernetes")]
    pub kubernetes: Option<KubernetesData>,
    #[serde(rename = "AzureCredentials")]
    pub azure_credentials: Option<AzureCredentials>,
    #[serde(rename = "TLSConfig")]
    pub tls_config: Option<TlsConfiguration>,
}

impl Endpoint {
    pub fn is_up(&self) -> bool {
        self.status == Some(EndpointStatus::Up)
    }

    /// Most recent Docker snapshot, by `Time`.
    pub fn latest_snapshot(&self) -> Option<&DockerSnapshot> {
        self.snapshots
            .as_ref()?
            .iter()
            .max_by_key(|s| s.time.unwrap_or_default())
    }
}

/// Periodic Docker statistics Portainer records per endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerSnapshot {
    #[serde(rename = "DockerVersion")]
    pub docker_version: Option<String>,
    #[serde(rename = "HealthyContainerCount")]
    pub healthy_container_count: Option<i64>,
    #[serde(rename = "ImageCount")]
    pub image_count: Option<i64>,
    #[serde(rename = "RunningContainerCount")]
    pub running_container_count: Option<i64>,
    #[serde(rename = "ServiceCount")]
    pub service_count: Option<i64>,
    #[serde(rename = "StackCount")]
    pub stack_count: Option<i64>,
    #[serde(rename = "StoppedContainerCount")]
    pub stopped_container_count: Option<i64>,
    #[serde(rename = "Swarm")]
    pub swarm: Option<bool>,
    #[serde(rename = "Time")]
    pub time: Option<i64>,
    #[serde(rename = "TotalCPU")]
    pub total_cpu: Option<i64>,
    #[serde(rename = "TotalMemory")]
    pub total_memory: Option<i64>,
    #[serde(rename = "UnhealthyContainerCount")]
    pub unhealthy_container_count: Option<i64>,
    #[serde(rename = "VolumeCount")]
    pub volume_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesData {
    #[serde(rename = "Configuration")]
    pub configuration: Option<KubernetesConfiguration>,
    #[serde(rename = "Snapshots")]
    pub snapshots: Option<Vec<KubernetesSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesConfiguration {
    #[serde(rename = "IngressClasses")]
    pub ingress_classes: Option<Vec<KubernetesIngressClassConfig>>,
    #[serde(rename = "StorageClasses")]
    pub storage_classes: Option<Vec<KubernetesStorageClassConfig>>,
    #[serde(rename = "UseLoadBalancer")]
    pub use_load_balancer: Option<bool>,
    #[serde(rename = "UseServerMetrics")]
    pub use_server_metrics: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesIngressClassConfig {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesStorageClassConfig {
    #[serde(rename = "AccessModes")]
    pub access_modes: Option<Vec<String>>,
    #[serde(rename = "AllowVolumeExpansion")]
    pub allow_volume_expansion: Option<bool>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Provisioner")]
    pub provisioner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesSnapshot {
    #[serde(rename = "KubernetesVersion")]
    pub kubernetes_version: Option<String>,
    #[serde(rename = "NodeCount")]
    pub node_count: Option<i64>,
    #[serde(rename = "Time")]
    pub time: Option<i64>,
    #[serde(rename = "TotalCPU")]
    pub total_cpu: Option<i64>,
    #[serde(rename = "TotalMemory")]
    pub total_memory: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureCredentials {
    #[serde(rename = "ApplicationID")]
    pub application_id: Option<String>,
    #[serde(rename = "AuthenticationKey")]
    pub authentication_key: Option<String>,
    #[serde(rename = "TenantID")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfiguration {
    #[serde(rename = "TLS")]
    pub tls: Option<bool>,
    #[serde(rename = "TLSCACert")]
    pub tls_ca_cert: Option<String>,
    #[serde(rename = "TLSCert")]
    pub tls_cert: Option<String>,
    #[serde(rename = "TLSKey")]
    pub tls_key: Option<String>,
    #[serde(rename = "TLSSkipVerify")]
    pub tls_skip_verify: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointExtension {
    #[serde(rename = "Type")]
    pub kind: Option<i64>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(rename = "RoleID")]
    pub role_id: Option<i64>,
}

/// Message of the day (`GET /api/motd`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motd {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Style")]
    pub style: Option<String>,
    #[serde(rename = "Hash")]
    pub hash: Option<String>,
}
