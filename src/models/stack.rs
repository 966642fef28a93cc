// Portainer stack models

use serde::{Deserialize, Serialize};

use super::EndpointId;

pub type StackId = i64;

int_enum! {
    pub enum StackType {
        Swarm = 1,
        Compose = 2,
        Kubernetes = 3,
    }
}

int_enum! {
    pub enum StackStatus {
        Active = 1,
        Inactive = 2,
    }
}

/// Stack record known to Portainer (`GET /api/stacks`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(rename = "Id")]
    pub id: StackId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: Option<StackType>,
    #[serde(rename = "EndpointId")]
    pub endpoint_id: Option<EndpointId>,
    #[serde(rename = "Status")]
    pub status: Option<StackStatus>,
    #[serde(rename = "EntryPoint")]
    pub entry_point: Option<String>,
    #[serde(rename = "ProjectPath")]
    pub project_path: Option<String>,
}

impl Stack {
    pub fn is_active(&self) -> bool {
        self.status == Some(StackStatus::Active)
    }
}
