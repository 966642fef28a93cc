// App-local preferences (persisted by PreferencesRepo; never fleet data)

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Show stacks inferred from container labels that Portainer has no record of.
    pub include_limited_stacks: bool,
    /// Only show stacks deployed on the selected endpoint.
    pub filter_by_active_endpoint: bool,
    pub selected_endpoint_id: Option<i64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            include_limited_stacks: true,
            filter_by_active_endpoint: true,
            selected_endpoint_id: None,
        }
    }
}
