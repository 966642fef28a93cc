// Derives the user-facing stack and container lists from store contents plus
// view parameters. Pure functions; safe to call on every parameter change.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::models::{Container, EndpointId, Preferences, Stack};

/// One row of the stacks list: a real Portainer stack or a limited stack
/// inferred from container labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackItem {
    /// Stack id for real stacks, the stack name for limited ones.
    pub id: String,
    pub name: String,
    /// `None` for limited stacks.
    pub stack: Option<Stack>,
}

impl StackItem {
    pub fn limited(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            stack: None,
        }
    }

    pub fn is_limited(&self) -> bool {
        self.stack.is_none()
    }

    pub fn endpoint_id(&self) -> Option<EndpointId> {
        self.stack.as_ref().and_then(|s| s.endpoint_id)
    }
}

impl From<&Stack> for StackItem {
    fn from(stack: &Stack) -> Self {
        Self {
            id: stack.id.to_string(),
            name: stack.name.clone(),
            stack: Some(stack.clone()),
        }
    }
}

/// View parameters for [`visible_stacks`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFilter {
    pub query: String,
    pub include_limited_stacks: bool,
    pub filter_by_active_endpoint: bool,
    pub selected_endpoint_id: Option<EndpointId>,
}

impl StackFilter {
    pub fn new(
        query: impl Into<String>,
        preferences: &Preferences,
        selected_endpoint_id: Option<EndpointId>,
    ) -> Self {
        Self {
            query: query.into(),
            include_limited_stacks: preferences.include_limited_stacks,
            filter_by_active_endpoint: preferences.filter_by_active_endpoint,
            selected_endpoint_id,
        }
    }
}

/// Stacks list as shown to the user.
pub fn visible_stacks(
    stacks: &[Stack],
    containers: &[Container],
    filter: &StackFilter,
) -> Vec<StackItem> {
    let mut items: Vec<StackItem> = stacks.iter().map(StackItem::from).collect();

    if filter.include_limited_stacks {
        let real_names: HashSet<&str> = stacks.iter().map(|s| s.name.as_str()).collect();
        let limited: BTreeSet<&str> = containers
            .iter()
            .filter_map(Container::stack)
            .filter(|name| !real_names.contains(name))
            .collect();
        items.extend(limited.into_iter().map(StackItem::limited));
    }

    if filter.filter_by_active_endpoint
        && let Some(selected) = filter.selected_endpoint_id
    {
        // limited stacks come from containers already scoped to the selected endpoint
        items.retain(|item| item.endpoint_id().unwrap_or(selected) == selected);
    }

    if let Some(query) = normalized_query(&filter.query) {
        items.retain(|item| {
            contains_folded(&item.name, &query) || contains_folded(&item.id, &query)
        });
    }

    items.sort_by_cached_key(|item| {
        (item.name.to_lowercase(), item.name.clone(), item.id.clone())
    });
    items
}

/// Containers matching `query` by display name, id, image or stack, sorted by display name.
pub fn visible_containers(containers: &[Container], query: &str) -> Vec<Container> {
    let query = normalized_query(query);
    let mut visible: Vec<Container> = containers
        .iter()
        .filter(|c| match &query {
            None => true,
            Some(q) => [c.display_name(), Some(c.id.as_str()), c.image.as_deref(), c.stack()]
                .into_iter()
                .flatten()
                .any(|field| contains_folded(field, q)),
        })
        .cloned()
        .collect();
    visible.sort_by_cached_key(|c| {
        let name = c.display_name().unwrap_or_default();
        (name.to_lowercase(), name.to_string(), c.id.clone())
    });
    visible
}

/// Lowercased query, or `None` when it is blank.
fn normalized_query(query: &str) -> Option<String> {
    (!query.trim().is_empty()).then(|| query.to_lowercase())
}

fn contains_folded(haystack: &str, folded_query: &str) -> bool {
    haystack.to_lowercase().contains(folded_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(id: i64, name: &str, endpoint_id: Option<i64>) -> Stack {
        Stack {
            id,
            name: name.into(),
            kind: None,
            endpoint_id,
            status: None,
            entry_point: None,
            project_path: None,
        }
    }

    #[test]
    fn blank_query_keeps_everything() {
        let stacks = [stack(1, "web", None), stack(2, "db", None)];
        let filter = StackFilter {
            query: "   ".into(),
            ..Default::default()
        };
        let names: Vec<_> = visible_stacks(&stacks, &[], &filter)
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["db", "web"]);
    }

    #[test]
    fn query_matches_id_as_well_as_name() {
        let stacks = [stack(17, "web", None), stack(2, "db", None)];
        let filter = StackFilter {
            query: "17".into(),
            ..Default::default()
        };
        let items = visible_stacks(&stacks, &[], &filter);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "web");
    }

    #[test]
    fn sort_ignores_case() {
        let stacks = [
            stack(1, "beta", None),
            stack(2, "Alpha", None),
            stack(3, "gamma", None),
        ];
        let names: Vec<_> = visible_stacks(&stacks, &[], &StackFilter::default())
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["Alpha", "beta", "gamma"]);
    }
}
