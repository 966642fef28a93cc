// Library for the binary and tests

pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod portainer_repo;
pub mod preferences_repo;
pub mod refresh;
pub mod stacks_query;
pub mod stacks_view;
pub mod store;
pub mod version;
