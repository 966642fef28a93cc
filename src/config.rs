use serde::Deserialize;

use crate::decode::ListPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub portainer: PortainerConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
    #[serde(default)]
    pub decoding: DecodingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortainerConfig {
    /// Server base URL, e.g. `https://portainer.local:9443`.
    pub url: String,
    /// Access token sent as `X-API-Key`. May also come from `HARBOUR_API_KEY`.
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Accept self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> String {
    "data/preferences.db".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodingConfig {
    /// What to do with list elements that fail to decode.
    #[serde(default)]
    pub list_policy: ListPolicy,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let url = self.portainer.url.trim();
        anyhow::ensure!(!url.is_empty(), "portainer.url must be non-empty");
        anyhow::ensure!(
            url.starts_with("http://") || url.starts_with("https://"),
            "portainer.url must start with http:// or https://, got {}",
            url
        );
        anyhow::ensure!(
            self.portainer
                .api_key
                .as_deref()
                .is_none_or(|key| !key.trim().is_empty()),
            "portainer.api_key must be non-empty when set"
        );
        anyhow::ensure!(
            self.portainer.timeout_secs > 0,
            "portainer.timeout_secs must be > 0, got {}",
            self.portainer.timeout_secs
        );
        anyhow::ensure!(
            self.portainer.connect_timeout_secs > 0,
            "portainer.connect_timeout_secs must be > 0, got {}",
            self.portainer.connect_timeout_secs
        );
        anyhow::ensure!(
            !self.preferences.path.is_empty(),
            "preferences.path must be non-empty"
        );
        Ok(())
    }
}
