// ============================================================================
// ClientConfig - API base URL and local state location
// ============================================================================
// Resolution order: explicit override, then environment (AGRI_API_URL,
// AGRI_STATE_PATH, AGRI_USER_AGENT), then defaults. Binaries load `.env`
// through dotenvy before calling `from_env`.
// ============================================================================

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_USER_AGENT: &str = "agrichain-client/1.0";

pub const ENV_API_URL: &str = "AGRI_API_URL";
pub const ENV_STATE_PATH: &str = "AGRI_STATE_PATH";
pub const ENV_USER_AGENT: &str = "AGRI_USER_AGENT";

/// Connection settings shared by every API call
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:8000/api`
    pub api_base_url: String,
    /// Token store file; `None` means `~/.agrichain/session.redb`
    pub state_path: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            state_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = normalize_base_url(&url)?;
        }
        if let Some(path) = lookup(ENV_STATE_PATH).filter(|v| !v.trim().is_empty()) {
            config.state_path = Some(PathBuf::from(path));
        }
        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = agent;
        }

        Ok(config)
    }

    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(mut self, api_url: Option<&str>, state_path: Option<&str>) -> Result<Self> {
        if let Some(url) = api_url {
            self.api_base_url = normalize_base_url(url)?;
        }
        if let Some(path) = state_path {
            self.state_path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    /// Absolute URL for an API path such as `/crop-batches/`
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }

    /// Token store location, creating `~/.agrichain` when defaulted
    pub fn resolve_state_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state_path {
            return Ok(path.clone());
        }

        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        let state_dir = home.join(".agrichain");
        std::fs::create_dir_all(&state_dir)
            .map_err(|e| anyhow!("Failed to create .agrichain directory: {}", e))?;
        Ok(state_dir.join("session.redb"))
    }
}

/// Validate an http(s) base URL and strip the trailing slash
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| anyhow!("Invalid API URL '{}': {}", trimmed, e))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(anyhow!("Unsupported API URL scheme '{}'", other)),
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert!(config.state_path.is_none());
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_env_values() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://agri.example.com/api/"),
            (ENV_STATE_PATH, "/tmp/agri.redb"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://agri.example.com/api");
        assert_eq!(config.state_path, Some(PathBuf::from("/tmp/agri.redb")));
    }

    #[test]
    fn test_overrides_win() {
        let config = ClientConfig::from_lookup(lookup_from(&[(ENV_API_URL, "http://env/api")]))
            .unwrap()
            .with_overrides(Some("http://flag:9000/api"), None)
            .unwrap();
        assert_eq!(config.api_base_url, "http://flag:9000/api");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("ftp://example.com/api").is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint("/auth/login/"), "http://localhost:8000/api/auth/login/");
        assert_eq!(config.endpoint("crop-batches/"), "http://localhost:8000/api/crop-batches/");
    }
}
