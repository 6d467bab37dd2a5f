//! Target API and auth configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variables consulted when the config file omits credentials.
pub const ENV_CLIENT_ID: &str = "STEPCHECK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "STEPCHECK_CLIENT_SECRET";

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the API under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP client timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// HTTP headers merged into every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// OAuth token endpoint settings (optional; unauthenticated APIs omit it)
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

/// OAuth client-credentials settings for the token endpoint.
///
/// ```toml
/// [auth]
/// token_url = "https://tenant.example.auth0.com/oauth/token"
/// audience = "http://localhost:3000"
/// # client_id / client_secret fall back to
/// # STEPCHECK_CLIENT_ID / STEPCHECK_CLIENT_SECRET
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token endpoint URL
    pub token_url: String,

    /// OAuth client id (env fallback: `STEPCHECK_CLIENT_ID`)
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret (env fallback: `STEPCHECK_CLIENT_SECRET`)
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Token audience, usually the API base URL
    #[serde(default)]
    pub audience: Option<String>,

    /// Grant type sent to the token endpoint
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
}

fn default_grant_type() -> String {
    "client_credentials".to_string()
}

impl AuthConfig {
    /// Resolve the client id from config or environment.
    ///
    /// # Errors
    ///
    /// Returns error if neither the file nor the environment provides one.
    pub fn resolve_client_id(&self) -> Result<String, ConfigError> {
        self.client_id
            .clone()
            .or_else(|| std::env::var(ENV_CLIENT_ID).ok())
            .ok_or(ConfigError::MissingCredential(ENV_CLIENT_ID))
    }

    /// Resolve the client secret from config or environment.
    ///
    /// # Errors
    ///
    /// Returns error if neither the file nor the environment provides one.
    pub fn resolve_client_secret(&self) -> Result<String, ConfigError> {
        self.client_secret
            .clone()
            .or_else(|| std::env::var(ENV_CLIENT_SECRET).ok())
            .ok_or(ConfigError::MissingCredential(ENV_CLIENT_SECRET))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
            auth: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.stepcheck.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".stepcheck.toml", ".stepcheck.json", "stepcheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# stepcheck configuration

# API under test
base_url = "http://localhost:3000"

# HTTP client timeout in seconds
timeout_secs = 10

# Extra headers sent with every request
# [headers]
# X-Request-Source = "stepcheck"

# OAuth token endpoint (omit the whole section for unauthenticated APIs)
# [auth]
# token_url = "https://tenant.example.auth0.com/oauth/token"
# audience = "http://localhost:3000"
# grant_type = "client_credentials"
# client_id / client_secret are read from STEPCHECK_CLIENT_ID /
# STEPCHECK_CLIENT_SECRET when not set here
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Missing credential: set {0} or put it in the config file")]
    MissingCredential(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.auth.is_none());
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
base_url = "http://localhost:8080"

[headers]
X-Tenant = "acme"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.headers.get("X-Tenant"), Some(&"acme".to_string()));
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn parse_toml_with_auth() {
        let toml = r#"
base_url = "http://localhost:3000"

[auth]
token_url = "https://issuer.example.com/oauth/token"
client_id = "abc"
client_secret = "shh"
audience = "http://localhost:3000"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let auth = config.auth.unwrap();

        assert_eq!(auth.token_url, "https://issuer.example.com/oauth/token");
        assert_eq!(auth.grant_type, "client_credentials");
        assert_eq!(auth.resolve_client_id().unwrap(), "abc");
        assert_eq!(auth.resolve_client_secret().unwrap(), "shh");
    }

    #[test]
    fn missing_credentials_error_names_env_var() {
        let auth = AuthConfig {
            token_url: "https://issuer.example.com/oauth/token".into(),
            client_id: None,
            client_secret: None,
            audience: None,
            grant_type: default_grant_type(),
        };

        // Only assert the message when the env var is genuinely absent
        if std::env::var(ENV_CLIENT_ID).is_err() {
            let err = auth.resolve_client_id().unwrap_err();
            assert!(err.to_string().contains(ENV_CLIENT_ID));
        }
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stepcheck.toml");
        std::fs::write(&path, "base_url = \"http://api.test:9000\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "http://api.test:9000");
    }

    #[test]
    fn load_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://api.test:9001"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "http://api.test:9001");
    }

    #[test]
    fn example_config_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
    }
}
