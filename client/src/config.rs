use serde::Deserialize;
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{PutfsError, Result};

pub const DEFAULT_API_URL: &str = "https://api.put.io/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the HTTP gateway.
///
/// Loaded from a JSON file (`PUTFS_CONFIG`, else `<config dir>/putfs/config.json`)
/// and then overridden by `PUTFS_API_URL`, `PUTFS_OAUTH_TOKEN` and
/// `PUTFS_TIMEOUT_SECS`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub oauth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            oauth_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("oauth_token", &self.oauth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, oauth_token: impl Into<String>) -> Self {
        ClientConfig {
            api_url: api_url.into(),
            oauth_token: Some(oauth_token.into()),
            ..Default::default()
        }
    }

    /// Config file, then environment, then validation.
    pub fn load() -> Result<Self> {
        let mut cfg = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        cfg.token()?;
        debug!(config = ?cfg, "loaded client config");
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .map_err(|e| PutfsError::Config(format!("reading {}: {}", path.display(), e)))?;
        serde_json::from_slice(&raw)
            .map_err(|e| PutfsError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PUTFS_API_URL") {
            self.api_url = url;
        }
        if let Some(token) = lookup("PUTFS_OAUTH_TOKEN") {
            self.oauth_token = Some(token);
        }
        if let Some(raw) = lookup("PUTFS_TIMEOUT_SECS") {
            self.timeout_secs = raw
                .parse()
                .map_err(|_| PutfsError::Config(format!("invalid PUTFS_TIMEOUT_SECS {:?}", raw)))?;
        }
        Ok(())
    }

    /// Base API url without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn token(&self) -> Result<&str> {
        match self.oauth_token.as_deref() {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(PutfsError::Config("no oauth token configured".into())),
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    env::var("PUTFS_CONFIG")
        .map(PathBuf::from)
        .ok()
        .or_else(|| dirs::config_dir().map(|d| d.join("putfs").join("config.json")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_values_fill_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"oauth_token": "abc"}"#).unwrap();

        let cfg = ClientConfig::from_file(&path).unwrap();

        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.token().unwrap(), "abc");
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            ClientConfig::from_file(&path),
            Err(PutfsError::Config(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("PUTFS_API_URL", "http://127.0.0.1:9000/v2/"),
            ("PUTFS_OAUTH_TOKEN", "from-env"),
            ("PUTFS_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let mut cfg = ClientConfig::new(DEFAULT_API_URL, "from-file");
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(cfg.api_base(), "http://127.0.0.1:9000/v2");
        assert_eq!(cfg.token().unwrap(), "from-env");
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut cfg = ClientConfig::default();
        let err = cfg
            .apply_overrides(|k| (k == "PUTFS_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, PutfsError::Config(_)));
    }

    #[test]
    fn missing_token_is_rejected_and_never_printed() {
        let cfg = ClientConfig::default();
        assert!(cfg.token().is_err());

        let cfg = ClientConfig::new(DEFAULT_API_URL, "secret-token");
        assert!(!format!("{:?}", cfg).contains("secret-token"));
    }
}
