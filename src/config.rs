//! Session configuration and native library location.

use crate::native::default_library_name;
use crate::types::{H2gisError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default H2 user.
pub const DEFAULT_USER: &str = "sa";

/// Settings needed to open a session.
///
/// Fields missing from a config file take their defaults; a missing
/// `lib_path` goes through [`resolve_library_path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path to the native shared library
    pub lib_path: PathBuf,
    /// Database user
    pub username: String,
    /// Database password
    pub password: String,
    /// Register spatial functions right after connecting
    pub load_spatial_functions: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lib_path: resolve_library_path(None),
            username: DEFAULT_USER.to_string(),
            password: String::new(),
            load_spatial_functions: false,
        }
    }
}

impl SessionConfig {
    /// Configuration from environment variables.
    ///
    /// Resolution:
    /// - library: see [`resolve_library_path`]
    /// - `H2GIS_USER`, else `sa`
    /// - `H2GIS_PASSWORD`, else empty
    pub fn from_env() -> Self {
        Self {
            lib_path: resolve_library_path(None),
            username: std::env::var("H2GIS_USER").unwrap_or_else(|_| DEFAULT_USER.to_string()),
            password: std::env::var("H2GIS_PASSWORD").unwrap_or_default(),
            load_spatial_functions: false,
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: SessionConfig = serde_json::from_str(&content).map_err(|e| {
            H2gisError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.lib_path = expand(&config.lib_path.to_string_lossy());
        Ok(config)
    }

    /// Override the library path (with `~` expansion).
    pub fn with_lib_path(mut self, lib_path: &str) -> Self {
        self.lib_path = expand(lib_path);
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }
}

/// Locate the native library.
///
/// Resolution order:
/// 1. `explicit`
/// 2. `H2GIS_LIB_PATH` environment variable
/// 3. `$H2GIS_HOME/lib/<name>`
/// 4. `./lib/<name>`
///
/// `<name>` is [`default_library_name`]; `~` is expanded throughout.
pub fn resolve_library_path(explicit: Option<&str>) -> PathBuf {
    resolve_from(
        explicit,
        std::env::var("H2GIS_LIB_PATH").ok(),
        std::env::var("H2GIS_HOME").ok(),
    )
}

fn resolve_from(explicit: Option<&str>, lib_env: Option<String>, home_env: Option<String>) -> PathBuf {
    if let Some(path) = explicit {
        return expand(path);
    }
    if let Some(path) = lib_env.filter(|p| !p.is_empty()) {
        return expand(&path);
    }

    let base = match home_env.filter(|p| !p.is_empty()) {
        Some(home) => expand(&home),
        None => PathBuf::from("."),
    };
    base.join("lib").join(default_library_name())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolution_order() {
        let lib = default_library_name();

        assert_eq!(
            resolve_from(Some("/opt/h2gis.so"), Some("/env/h2gis.so".into()), None),
            PathBuf::from("/opt/h2gis.so")
        );
        assert_eq!(
            resolve_from(None, Some("/env/h2gis.so".into()), Some("/home/h2".into())),
            PathBuf::from("/env/h2gis.so")
        );
        assert_eq!(
            resolve_from(None, None, Some("/home/h2".into())),
            PathBuf::from("/home/h2/lib").join(lib)
        );
        assert_eq!(resolve_from(None, Some(String::new()), None), PathBuf::from("./lib").join(lib));
    }

    #[test]
    fn test_tilde_expansion() {
        let path = resolve_from(Some("~/h2gis.so"), None, None);
        assert!(!path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_from_file_with_defaults() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("h2gis.json");
        fs::write(&file, r#"{"lib_path": "/opt/h2gis/h2gis.so", "password": "secret"}"#).unwrap();

        let config = SessionConfig::from_file(&file).unwrap();
        assert_eq!(config.lib_path, PathBuf::from("/opt/h2gis/h2gis.so"));
        assert_eq!(config.username, "sa");
        assert_eq!(config.password, "secret");
        assert!(!config.load_spatial_functions);
    }

    #[test]
    fn test_from_file_invalid() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("h2gis.json");
        fs::write(&file, "{ not json").unwrap();

        assert!(matches!(SessionConfig::from_file(&file), Err(H2gisError::Config(_))));
        assert!(matches!(
            SessionConfig::from_file(dir.path().join("missing.json")),
            Err(H2gisError::Io(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::default()
            .with_lib_path("/tmp/h2gis.so")
            .with_credentials("admin", "pw");
        assert_eq!(config.lib_path, PathBuf::from("/tmp/h2gis.so"));
        assert_eq!(config.username, "admin");
        assert_eq!(config.password, "pw");
    }
}
