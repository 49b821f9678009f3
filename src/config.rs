use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Server settings.  Every field has a default, so running without a
/// settings file listens on `127.0.0.1:5000` and stores projects in
/// `git_config.json` in the working directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub git: GitConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address for the HTTP listener (e.g. `127.0.0.1:5000`).
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}

// ---------------------------------------------------------------------------
// Project store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding the saved projects.  Relative paths resolve against
    /// the process working directory.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "git_config.json".to_string()
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GitConfig {
    /// Program used for every git invocation.
    #[serde(default = "default_git_binary")]
    pub binary: String,
    /// Remote that gets created on fresh repositories and pushed to.
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Branch name forced with `git branch -M` before pushing.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Upper bound (seconds) on a single git command, including the push.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
            remote: default_remote(),
            branch: default_branch(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

fn default_git_binary() -> String {
    "git".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_command_timeout() -> u64 {
    300
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load and validate a [`Config`] from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config = parse_config(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

fn parse_config(contents: &str) -> Result<Config> {
    // An empty YAML document deserialises to `null`, not an empty mapping.
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .with_context(|| format!("invalid listen address: {}", self.server.listen))
    }
}

/// Basic sanity checks that cannot be expressed purely with serde.
pub fn validate_config(config: &Config) -> Result<()> {
    config.listen_addr()?;
    anyhow::ensure!(!config.store.path.trim().is_empty(), "store.path must not be empty");
    anyhow::ensure!(!config.git.binary.trim().is_empty(), "git.binary must not be empty");
    anyhow::ensure!(!config.git.remote.trim().is_empty(), "git.remote must not be empty");
    anyhow::ensure!(!config.git.branch.trim().is_empty(), "git.branch must not be empty");
    anyhow::ensure!(
        config.git.command_timeout_secs > 0,
        "git.command_timeout_secs must be greater than 0"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standalone_behaviour() {
        let config = Config::default();
        assert_eq!(config.server.listen, "127.0.0.1:5000");
        assert_eq!(config.store.path, "git_config.json");
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.git.branch, "main");
        validate_config(&config).unwrap();
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("  \n").unwrap();
        assert_eq!(config.git.binary, "git");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            "server:\n  listen: \"0.0.0.0:8080\"\ngit:\n  command_timeout_secs: 30\n",
        )
        .unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.git.command_timeout_secs, 30);
        assert_eq!(config.git.branch, "main");
        assert_eq!(config.store.path, "git_config.json");
    }

    #[test]
    fn rejects_bad_listen_address() {
        let config = parse_config("server:\n  listen: \"not an address\"\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = parse_config("git:\n  command_timeout_secs: 0\n").unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("command_timeout_secs"));
    }

    #[test]
    fn load_config_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pushdeck.yaml");
        std::fs::write(&path, "store:\n  path: /var/lib/pushdeck/projects.json\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.store.path, "/var/lib/pushdeck/projects.json");
    }

    #[test]
    fn load_config_missing_file_is_an_error() {
        let err = load_config("/nonexistent/pushdeck.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
