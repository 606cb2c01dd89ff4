//! Configuration discovery and effective settings resolution.
//!
//! covlist reads `covlist.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags and environment overrides
//! into an `Effective` value constructed once per build and passed by
//! reference from there on. Defaults:
//! - `transport`: `https`
//! - `output`: `human`
//! - `traceability.item_id_regex`: `([A-Z_]+-[A-Z0-9_]+)` (empty string
//!   disables traceability cross-references)
//!
//! Overrides precedence: CLI > environment > config file > defaults.
//! `COVLIST_USERNAME` and `COVLIST_PASSWORD` override the file credentials
//! so secrets can stay out of the checked-in config.

use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ITEM_ID_REGEX: &str = r"([A-Z_]+-[A-Z0-9_]+)";

#[derive(Debug, Default, Deserialize, Clone)]
/// Server credentials under `[credentials]`.
pub struct CredentialsCfg {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub stream: Option<String>,
    pub port: Option<u16>,
    pub transport: Option<String>,
    pub snapshot: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Traceability cross-reference settings under `[traceability]`.
pub struct TraceabilityCfg {
    pub item_id_regex: Option<String>,
    #[serde(default)]
    pub relink: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `covlist.toml|yaml`.
pub struct CovlistConfig {
    pub output: Option<String>,
    #[serde(default)]
    pub credentials: Option<CredentialsCfg>,
    #[serde(default)]
    pub traceability: Option<TraceabilityCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub transport: String,
    pub port: Option<u16>,
    pub stream: String,
    pub snapshot: Option<String>,
    pub output: String,
    /// Compiled traceability identifier pattern; `None` when disabled.
    pub id_pattern: Option<Regex>,
    pub relink: HashMap<String, String>,
}

impl Effective {
    /// Server base URL, e.g. `https://cov.example.com:8443`.
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.transport, self.hostname, port),
            None => format!("{}://{}", self.transport, self.hostname),
        }
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `covlist.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("covlist.toml").exists()
            || cur.join("covlist.yaml").exists()
            || cur.join("covlist.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `CovlistConfig` from `covlist.toml` or `covlist.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<CovlistConfig> {
    let toml_path = root.join("covlist.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: CovlistConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["covlist.yaml", "covlist.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: CovlistConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, environment overrides,
/// discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_stream: Option<&str>,
    cli_snapshot: Option<&str>,
    cli_output: Option<&str>,
) -> Result<Effective, ConfigError> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();
    let creds = cfg.credentials.unwrap_or_default();

    let hostname = creds
        .hostname
        .filter(|h| !h.is_empty())
        .ok_or(ConfigError::MissingCredential("hostname"))?;

    let stream = cli_stream
        .map(str::to_string)
        .or(creds.stream)
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingCredential("stream"))?;

    let username = std::env::var("COVLIST_USERNAME")
        .ok()
        .or(creds.username)
        .unwrap_or_default();
    let password = std::env::var("COVLIST_PASSWORD")
        .ok()
        .or(creds.password)
        .unwrap_or_default();

    let transport = creds.transport.unwrap_or_else(|| "https".to_string());

    let snapshot = cli_snapshot
        .map(str::to_string)
        .or(creds.snapshot)
        .filter(|s| !s.is_empty());

    let output = cli_output
        .map(str::to_string)
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let trace = cfg.traceability.unwrap_or_default();
    let id_pattern = match trace.item_id_regex.as_deref() {
        Some("") => None,
        Some(raw) => Some(Regex::new(raw)?),
        None => Some(Regex::new(DEFAULT_ITEM_ID_REGEX)?),
    };
    let relink = trace.relink.unwrap_or_default();

    Ok(Effective {
        repo_root,
        hostname,
        username,
        password,
        transport,
        port: creds.port,
        stream,
        snapshot,
        output,
        id_pattern,
        relink,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("covlist.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
[credentials]
hostname = "cov.example.com"
username = "reporter"
password = "secret"
stream = "main"
port = 8443
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, None, None).unwrap();
        assert_eq!(eff.hostname, "cov.example.com");
        assert_eq!(eff.stream, "main");
        assert_eq!(eff.output, "json");
        assert_eq!(eff.base_url(), "https://cov.example.com:8443");
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("covlist.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
credentials:
  hostname: cov.example.com
  stream: main
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None).unwrap();
        assert_eq!(eff.transport, "https");
        assert_eq!(eff.output, "human");
        assert_eq!(eff.snapshot, None);
        assert_eq!(eff.base_url(), "https://cov.example.com");
        // Default traceability pattern is active when unconfigured
        assert!(eff.id_pattern.as_ref().unwrap().is_match("SWREQ-123"));
    }

    #[test]
    fn test_cli_overrides_stream_snapshot_and_output() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("covlist.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "human"
[credentials]
hostname = "cov.example.com"
stream = "main"
snapshot = "100"
            "#
        )
        .unwrap();

        let eff =
            resolve_effective(root.to_str(), Some("release"), Some("200"), Some("json")).unwrap();
        assert_eq!(eff.stream, "release");
        assert_eq!(eff.snapshot.as_deref(), Some("200"));
        assert_eq!(eff.output, "json");
    }

    #[test]
    fn test_missing_stream_is_config_error() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("covlist.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
[credentials]
hostname = "cov.example.com"
            "#
        )
        .unwrap();

        let err = resolve_effective(root.to_str(), None, None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("stream")));
    }

    #[test]
    fn test_empty_id_regex_disables_cross_references() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("covlist.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
[credentials]
hostname = "cov.example.com"
stream = "main"
[traceability]
item_id_regex = ""
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None).unwrap();
        assert!(eff.id_pattern.is_none());
    }

    #[test]
    fn test_relink_table_loaded() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("covlist.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
[credentials]
hostname = "cov.example.com"
stream = "main"
[traceability.relink]
SWREQ-123 = "SWREQ-200"
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None, None).unwrap();
        assert_eq!(
            eff.relink.get("SWREQ-123").map(String::as_str),
            Some("SWREQ-200")
        );
    }

    #[test]
    fn test_env_overrides_file_credentials() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("covlist.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
[credentials]
hostname = "cov.example.com"
stream = "main"
username = "from-file"
password = "from-file"
            "#
        )
        .unwrap();

        std::env::set_var("COVLIST_USERNAME", "from-env");
        let eff = resolve_effective(root.to_str(), None, None, None).unwrap();
        std::env::remove_var("COVLIST_USERNAME");
        assert_eq!(eff.username, "from-env");
        assert_eq!(eff.password, "from-file");
    }
}
