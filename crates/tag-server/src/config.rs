//! Configuration loading and parsing.
//!
//! Defines the server config schema and resolves defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level server configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Bind address (host:port).
    pub bind: Option<String>,
    /// Media library root directory.
    pub media_dir: Option<String>,
    /// Optional full path to metadata SQLite DB file.
    pub metadata_db_path: Option<String>,
    /// Extensions whose tags are served read-only (e.g. `["mp3"]`).
    pub read_only_formats: Option<Vec<String>>,
}

impl ServerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<ServerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Load `config.toml` next to the executable, or defaults if absent.
    pub fn load_beside_exe() -> Result<Self> {
        let auto_path = std::env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(|dir| dir.join("config.toml")));
        match auto_path {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                tracing::info!("no config file found; using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Extract the media directory from config.
pub fn media_dir_from_config(cfg: &ServerConfig) -> Result<PathBuf> {
    let dir = cfg
        .media_dir
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .ok_or_else(|| anyhow::anyhow!("media_dir is required; use --media-dir or config"))?;
    Ok(PathBuf::from(dir))
}

/// Extract the optional metadata DB path from config.
pub fn metadata_db_path_from_config(cfg: &ServerConfig) -> Option<PathBuf> {
    cfg.metadata_db_path.as_deref().and_then(|path| {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}

/// Parse an optional bind address from config.
pub fn bind_from_config(cfg: &ServerConfig) -> Result<Option<SocketAddr>> {
    let Some(bind) = cfg.bind.as_deref() else {
        return Ok(None);
    };
    let addr = bind.parse().with_context(|| format!("parse bind {bind}"))?;
    Ok(Some(addr))
}

/// Read-only format extensions, lowercased with blanks dropped.
pub fn read_only_formats_from_config(cfg: &ServerConfig) -> Vec<String> {
    cfg.read_only_formats
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
