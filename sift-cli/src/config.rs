use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sift_search::{HttpBackend, MemoryBackend, SearchBackend, SearchSettings};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::state::{ensure_sift_home, resolve_in};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub profile: ProfileSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Todos loaded from a local JSON file.
    Memory,
    /// The todo server's REST API.
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub kind: BackendKind,
    /// JSON array of todos, relative to `~/.sift` unless absolute.
    pub data_file: String,
    pub base_url: String,
    /// Bearer token for `kind = "http"`.
    pub token: Option<String>,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            data_file: "todos.json".to_string(),
            base_url: "http://localhost:3000".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    /// IANA zone the current month is computed in.
    pub timezone: String,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl BackendSection {
    pub fn open(&self) -> Result<Arc<dyn SearchBackend>> {
        match self.kind {
            BackendKind::Memory => {
                let path = resolve_in(&ensure_sift_home()?, &self.data_file);
                if !path.exists() {
                    bail!(
                        "todo data not found: {} (set backend.data_file in {})",
                        path.display(),
                        config_path()?.display()
                    );
                }
                Ok(Arc::new(MemoryBackend::from_path(&path)?))
            }
            BackendKind::Http => Ok(Arc::new(HttpBackend::new(
                &self.base_url,
                self.token.as_deref(),
            )?)),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_sift_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = parse_config(
            r#"
            [search]
            live_delay_ms = 250

            [backend]
            kind = "http"
            token = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.search.live_delay_ms, 250);
        assert_eq!(cfg.search.preview_delay_ms, 200);
        assert_eq!(cfg.backend.kind, BackendKind::Http);
        assert_eq!(cfg.backend.base_url, "http://localhost:3000");
        assert_eq!(cfg.backend.token.as_deref(), Some("abc"));
        assert_eq!(cfg.profile.timezone, "UTC");
    }

    #[test]
    fn defaults_survive_a_write_and_read() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(s.contains("[search]"));
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }

    #[test]
    fn unknown_backend_kind_is_rejected() {
        assert!(parse_config("[backend]\nkind = \"sqlite\"").is_err());
    }
}
