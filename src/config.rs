//! TOML configuration.
//!
//! ```toml
//! [catalog]
//! fetch_timeout_secs = 10
//!
//! [[catalog.sources]]
//! name = "pens"
//! path = "data/pens.json"
//! label = "Dyna Metal Pen Catalog"
//!
//! [[catalog.sources]]
//! name = "remote"
//! url = "https://example.com/products.json"
//!
//! [search]
//! max_results = 10
//! debounce_ms = 300
//!
//! [branding]
//! house_brand = "Shivaya Solutions"
//! replace = ["Saran Enterprises", "ABC Exports"]
//!
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [contact]
//! endpoint = "https://formsubmit.co/ajax/sales@example.com"
//! ```
//!
//! Relative source paths are resolved against the directory holding the
//! config file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub branding: BrandingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub contact: Option<ContactConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

/// One catalog source. Exactly one of `path`, `url` and `dir` is set.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Extra text fed to category inference for every record of this source.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

/// Where a source's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    File(PathBuf),
    Url(String),
    Dir(PathBuf),
}

impl SourceConfig {
    /// The single configured location. `load_config` guarantees one exists.
    pub fn location(&self) -> Option<SourceLocation> {
        match (&self.path, &self.url, &self.dir) {
            (Some(p), None, None) => Some(SourceLocation::File(p.clone())),
            (None, Some(u), None) => Some(SourceLocation::Url(u.clone())),
            (None, None, Some(d)) => Some(SourceLocation::Dir(d.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_max_results() -> usize {
    10
}
fn default_debounce_ms() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrandingConfig {
    #[serde(default = "default_house_brand")]
    pub house_brand: String,
    #[serde(default)]
    pub replace: Vec<String>,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            house_brand: default_house_brand(),
            replace: Vec::new(),
        }
    }
}

fn default_house_brand() -> String {
    "Shivaya Solutions".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactConfig {
    pub endpoint: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_contact_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_subject() -> String {
    "New Contact Form Submission - Shivaya Solutions".to_string()
}
fn default_contact_timeout_secs() -> u64 {
    15
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for source in &mut config.catalog.sources {
        for local in [&mut source.path, &mut source.dir].into_iter().flatten() {
            if local.is_relative() {
                *local = base.join(&*local);
            }
        }
    }

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.catalog.sources.is_empty() {
        anyhow::bail!("catalog.sources must list at least one source");
    }

    let mut names = HashSet::new();
    for source in &config.catalog.sources {
        if source.name.trim().is_empty() {
            anyhow::bail!("catalog source names must not be empty");
        }
        if !names.insert(source.name.as_str()) {
            anyhow::bail!("duplicate catalog source name: '{}'", source.name);
        }
        if source.location().is_none() {
            anyhow::bail!(
                "catalog source '{}' must set exactly one of path, url, or dir",
                source.name
            );
        }
        if let Some(url) = &source.url {
            if !is_http(url) {
                anyhow::bail!("catalog source '{}' url must be http(s): {}", source.name, url);
            }
        }
    }

    if config.search.max_results < 1 {
        anyhow::bail!("search.max_results must be >= 1");
    }

    if let Some(contact) = &config.contact {
        if !is_http(&contact.endpoint) {
            anyhow::bail!("contact.endpoint must be an http(s) URL");
        }
    }

    Ok(())
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("shivaya.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_and_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
[[catalog.sources]]
name = "pens"
path = "data/pens.json"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.catalog.fetch_timeout_secs, 10);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.debounce(), Duration::from_millis(300));
        assert_eq!(config.branding.house_brand, "Shivaya Solutions");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.contact.is_none());
        assert_eq!(
            config.catalog.sources[0].location(),
            Some(SourceLocation::File(dir.path().join("data/pens.json")))
        );
    }

    #[test]
    fn test_rejects_no_sources() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[catalog]\nfetch_timeout_secs = 5\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("at least one source"));
    }

    #[test]
    fn test_rejects_ambiguous_location() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
[[catalog.sources]]
name = "both"
path = "a.json"
url = "https://example.com/a.json"
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("exactly one of"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
[[catalog.sources]]
name = "pens"
path = "a.json"

[[catalog.sources]]
name = "pens"
dir = "more"
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_zero_max_results() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
[[catalog.sources]]
name = "pens"
path = "a.json"

[search]
max_results = 0
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn test_contact_endpoint_must_be_http() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            r#"
[[catalog.sources]]
name = "pens"
path = "a.json"

[contact]
endpoint = "mailto:sales@example.com"
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("contact.endpoint"));
    }
}
