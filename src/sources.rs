//! Catalog sources: where product JSON comes from.
//!
//! Every configured `[[catalog.sources]]` entry becomes one
//! [`SourceFetcher`]. A fetcher returns raw documents; parsing and
//! normalization happen in [`crate::loader`].
//!
//! | Kind | Config key | Documents |
//! |------|------------|-----------|
//! | `file` | `path` | the file |
//! | `dir` | `dir` | every file under the directory matching `include_globs`, sorted by relative path |
//! | `http` | `url` | the response body of a GET; non-2xx is a failure |

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::config::{Config, SourceConfig, SourceLocation};

/// One raw document produced by a source.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// File path or URL, for logs and reports.
    pub origin: String,
    /// Document text, or why it could not be read. An unreadable document
    /// contributes nothing without failing the rest of its source.
    pub body: std::result::Result<String, String>,
}

impl FetchedDocument {
    pub fn new(origin: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            body: Ok(body.into()),
        }
    }

    pub fn unreadable(origin: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            origin: origin.into(),
            body: Err(error.to_string()),
        }
    }
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Configured source name.
    fn name(&self) -> &str;

    /// `file`, `dir`, `http`, or a custom kind.
    fn kind(&self) -> &str;

    fn location(&self) -> String;

    /// Classification hint applied to every record of this source.
    fn label(&self) -> Option<&str> {
        None
    }

    async fn fetch(&self) -> Result<Vec<FetchedDocument>>;
}

pub struct FileSource {
    name: String,
    path: PathBuf,
    label: Option<String>,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, label: Option<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            label,
        }
    }
}

#[async_trait]
impl SourceFetcher for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "file"
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    async fn fetch(&self) -> Result<Vec<FetchedDocument>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(vec![FetchedDocument::new(self.location(), body)])
    }
}

pub struct DirSource {
    name: String,
    root: PathBuf,
    include_globs: Vec<String>,
    label: Option<String>,
}

impl DirSource {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        include_globs: Vec<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            include_globs,
            label,
        }
    }
}

#[async_trait]
impl SourceFetcher for DirSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "dir"
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    async fn fetch(&self) -> Result<Vec<FetchedDocument>> {
        let root = self.root.clone();
        let globs = self.include_globs.clone();
        let files = tokio::task::spawn_blocking(move || scan_dir(&root, &globs)).await??;

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let origin = path.display().to_string();
            let document = match tokio::fs::read_to_string(&path).await {
                Ok(body) => FetchedDocument::new(origin, body),
                Err(e) => FetchedDocument::unreadable(origin, e),
            };
            documents.push(document);
        }
        Ok(documents)
    }
}

/// Files under `root` matching `include_globs`, sorted by relative path.
pub fn scan_dir(root: &Path, include_globs: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Source directory does not exist: {}", root.display());
    }
    let include_set = build_globset(include_globs)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();
        if include_set.is_match(&rel_str) {
            files.push((rel_str, path.to_path_buf()));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

pub struct HttpSource {
    name: String,
    url: String,
    label: Option<String>,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        label: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            name: name.into(),
            url: url.into(),
            label,
            client,
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "http"
    }

    fn location(&self) -> String {
        self.url.clone()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    async fn fetch(&self) -> Result<Vec<FetchedDocument>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned HTTP {}", self.url, status.as_u16());
        }
        let body = response.text().await?;
        Ok(vec![FetchedDocument::new(&self.url, body)])
    }
}

/// Builds one fetcher per configured source, in config order.
pub fn build_fetchers(config: &Config) -> Result<Vec<Box<dyn SourceFetcher>>> {
    let timeout = Duration::from_secs(config.catalog.fetch_timeout_secs);
    config
        .catalog
        .sources
        .iter()
        .map(|source| build_fetcher(source, timeout))
        .collect()
}

fn build_fetcher(source: &SourceConfig, timeout: Duration) -> Result<Box<dyn SourceFetcher>> {
    let label = source.label.clone();
    let fetcher: Box<dyn SourceFetcher> = match source.location() {
        Some(SourceLocation::File(path)) => Box::new(FileSource::new(&source.name, path, label)),
        Some(SourceLocation::Dir(root)) => Box::new(DirSource::new(
            &source.name,
            root,
            source.include_globs.clone(),
            label,
        )),
        Some(SourceLocation::Url(url)) => {
            Box::new(HttpSource::new(&source.name, url, label, timeout)?)
        }
        None => bail!(
            "catalog source '{}' must set exactly one of path, url, or dir",
            source.name
        ),
    };
    Ok(fetcher)
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<16} {:<6} {:<10} LOCATION", "SOURCE", "KIND", "STATUS");
    for source in &config.catalog.sources {
        let (kind, status, location) = match source.location() {
            Some(SourceLocation::File(path)) => {
                let status = if path.is_file() { "OK" } else { "MISSING" };
                ("file", status, path.display().to_string())
            }
            Some(SourceLocation::Dir(root)) => {
                let status = match scan_dir(&root, &source.include_globs) {
                    Ok(files) if files.is_empty() => "EMPTY",
                    Ok(_) => "OK",
                    Err(_) => "MISSING",
                };
                ("dir", status, root.display().to_string())
            }
            Some(SourceLocation::Url(url)) => ("http", "REMOTE", url),
            None => ("?", "INVALID", String::new()),
        };
        println!("{:<16} {:<6} {:<10} {}", source.name, kind, status, location);
    }
    Ok(())
}
