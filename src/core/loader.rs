//! Bookmark resource loader.
//!
//! Resources come from a fixed, explicitly enumerated list of names resolved
//! against a base location (an HTTP(S) URL or a local directory); there is no
//! discovery. Every resource is requested concurrently and the batch joins on
//! all outcomes. One failing resource never prevents the others from
//! contributing; the load only fails when nothing could be read.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use url::Url;

use super::models::BookmarkFile;

// ============================================================================
// Error Types
// ============================================================================

/// Why a single resource could not contribute.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bookmark JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot resolve '{name}' against base '{base}'")]
    InvalidLocation { base: String, name: String },
}

/// Failure of the whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No bookmark data available: all {} source(s) failed to load", failures.len())]
    NoData { failures: Vec<FetchFailure> },
}

/// A resource that failed, with the reason.
#[derive(Debug)]
pub struct FetchFailure {
    pub name: String,
    pub error: FetchError,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

// ============================================================================
// Resource location
// ============================================================================

/// Where the configured resource names live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBase {
    Http(Url),
    Dir(PathBuf),
}

/// A fully resolved resource location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Http(Url),
    File(PathBuf),
}

impl SourceBase {
    /// Interpret a configured base: `http(s)://` strings are URLs, anything
    /// else is a filesystem directory.
    pub fn parse(base: &str) -> Self {
        match Url::parse(base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                // Url::join replaces the last segment unless the path ends in '/'.
                let url = if url.path().ends_with('/') {
                    url
                } else {
                    let mut url = url;
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                    url
                };
                Self::Http(url)
            }
            _ => Self::Dir(PathBuf::from(base)),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Location, FetchError> {
        match self {
            Self::Http(base) => base
                .join(name)
                .map(Location::Http)
                .map_err(|_| FetchError::InvalidLocation {
                    base: base.to_string(),
                    name: name.to_string(),
                }),
            Self::Dir(dir) => Ok(Location::File(dir.join(name))),
        }
    }
}

impl fmt::Display for SourceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::Dir(dir) => write!(f, "{}", dir.display()),
        }
    }
}

// ============================================================================
// Loading indicator
// ============================================================================

/// Shared "load in progress" indicator, observed by the UI.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raise the flag until the returned guard is dropped.
    pub fn begin(&self) -> LoadingGuard {
        self.0.store(true, Ordering::SeqCst);
        LoadingGuard(self.0.clone())
    }
}

/// Lowers the loading flag on every exit path.
#[must_use = "the loading flag is lowered as soon as the guard is dropped"]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Loader
// ============================================================================

/// A successfully read resource.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub file: BookmarkFile,
}

/// Outcome of a load that produced at least one resource.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Loaded resources in configured order.
    pub loaded: Vec<LoadedFile>,
    /// Failed resources in configured order.
    pub failures: Vec<FetchFailure>,
}

impl LoadReport {
    pub fn item_count(&self) -> usize {
        self.loaded.iter().map(|f| f.file.items.len()).sum()
    }
}

pub struct Loader {
    client: reqwest::Client,
    base: SourceBase,
    files: Vec<String>,
}

impl Loader {
    pub fn new(base: SourceBase, files: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
            files,
        }
    }

    /// Build a loader from the `[sources]` config section.
    pub fn from_config(config: &crate::config::SourcesConfig) -> Self {
        Self::new(SourceBase::parse(&config.base), config.files.clone())
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base(&self) -> &SourceBase {
        &self.base
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Fetch every configured resource concurrently and join on all outcomes.
    ///
    /// `indicator` is raised for the duration of the call and always lowered
    /// before returning.
    pub async fn load_all(&self, indicator: &LoadingFlag) -> Result<LoadReport, LoadError> {
        self.load_with(indicator.begin()).await
    }

    /// Like [`Loader::load_all`], for callers that raised the indicator
    /// themselves, e.g. before spawning the load. The guard is dropped, and
    /// the indicator lowered, before this returns.
    pub async fn load_with(&self, loading: LoadingGuard) -> Result<LoadReport, LoadError> {
        log::info!(
            "Loading {} bookmark source(s) from {}",
            self.files.len(),
            self.base
        );

        let outcomes = join_all(self.files.iter().map(|name| async move {
            (name.clone(), self.fetch_one(name).await)
        }))
        .await;

        drop(loading);

        let mut report = LoadReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(file) => {
                    log::debug!("Loaded {name} ({} items)", file.items.len());
                    report.loaded.push(LoadedFile { name, file });
                }
                Err(error) => {
                    log::warn!("Failed to load {name}: {error}");
                    report.failures.push(FetchFailure { name, error });
                }
            }
        }

        if report.loaded.is_empty() {
            log::error!("No bookmark sources could be loaded");
            return Err(LoadError::NoData {
                failures: report.failures,
            });
        }

        log::info!(
            "Loaded {} item(s) from {} source(s), {} failed",
            report.item_count(),
            report.loaded.len(),
            report.failures.len()
        );
        Ok(report)
    }

    async fn fetch_one(&self, name: &str) -> Result<BookmarkFile, FetchError> {
        let bytes = match self.base.resolve(name)? {
            Location::Http(url) => {
                let response = self.client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                response.bytes().await?.to_vec()
            }
            Location::File(path) => tokio::fs::read(&path).await?,
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
