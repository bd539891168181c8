use thiserror::Error;

use crate::core::manifest::Manifest;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("package not found: {0}")]
    NotFound(String),
    #[error("cannot resolve {name}: {reason}")]
    Unresolvable { name: String, reason: String },
    #[error("GET {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait ManifestSource {
    /// Resolves a package name (and optional version specifier) to its manifest.
    fn resolve(&self, name: &str, specifier: Option<&str>) -> Result<Manifest, SourceError>;

    /// Resolves the package a build starts from. Defaults to `resolve`;
    /// sources that are lenient about dependency names can be stricter here.
    fn resolve_root(&self, name: &str, specifier: Option<&str>) -> Result<Manifest, SourceError> {
        self.resolve(name, specifier)
    }
}

impl<S: ManifestSource + ?Sized> ManifestSource for &S {
    fn resolve(&self, name: &str, specifier: Option<&str>) -> Result<Manifest, SourceError> {
        (**self).resolve(name, specifier)
    }

    fn resolve_root(&self, name: &str, specifier: Option<&str>) -> Result<Manifest, SourceError> {
        (**self).resolve_root(name, specifier)
    }
}
