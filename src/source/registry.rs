use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::manifest::{Dependency, Manifest};
use crate::source::http::JsonFetcher;
use crate::source::traits::{ManifestSource, SourceError};

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// npm-style registry: `{registry}/{name}` returns the package metadata
/// document with `versions` and `dist-tags`.
///
/// Metadata documents are cached per package name for the lifetime of the
/// source, so a build never downloads the same document twice.
pub struct RegistrySource<F> {
    fetcher: F,
    registry: String,
    metadata: RefCell<HashMap<String, Value>>,
}

impl<F: JsonFetcher> RegistrySource<F> {
    pub fn new(fetcher: F, registry: impl Into<String>) -> Self {
        Self {
            fetcher,
            registry: registry.into().trim_end_matches('/').to_string(),
            metadata: RefCell::new(HashMap::new()),
        }
    }

    fn metadata_for(&self, name: &str) -> Result<Value, SourceError> {
        if let Some(cached) = self.metadata.borrow().get(name) {
            return Ok(cached.clone());
        }
        let url = format!("{}/{}", self.registry, name);
        debug!(package = name, %url, "fetching registry metadata");
        let value = self.fetcher.get_json(&url).map_err(|err| match err {
            SourceError::HttpStatus { status: 404, .. } => SourceError::NotFound(name.to_string()),
            other => other,
        })?;
        self.metadata
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        Ok(value)
    }
}

impl<F: JsonFetcher> ManifestSource for RegistrySource<F> {
    fn resolve(&self, name: &str, specifier: Option<&str>) -> Result<Manifest, SourceError> {
        let metadata = self.metadata_for(name)?;
        let version =
            select_version(&metadata, specifier).ok_or_else(|| SourceError::Unresolvable {
                name: name.to_string(),
                reason: "package has no published versions".to_string(),
            })?;
        let document = metadata
            .get("versions")
            .and_then(|versions| versions.get(&version))
            .ok_or_else(|| SourceError::Unresolvable {
                name: name.to_string(),
                reason: format!("version {version} not found in registry"),
            })?;
        debug!(package = name, ?specifier, %version, "selected version");

        let (doc_name, doc_version) = name_and_version(document);
        Ok(Manifest {
            name: if doc_name.is_empty() {
                name.to_string()
            } else {
                doc_name
            },
            version: Some(if doc_version.is_empty() {
                version
            } else {
                doc_version
            }),
            dependencies: extract_dependencies(document)
                .into_iter()
                .map(|(dep, spec)| Dependency::new(dep, Some(spec)))
                .collect(),
        })
    }
}

/// Picks the version to load: the exact specifier when it is published,
/// then the `latest` dist-tag, then the greatest version string.
pub fn select_version(metadata: &Value, specifier: Option<&str>) -> Option<String> {
    let versions = metadata.get("versions").and_then(Value::as_object);
    if let (Some(spec), Some(versions)) = (specifier, versions) {
        if is_exact_version(spec) && versions.contains_key(spec) {
            return Some(spec.to_string());
        }
    }

    let latest = metadata
        .get("dist-tags")
        .and_then(|tags| tags.get("latest"))
        .and_then(Value::as_str)
        .filter(|latest| !latest.is_empty());
    if let Some(latest) = latest {
        return Some(latest.to_string());
    }

    // plain string ordering, not semver precedence
    versions.and_then(|versions| versions.keys().max().cloned())
}

pub fn is_exact_version(specifier: &str) -> bool {
    semver::Version::parse(specifier.trim()).is_ok()
}

/// Direct `dependencies` of a package.json document, in declaration order.
/// A missing or malformed field yields no dependencies.
pub fn extract_dependencies(package: &Value) -> Vec<(String, String)> {
    package
        .get("dependencies")
        .and_then(Value::as_object)
        .map(read_deps)
        .unwrap_or_default()
}

fn read_deps(map: &Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(name, value)| {
            let spec = match value {
                Value::String(spec) => spec.clone(),
                other => other.to_string(),
            };
            (name.clone(), spec)
        })
        .collect()
}

pub fn name_and_version(package: &Value) -> (String, String) {
    let field = |key: &str| {
        package
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    (field("name"), field("version"))
}
