use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::core::manifest::{Dependency, Manifest};
use crate::source::traits::{ManifestSource, SourceError};

/// Dependency relation read from a line-oriented description:
///
/// ```text
/// # comment
/// A: B C
/// B: D
/// D:
/// ```
///
/// Packages carry no versions; specifiers passed to `resolve` are ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticRepo {
    packages: HashMap<String, Vec<String>>,
    referenced: HashSet<String>,
}

impl StaticRepo {
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut repo = Self::default();
        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, deps)) = line.split_once(':') else {
                continue;
            };
            let deps: Vec<String> = deps.split_whitespace().map(str::to_string).collect();
            repo.packages.insert(name.trim().to_string(), deps);
        }
        // only the surviving declarations count once duplicates are replaced
        repo.referenced = repo.packages.values().flatten().cloned().collect();
        repo
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn dependencies_of(&self, name: &str) -> Option<&[String]> {
        self.packages.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl ManifestSource for StaticRepo {
    fn resolve(&self, name: &str, _specifier: Option<&str>) -> Result<Manifest, SourceError> {
        let mut manifest = Manifest::new(name);
        match self.packages.get(name) {
            Some(deps) => {
                manifest.dependencies = deps
                    .iter()
                    .map(|dep| Dependency::new(dep.clone(), None))
                    .collect();
                Ok(manifest)
            }
            // declared only as someone's dependency: a leaf
            None if self.referenced.contains(name) => Ok(manifest),
            None => Err(SourceError::NotFound(name.to_string())),
        }
    }

    /// A root needs a line of its own.
    fn resolve_root(&self, name: &str, specifier: Option<&str>) -> Result<Manifest, SourceError> {
        if !self.contains(name) {
            return Err(SourceError::NotFound(name.to_string()));
        }
        self.resolve(name, specifier)
    }
}
