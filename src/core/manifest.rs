use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub specifier: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, specifier: Option<String>) -> Self {
        Self {
            name: name.into(),
            specifier,
        }
    }
}

/// Dependency declaration of one package, as handed out by a manifest source.
///
/// `dependencies` keeps declaration order; the graph builder walks it as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub version: Option<String>,
    pub dependencies: Vec<Dependency>,
}

impl Manifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            dependencies: Vec::new(),
        }
    }

    /// `name` for unversioned manifests, `name@version` otherwise.
    pub fn node_id(&self) -> NodeId {
        match self.version.as_deref() {
            Some(version) => NodeId::new(format!("{}@{}", self.name, version)),
            None => NodeId::new(self.name.clone()),
        }
    }
}
