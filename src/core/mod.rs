pub mod manifest;

pub use manifest::{Dependency, Manifest, NodeId};
