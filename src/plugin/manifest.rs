use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::construct::Construct;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub String);

impl PackageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub constructs: Vec<ConstructDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstructDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl PackageManifest {
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn construct(&self, name: &str) -> Option<&ConstructDef> {
        self.constructs.iter().find(|def| def.name == name)
    }
}

/// One row of the registration table: a manifest and the constructs it names.
#[derive(Clone, Copy)]
pub struct PackageEntry {
    pub manifest_source: &'static str,
    pub constructs: fn() -> Vec<Arc<dyn Construct>>,
}

impl fmt::Debug for PackageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageEntry").finish_non_exhaustive()
    }
}
