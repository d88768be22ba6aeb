use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::construct::{Construct, ConstructContext, NullSink};
use crate::plugin::manifest::{PackageEntry, PackageId, PackageManifest};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid name regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStatus {
    Loaded,
    Error(String),
}

#[derive(Clone)]
pub struct PackageRuntime {
    pub id: PackageId,
    pub manifest: Option<PackageManifest>,
    pub status: PackageStatus,
    constructs: Vec<Arc<dyn Construct>>,
}

impl PackageRuntime {
    pub fn load(entry: &PackageEntry) -> Self {
        match PackageManifest::parse(entry.manifest_source) {
            Ok(manifest) => Self::from_manifest(manifest, entry),
            Err(err) => Self::unparsable(err),
        }
    }

    pub fn unparsable(err: toml::de::Error) -> Self {
        Self::failed(PackageId::new("<unnamed>"), format!("plugin.toml: {err}"))
    }

    /// Build the package's constructs and check them against an already parsed manifest.
    pub fn from_manifest(manifest: PackageManifest, entry: &PackageEntry) -> Self {
        let id = PackageId::new(manifest.name.clone());
        let constructs = (entry.constructs)();

        match Self::validate(&manifest, &constructs) {
            Ok(()) => {
                tracing::debug!(package = %id, constructs = constructs.len(), "package loaded");
                Self {
                    id,
                    manifest: Some(manifest),
                    status: PackageStatus::Loaded,
                    constructs,
                }
            }
            Err(err) => Self {
                id,
                manifest: Some(manifest),
                status: PackageStatus::Error(err),
                constructs: Vec::new(),
            },
        }
    }

    /// A runtime that exists only to report why a package is unavailable.
    pub fn failed(id: PackageId, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(package = %id, "package failed to load: {reason}");
        Self {
            id,
            manifest: None,
            status: PackageStatus::Error(reason),
            constructs: Vec::new(),
        }
    }

    pub fn status(&self) -> &PackageStatus {
        &self.status
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.status, PackageStatus::Loaded)
    }

    pub fn construct(&self, name: &str) -> Option<&Arc<dyn Construct>> {
        self.constructs
            .iter()
            .find(|construct| construct.name() == name)
    }

    pub fn construct_names(&self) -> impl Iterator<Item = &str> {
        self.constructs.iter().map(|construct| construct.name())
    }

    pub fn display_name(&self) -> String {
        match self.manifest.as_ref() {
            Some(manifest) => format!("{} {}", manifest.name, manifest.version),
            None => self.id.0.clone(),
        }
    }

    fn validate(
        manifest: &PackageManifest,
        constructs: &[Arc<dyn Construct>],
    ) -> Result<(), String> {
        if !NAME_RE.is_match(&manifest.name) {
            return Err(format!("invalid package name: {:?}", manifest.name));
        }

        let mut provided = BTreeSet::new();
        for construct in constructs {
            let name = construct.name();
            if !NAME_RE.is_match(name) {
                return Err(format!("invalid construct name: {name:?}"));
            }
            if !provided.insert(name) {
                return Err(format!("duplicate construct: {name}"));
            }
            Self::validate_arguments(construct.as_ref())?;
        }

        let declared: BTreeSet<&str> = manifest
            .constructs
            .iter()
            .map(|def| def.name.as_str())
            .collect();
        if declared.len() != manifest.constructs.len() {
            return Err("plugin.toml lists a construct twice".to_string());
        }

        if let Some(name) = declared.difference(&provided).next() {
            return Err(format!("plugin.toml lists missing construct: {name}"));
        }
        if let Some(name) = provided.difference(&declared).next() {
            return Err(format!("construct not listed in plugin.toml: {name}"));
        }

        Ok(())
    }

    fn validate_arguments(construct: &dyn Construct) -> Result<(), String> {
        let sink = NullSink;
        let context = ConstructContext::new("", &sink);
        let processor = construct.prepare(&context);

        let mut seen = HashSet::new();
        for argument in processor.arguments() {
            if !seen.insert(argument.name()) {
                return Err(format!(
                    "construct {} declares argument '{}' twice",
                    construct.name(),
                    argument.name()
                ));
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for PackageRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageRuntime")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("constructs", &self.construct_names().collect::<Vec<_>>())
            .finish()
    }
}
