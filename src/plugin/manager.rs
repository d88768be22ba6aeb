use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::construct::{Construct, ConstructContext, ConstructError};
use crate::model::config::AppConfig;
use crate::model::value::Value;
use crate::plugin::builtin_packages;
use crate::plugin::manifest::{PackageEntry, PackageId, PackageManifest};
use crate::plugin::runtime::{PackageRuntime, PackageStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PluginError {
    #[error("construct not found: {0}")]
    UnknownConstruct(String),
    #[error("construct is ambiguous: {name} (provided by {})", packages.join(", "))]
    AmbiguousConstruct { name: String, packages: Vec<String> },
    #[error(transparent)]
    Construct(#[from] ConstructError),
}

#[derive(Debug, Default)]
pub struct PluginManager {
    runtimes: BTreeMap<PackageId, PackageRuntime>,
}

impl PluginManager {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_packages(config, &builtin_packages())
    }

    pub fn with_packages(config: &AppConfig, packages: &[PackageEntry]) -> Self {
        let mut manager = Self::default();

        for entry in packages {
            let runtime = match PackageManifest::parse(entry.manifest_source) {
                Ok(manifest) if !config.package_enabled(&manifest.name) => {
                    tracing::debug!(package = %manifest.name, "package disabled by config");
                    continue;
                }
                Ok(manifest) => PackageRuntime::from_manifest(manifest, entry),
                Err(err) => PackageRuntime::unparsable(err),
            };

            if manager.runtimes.contains_key(&runtime.id) {
                let id = runtime.id.clone();
                manager.runtimes.insert(
                    id.clone(),
                    PackageRuntime::failed(id, "package registered twice"),
                );
                continue;
            }

            manager.runtimes.insert(runtime.id.clone(), runtime);
        }

        for plugin in &config.plugins {
            let id = PackageId::new(plugin.name.clone());
            if plugin.enabled && !manager.runtimes.contains_key(&id) {
                manager
                    .runtimes
                    .insert(id.clone(), PackageRuntime::failed(id, "unknown package"));
            }
        }

        manager
    }

    pub fn package_count(&self) -> usize {
        self.runtimes.len()
    }

    pub fn error_count(&self) -> usize {
        self.runtimes
            .values()
            .filter(|runtime| matches!(runtime.status(), PackageStatus::Error(_)))
            .count()
    }

    /// Resolve `Package.construct`, or a bare construct name that exactly one
    /// loaded package provides.
    pub fn resolve(&self, name: &str) -> Result<(&PackageId, &Arc<dyn Construct>), PluginError> {
        if let Some((package, construct)) = name.split_once('.') {
            return self
                .runtimes
                .get(&PackageId::new(package))
                .filter(|runtime| runtime.is_loaded())
                .and_then(|runtime| Some((&runtime.id, runtime.construct(construct)?)))
                .ok_or_else(|| PluginError::UnknownConstruct(name.to_string()));
        }

        let mut matches = self.runtimes.values().filter_map(|runtime| {
            runtime
                .construct(name)
                .map(|construct| (&runtime.id, construct))
        });

        let Some(first) = matches.next() else {
            return Err(PluginError::UnknownConstruct(name.to_string()));
        };

        let rest: Vec<_> = matches.collect();
        if !rest.is_empty() {
            let packages = std::iter::once(first)
                .chain(rest)
                .map(|(id, _)| id.0.clone())
                .collect();
            return Err(PluginError::AmbiguousConstruct {
                name: name.to_string(),
                packages,
            });
        }

        Ok(first)
    }

    /// Resolve, prepare and run one construct invocation.
    pub fn invoke(
        &self,
        name: &str,
        values: Vec<Value>,
        context: &ConstructContext<'_>,
    ) -> Result<Value, PluginError> {
        let (package, construct) = self.resolve(name)?;
        tracing::debug!(
            package = %package,
            construct = construct.name(),
            robot = context.robot(),
            arguments = values.len(),
            "invoking construct"
        );

        let processor = construct.prepare(context);
        Ok(processor.process(values)?)
    }

    pub fn summary_notification(&self) -> String {
        let loaded = self.package_count().saturating_sub(self.error_count());
        format!("plugins: {loaded} loaded, {} errors", self.error_count())
    }

    pub fn error_notifications(&self) -> Vec<String> {
        self.runtimes
            .values()
            .filter_map(|runtime| {
                if let PackageStatus::Error(err) = runtime.status() {
                    Some(format!("plugin {}: {err}", runtime.display_name()))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn list_notifications(&self) -> Vec<String> {
        if self.runtimes.is_empty() {
            return vec!["plugins: none loaded".to_string()];
        }

        self.runtimes
            .values()
            .map(|runtime| {
                let status = match runtime.status() {
                    PackageStatus::Loaded => "loaded".to_string(),
                    PackageStatus::Error(err) => format!("error: {err}"),
                };

                let description = runtime
                    .manifest
                    .as_ref()
                    .and_then(|manifest| manifest.description.as_deref())
                    .map(|text| format!(" - {text}"))
                    .unwrap_or_default();

                format!("plugin {} [{status}]{description}", runtime.display_name())
            })
            .collect()
    }

    pub fn construct_notifications(&self) -> Vec<String> {
        let mut rows: Vec<String> = self
            .runtimes
            .values()
            .filter(|runtime| runtime.is_loaded())
            .flat_map(|runtime| {
                runtime.construct_names().map(move |name| {
                    let description = runtime
                        .manifest
                        .as_ref()
                        .and_then(|manifest| manifest.construct(name))
                        .and_then(|def| def.description.as_deref())
                        .map(|text| format!("  {text}"))
                        .unwrap_or_default();
                    format!("{}.{name}{description}", runtime.id)
                })
            })
            .collect();

        if rows.is_empty() {
            return vec!["constructs: none available".to_string()];
        }

        rows.sort();
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{CoercionError, MemorySink};
    use crate::model::config::PluginConfig;
    use crate::model::value::{NULL, from_value};
    use crate::plugin::guide;
    use crate::plugin::runtime::tests::{entry, stub};

    fn config(plugins: Vec<PluginConfig>) -> AppConfig {
        let mut config = AppConfig::defaults().unwrap();
        config.plugins = plugins;
        config
    }

    fn plugin(name: &str, enabled: bool) -> PluginConfig {
        PluginConfig {
            name: name.to_string(),
            enabled,
        }
    }

    fn echo_package() -> PackageEntry {
        entry(
            "name = \"Echo\"\nversion = \"0.2.0\"\n[[constructs]]\nname = \"greet\"\n[[constructs]]\nname = \"shout\"\n",
            || vec![stub("greet", &[]), stub("shout", &["text"])],
        )
    }

    #[test]
    fn loads_builtin_packages() {
        let manager = PluginManager::new(&config(Vec::new()));
        assert_eq!(manager.package_count(), 1);
        assert_eq!(manager.error_count(), 0);
        assert_eq!(manager.summary_notification(), "plugins: 1 loaded, 0 errors");
        assert_eq!(
            manager.construct_notifications(),
            vec!["Guide.greet  Write `Hello <name>!` to the robot log. Name defaults to World.".to_string()]
        );
    }

    #[test]
    fn invokes_greet_through_the_table() {
        let manager = PluginManager::new(&config(Vec::new()));
        let sink = MemorySink::new();
        let context = ConstructContext::new("main", &sink);

        assert_eq!(manager.invoke("greet", vec![from_value("Alice")], &context), Ok(NULL));
        assert_eq!(manager.invoke("Guide.greet", Vec::new(), &context), Ok(NULL));
        assert_eq!(
            sink.messages(),
            vec!["Hello Alice!".to_string(), "Hello World!".to_string()]
        );
    }

    #[test]
    fn construct_errors_pass_through_unchanged() {
        let manager = PluginManager::new(&config(Vec::new()));
        let sink = MemorySink::new();
        let context = ConstructContext::new("main", &sink);

        let err = manager
            .invoke("greet", vec![from_value(vec![NULL])], &context)
            .unwrap_err();
        assert!(matches!(
            err,
            PluginError::Construct(ConstructError::Coercion(CoercionError::Mismatch { .. }))
        ));
        assert_eq!(
            err.to_string(),
            "argument 'name' expects an atomic value, got list"
        );

        let err = manager
            .invoke("greet", vec![NULL, NULL], &context)
            .unwrap_err();
        assert_eq!(
            err,
            PluginError::Construct(ConstructError::TooManyArguments {
                expected: 1,
                found: 2
            })
        );
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn disabled_packages_are_skipped() {
        let manager = PluginManager::new(&config(vec![plugin("Guide", false)]));
        assert_eq!(manager.package_count(), 0);
        assert_eq!(manager.list_notifications(), vec!["plugins: none loaded".to_string()]);
        assert_eq!(
            manager.resolve("greet").err(),
            Some(PluginError::UnknownConstruct("greet".into()))
        );
    }

    #[test]
    fn disabled_packages_are_never_built() {
        let untouchable = entry(
            "name = \"Heavy\"\nversion = \"1\"\n[[constructs]]\nname = \"a\"\n",
            || -> Vec<Arc<dyn Construct>> { panic!("disabled package must not be built") },
        );
        let manager = PluginManager::with_packages(
            &config(vec![plugin("Heavy", false)]),
            &[untouchable, guide::package()],
        );

        assert_eq!(manager.package_count(), 1);
        assert_eq!(manager.error_count(), 0);
        assert!(manager.resolve("Heavy.a").is_err());
        assert!(manager.resolve("Guide.greet").is_ok());
    }

    #[test]
    fn unknown_configured_package_is_reported() {
        let manager = PluginManager::new(&config(vec![plugin("Missing", true)]));
        assert_eq!(manager.error_count(), 1);
        assert_eq!(
            manager.error_notifications(),
            vec!["plugin Missing: unknown package".to_string()]
        );
    }

    #[test]
    fn bare_names_must_be_unique() {
        let manager = PluginManager::with_packages(
            &config(Vec::new()),
            &[guide::package(), echo_package()],
        );

        assert_eq!(
            manager.resolve("greet").err(),
            Some(PluginError::AmbiguousConstruct {
                name: "greet".into(),
                packages: vec!["Echo".into(), "Guide".into()],
            })
        );

        let (package, construct) = manager.resolve("Guide.greet").unwrap();
        assert_eq!(package, &PackageId::new("Guide"));
        assert_eq!(construct.name(), "greet");

        let (package, _) = manager.resolve("shout").unwrap();
        assert_eq!(package, &PackageId::new("Echo"));

        assert!(matches!(
            manager.resolve("Guide.shout"),
            Err(PluginError::UnknownConstruct(_))
        ));
    }

    #[test]
    fn duplicate_package_is_an_error() {
        let manager = PluginManager::with_packages(
            &config(Vec::new()),
            &[guide::package(), guide::package()],
        );
        assert_eq!(
            manager.error_notifications(),
            vec!["plugin Guide: package registered twice".to_string()]
        );
        assert!(manager.resolve("greet").is_err());
    }

    #[test]
    fn list_shows_status_and_description() {
        let manager = PluginManager::new(&config(Vec::new()));
        assert_eq!(
            manager.list_notifications(),
            vec![
                "plugin Guide 0.1.0 [loaded] - Example constructs to copy when writing a plugin."
                    .to_string()
            ]
        );
    }
}
