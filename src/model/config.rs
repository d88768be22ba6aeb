use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub robot: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    #[serde(default)]
    pub directory: Option<String>,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        match user_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::defaults(),
        }
    }

    pub fn defaults() -> Result<Self> {
        Self::from_table(toml::from_str(DEFAULTS)?)
    }

    /// Merge the file at `path` over the embedded defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(DEFAULTS)?;
        let user_str =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let user_table: toml::Table =
            toml::from_str(&user_str).with_context(|| format!("parsing {}", path.display()))?;
        merge_tables(&mut table, user_table);
        Self::from_table(table)
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        let mut config: AppConfig = toml::Value::Table(table).try_into()?;

        // Expand ~ in the log directory
        if let Some(directory) = config.logging.directory.as_mut() {
            if directory.starts_with('~') {
                let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
                *directory = directory.replacen('~', &home.to_string_lossy(), 1);
            }
        }

        Ok(config)
    }

    pub fn log_directory(&self) -> Option<PathBuf> {
        self.logging
            .directory
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }

    /// Packages are enabled unless a `[[plugins]]` entry turns them off.
    pub fn package_enabled(&self, name: &str) -> bool {
        self.plugins
            .iter()
            .filter(|plugin| plugin.name == name)
            .all(|plugin| plugin.enabled)
    }
}

/// Recursively overlay `overlay` onto `base`. Arrays and scalars replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "construct-guide")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn embedded_defaults_parse() {
        let config = AppConfig::defaults().unwrap();
        assert_eq!(config.general.robot, "main");
        assert_eq!(config.logging.filter, "construct_guide=info,robot=info");
        assert_eq!(config.logging.file_prefix, "guide.log");
        assert!(config.log_directory().is_none());
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn user_file_merges_over_defaults() {
        let file = write_config(
            r#"
            [general]
            robot = "nightly-import"

            [logging]
            directory = "/var/log/guide"

            [[plugins]]
            name = "Guide"
            enabled = false
            "#,
        );

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.general.robot, "nightly-import");
        // untouched keys keep their defaults
        assert_eq!(config.logging.filter, "construct_guide=info,robot=info");
        assert_eq!(config.log_directory(), Some(PathBuf::from("/var/log/guide")));
        assert!(!config.package_enabled("Guide"));
        assert!(config.package_enabled("Other"));
    }

    #[test]
    fn plugin_entries_default_to_enabled() {
        let file = write_config("[[plugins]]\nname = \"Guide\"\n");
        let config = AppConfig::load_from(file.path()).unwrap();
        assert!(config.plugins[0].enabled);
        assert!(config.package_enabled("Guide"));
    }

    #[test]
    fn invalid_user_file_is_reported() {
        let file = write_config("[general\nrobot = 1");
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("parsing "));
    }

    #[test]
    fn wrong_types_fail_deserialization() {
        let file = write_config("[general]\nrobot = 5\n");
        assert!(AppConfig::load_from(file.path()).is_err());
    }
}
