pub mod guide;
pub mod manager;
pub mod manifest;
pub mod runtime;

pub use manager::{PluginError, PluginManager};
pub use manifest::{PackageEntry, PackageId, PackageManifest};

/// Every package compiled into this binary. Hosts load from this table
/// instead of scanning for plugins at runtime.
pub fn builtin_packages() -> Vec<PackageEntry> {
    vec![guide::package()]
}
