//! The `Guide` package: the smallest useful plugin, kept as a template.

mod greet;

use std::sync::Arc;

use crate::construct::Construct;
use crate::plugin::manifest::PackageEntry;

pub use greet::GreetConstruct;

pub fn package() -> PackageEntry {
    PackageEntry {
        manifest_source: include_str!("plugin.toml"),
        constructs,
    }
}

fn constructs() -> Vec<Arc<dyn Construct>> {
    vec![Arc::new(GreetConstruct)]
}
