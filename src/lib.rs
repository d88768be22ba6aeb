//! Constructs are host-invocable operations contributed by plugin packages.
//!
//! A host builds a [`PluginManager`] from the registration table in
//! [`plugin::builtin_packages`], then for every call hands it a
//! [`ConstructContext`] carrying the log sink it owns:
//!
//! ```
//! use construct_guide::construct::{ConstructContext, MemorySink};
//! use construct_guide::model::config::AppConfig;
//! use construct_guide::model::value::{NULL, from_value};
//! use construct_guide::plugin::PluginManager;
//!
//! let manager = PluginManager::new(&AppConfig::defaults().unwrap());
//! let sink = MemorySink::new();
//! let context = ConstructContext::new("main", &sink);
//!
//! let result = manager.invoke("greet", vec![from_value("Alice")], &context);
//! assert_eq!(result, Ok(NULL));
//! assert_eq!(sink.messages(), vec!["Hello Alice!".to_string()]);
//! ```

pub mod app;
pub mod construct;
pub mod model;
pub mod msg;
pub mod plugin;

pub use construct::{Construct, ConstructContext, Processor};
pub use plugin::PluginManager;
