//! Logging for the rigkit plugin.
//!
//! rigkit runs embedded in a host 3D animation application, so its logging
//! has host-shaped constraints: records must reach the host's script
//! output window, config must be loadable from user-editable INI files,
//! and the chosen log level follows the user across sessions through the
//! host's preference store.
//!
//! The crate is built around an explicit [`registry::LogRegistry`] owning
//! a hierarchy of named loggers. [`startup::LoggingRuntime::bootstrap`]
//! wires a full setup at plugin load; everything it does is also available
//! piecemeal for embedders with their own ideas.
//!
//! ```
//! use std::sync::Arc;
//! use rigkit_logging::prelude::*;
//!
//! let registry = Arc::new(LogRegistry::new());
//! let log = registry.get_logger("rigkit.tools");
//! log.warn("fallback settings in use");
//! ```

// Submodules
pub mod conf;
pub mod facade;
pub mod host;
pub mod level;
pub mod locate;
pub mod prefs;
pub mod registry;
pub mod startup;

// Re-export main types
pub use conf::{ConfigError, LoadOptions, LoggingConf};
pub use level::{Level, LevelSpec, UnknownLevel};
pub use registry::{LogRegistry, Logger};
pub use startup::{HostEnv, LoggingRuntime};

// Prelude for convenient imports
pub mod prelude {
    pub use crate::level::{Level, LevelSpec};
    pub use crate::registry::{LogRegistry, Logger};
    pub use crate::startup::{HostEnv, LoggingRuntime, PACKAGE_LOGGER};
}
