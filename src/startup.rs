//! Plugin logging bootstrap.
//!
//! One [`LoggingRuntime::bootstrap`] call at plugin load takes the place of
//! the whole manual sequence: wire the host's script output in as a root
//! handler, find and load the logging config file, and hand back a runtime
//! owning the registry, the package logger, and the level controls.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::conf::{ConfigError, LoadOptions};
use crate::facade;
use crate::host::HostSink;
use crate::level::{Level, LevelSpec, UnknownLevel};
use crate::locate::ConfigLocator;
use crate::prefs::{
    apply_initial_level_preference, DirectLevelSetter, MemoryOptionStore, OptionStore,
    PreferenceLevelSetter, SetLevel,
};
use crate::registry::handler::HostOutputHandler;
use crate::registry::{FormatTemplate, LogRegistry, Logger};

/// Logger all plugin modules hang off.
pub const PACKAGE_LOGGER: &str = "rigkit";
/// Preference key the chosen log level is saved under.
pub const LOG_LEVEL_OPTVAR: &str = "rigkit.logLevel";
/// Environment variable overriding the saved log level for one session.
pub const LOG_LEVEL_ENV_VAR: &str = "RIGKIT_LOGLEVEL";

/// Everything the host process contributes to the bootstrap.
#[derive(Default)]
pub struct HostEnv {
    /// Directory the plugin is installed in; config files are probed here.
    pub install_root: Option<PathBuf>,
    /// Sink mirroring root-level records into the host's script output.
    pub host_sink: Option<Arc<dyn HostSink>>,
    /// The host's preference store. Levels are kept in memory when absent.
    pub option_store: Option<Arc<dyn OptionStore>>,
    /// Explicit file resolution, replacing the environment-driven default.
    pub locator: Option<ConfigLocator>,
}

/// Live logging state for one plugin instance.
pub struct LoggingRuntime {
    registry: Arc<LogRegistry>,
    package_logger: Logger,
    /// Active level strategy; swapped wholesale when the preference hook
    /// is installed.
    level_setter: RwLock<Arc<dyn SetLevel>>,
    option_store: Arc<dyn OptionStore>,
}

impl LoggingRuntime {
    /// Stand up logging for a freshly loaded plugin.
    ///
    /// The host sink, when given, is attached to the root logger before the
    /// config load; a root section with `remove_existing_handlers = 0`
    /// keeps it across the load. Config resolution and parsing failures are
    /// fatal, the plugin has no business running half-configured.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use rigkit_logging::host::StdoutSink;
    /// use rigkit_logging::startup::{HostEnv, LoggingRuntime};
    ///
    /// let runtime = LoggingRuntime::bootstrap(HostEnv {
    ///     install_root: Some("/opt/rigkit".into()),
    ///     host_sink: Some(Arc::new(StdoutSink)),
    ///     ..Default::default()
    /// })?;
    /// runtime.package_logger().info("plugin loaded");
    /// # Ok::<(), rigkit_logging::conf::ConfigError>(())
    /// ```
    pub fn bootstrap(host: HostEnv) -> Result<Self, ConfigError> {
        let registry = Arc::new(LogRegistry::new());

        if let Some(sink) = host.host_sink {
            let handler =
                HostOutputHandler::new(sink, Level::Notset, FormatTemplate::default());
            registry.root().add_handler(Arc::new(handler));
        }

        let locator = host
            .locator
            .unwrap_or_else(|| ConfigLocator::from_env(host.install_root));
        let config_path = locator.log_config_file()?;
        registry.load_logging_config(&config_path, &LoadOptions::default())?;

        let option_store = host
            .option_store
            .unwrap_or_else(|| Arc::new(MemoryOptionStore::new()) as Arc<dyn OptionStore>);
        let runtime = Self::assemble(registry, option_store);
        runtime
            .package_logger
            .debug(format!("logging configured from {}", config_path.display()));
        Ok(runtime)
    }

    /// Build a runtime around an existing registry, skipping file loading.
    pub fn assemble(registry: Arc<LogRegistry>, option_store: Arc<dyn OptionStore>) -> Self {
        let package_logger = registry.get_logger(PACKAGE_LOGGER);
        let level_setter: Arc<dyn SetLevel> =
            Arc::new(DirectLevelSetter::new(package_logger.clone()));
        Self { registry, package_logger, level_setter: RwLock::new(level_setter), option_store }
    }

    pub fn registry(&self) -> &Arc<LogRegistry> {
        &self.registry
    }

    /// The `rigkit` package logger.
    pub fn package_logger(&self) -> &Logger {
        &self.package_logger
    }

    pub fn root_logger(&self) -> Logger {
        self.registry.root()
    }

    /// Handle for any named logger; plugin modules call this with their
    /// module path.
    pub fn get_logger(&self, name: &str) -> Logger {
        self.registry.get_logger(name)
    }

    pub fn option_store(&self) -> &Arc<dyn OptionStore> {
        &self.option_store
    }

    /// Change the package log level through the active setter.
    pub fn set_level(&self, spec: impl Into<LevelSpec>) -> Result<Level, UnknownLevel> {
        let setter =
            Arc::clone(&*self.level_setter.read().unwrap_or_else(|e| e.into_inner()));
        setter.set_level(spec.into())
    }

    /// Make level changes persist to the user's preferences, and replay the
    /// level saved in a previous session.
    ///
    /// Reads the override from `RIGKIT_LOGLEVEL` in the process
    /// environment.
    pub fn install_level_preference_hook(&self) -> Option<Level> {
        let env = std::env::var(LOG_LEVEL_ENV_VAR).ok();
        self.install_level_preference_hook_with(env.as_deref())
    }

    /// Hook installation with an explicit override value.
    pub fn install_level_preference_hook_with(&self, env_override: Option<&str>) -> Option<Level> {
        let applied = apply_initial_level_preference(
            &self.package_logger,
            self.option_store.as_ref(),
            LOG_LEVEL_OPTVAR,
            env_override,
        );
        let setter: Arc<dyn SetLevel> = Arc::new(PreferenceLevelSetter::new(
            self.package_logger.clone(),
            Arc::clone(&self.option_store),
            LOG_LEVEL_OPTVAR,
        ));
        *self.level_setter.write().unwrap_or_else(|e| e.into_inner()) = setter;
        applied
    }

    /// Route the process-global `log` macros into this runtime's registry.
    pub fn install_log_facade(&self) -> Result<(), log::SetLoggerError> {
        facade::install_log_facade(Arc::clone(&self.registry))
    }

    /// Flush every handler, typically before the plugin unloads.
    pub fn flush(&self) {
        self.registry.flush_all();
    }
}
