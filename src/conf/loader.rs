//! Applies a parsed configuration to a live registry.
//!
//! Loading is deliberately less destructive than a from-scratch setup:
//! loggers the file never mentions keep their state, and any logger section
//! can opt out of handler removal with `remove_existing_handlers = 0` so
//! handlers installed by the host before the load survive it.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::conf::{parse_logging_conf, ConfigError, HandlerKind, LoggingConf};
use crate::registry::handler::{ConsoleHandler, FileHandler, Handler, NullHandler};
use crate::registry::{contains_handler, LogRegistry};

/// Knobs for one config load.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Fallback options visible to every section of the file.
    pub defaults: Option<HashMap<String, String>>,
    /// Disable pre-existing loggers the file does not mention.
    pub disable_existing_loggers: bool,
}

impl LogRegistry {
    /// Read a config file and reconfigure this registry from it.
    ///
    /// Declared loggers get their section's handlers and, when the section
    /// sets one, its level; they are re-enabled if previously disabled.
    /// Everything else is left alone unless
    /// [`LoadOptions::disable_existing_loggers`] is set.
    ///
    /// # Arguments
    ///
    /// * `path` - INI file in the three-registry layout
    /// * `options` - per-load behavior knobs
    ///
    /// # Returns
    ///
    /// `Ok(())` once the registry reflects the file. On any error the
    /// registry is left exactly as it was.
    pub fn load_logging_config(&self, path: &Path, options: &LoadOptions) -> Result<(), ConfigError> {
        let conf = parse_logging_conf(path, options.defaults.as_ref())?;
        self.apply_conf(&conf, options)
    }

    /// Apply an already-parsed configuration.
    ///
    /// Handler name lists are expected to reference handlers declared in
    /// `conf.handlers`; parsing guarantees this, and unknown names in a
    /// hand-built conf are skipped.
    pub fn apply_conf(&self, conf: &LoggingConf, options: &LoadOptions) -> Result<(), ConfigError> {
        // Build every configured handler before touching the registry, so
        // a failed file open leaves the previous setup in place.
        let mut built: HashMap<String, Arc<dyn Handler>> = HashMap::new();
        for (name, handler_conf) in &conf.handlers {
            let template = conf.template_for(handler_conf);
            let handler: Arc<dyn Handler> = match &handler_conf.kind {
                HandlerKind::Console { stream } => {
                    Arc::new(ConsoleHandler::new(*stream, handler_conf.level, template))
                }
                HandlerKind::File { filename, mode } => Arc::new(
                    FileHandler::open(filename, *mode, handler_conf.level, template).map_err(
                        |source| ConfigError::HandlerIo {
                            handler: name.clone(),
                            path: filename.clone(),
                            source,
                        },
                    )?,
                ),
                HandlerKind::Null => Arc::new(NullHandler),
            };
            built.insert(name.clone(), handler);
        }

        // Capture pre-load handler lists; the opt-out merge below re-attaches
        // from this snapshot.
        let snapshot = self.snapshot_handlers();

        let declared = || std::iter::once(&conf.root).chain(conf.loggers.iter());

        // Critical section: install and merge under one guard so no record
        // dispatch observes a half-applied configuration.
        let mut state = self.state();

        for (name, handler) in &built {
            state.handler_table.insert(name.clone(), Arc::clone(handler));
        }

        for section in declared() {
            let logger_state = state.ensure(&section.qualname);
            if let Some(level) = section.level {
                logger_state.level = Some(level);
            }
            logger_state.handlers = section
                .handlers
                .iter()
                .filter_map(|name| built.get(name).cloned())
                .collect();
            logger_state.propagate = section.propagate;
            logger_state.disabled = false;
        }

        if options.disable_existing_loggers {
            let mentioned: HashSet<&str> =
                declared().map(|section| section.qualname.as_str()).collect();
            for (name, logger_state) in state.loggers.iter_mut() {
                if !mentioned.contains(name.as_str()) {
                    logger_state.disabled = true;
                }
            }
        }

        for section in declared() {
            if section.remove_existing_handlers {
                continue;
            }
            if let Some(old_handlers) = snapshot.for_logger(&section.qualname) {
                let logger_state = state.ensure(&section.qualname);
                for handler in old_handlers {
                    if !contains_handler(&logger_state.handlers, handler) {
                        logger_state.handlers.push(Arc::clone(handler));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::level::Level;
    use crate::registry::handler::MemoryHandler;

    const BASIC: &str = "\
[loggers]
keys = root, rigkit

[handlers]
keys = console

[formatters]
keys = standard

[logger_root]
handlers = console

[logger_rigkit]
qualname = rigkit
level = INFO
handlers =

[handler_console]
class = console
stream = stderr
formatter = standard

[formatter_standard]
format = {level}:{logger}:{message}
";

    fn write_conf(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("logging.conf");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_load_configures_declared_loggers() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, BASIC);
        let registry = Arc::new(LogRegistry::new());

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();

        let root = registry.root();
        assert_eq!(root.handlers().len(), 1);
        let rigkit = registry.get_logger("rigkit");
        assert_eq!(rigkit.level(), Some(Level::Info));
        assert!(rigkit.handlers().is_empty());
        // Configured handlers are also registered by name.
        let by_name = registry.registered_handler("console").unwrap();
        assert!(Arc::ptr_eq(&by_name, &root.handlers()[0]));
    }

    #[test]
    fn test_repeated_loads_do_not_accumulate_handlers() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, BASIC);
        let registry = Arc::new(LogRegistry::new());

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();
        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();

        assert_eq!(registry.root().handlers().len(), 1);
    }

    #[test]
    fn test_remove_existing_handlers_opt_out_preserves() {
        let dir = TempDir::new().unwrap();
        let text = BASIC.replace(
            "[logger_root]\nhandlers = console\n",
            "[logger_root]\nhandlers = console\nremove_existing_handlers = 0\n",
        );
        let path = write_conf(&dir, &text);

        let registry = Arc::new(LogRegistry::new());
        let pre_existing: Arc<dyn Handler> = Arc::new(MemoryHandler::new(Level::Notset));
        registry.root().add_handler(Arc::clone(&pre_existing));

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();

        let handlers = registry.root().handlers();
        assert_eq!(handlers.len(), 2);
        assert!(handlers.iter().any(|h| Arc::ptr_eq(h, &pre_existing)));
    }

    #[test]
    fn test_preserved_handler_never_duplicated_across_loads() {
        let dir = TempDir::new().unwrap();
        let text = BASIC.replace(
            "[logger_root]\nhandlers = console\n",
            "[logger_root]\nhandlers = console\nremove_existing_handlers = 0\n",
        );
        let path = write_conf(&dir, &text);

        let registry = Arc::new(LogRegistry::new());
        let pre_existing: Arc<dyn Handler> = Arc::new(MemoryHandler::new(Level::Notset));
        registry.root().add_handler(Arc::clone(&pre_existing));

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();
        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();

        let copies = registry
            .root()
            .handlers()
            .iter()
            .filter(|h| Arc::ptr_eq(h, &pre_existing))
            .count();
        assert_eq!(copies, 1);
    }

    #[test]
    fn test_default_removal_replaces_handlers() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, BASIC);

        let registry = Arc::new(LogRegistry::new());
        let pre_existing: Arc<dyn Handler> = Arc::new(MemoryHandler::new(Level::Notset));
        registry.root().add_handler(Arc::clone(&pre_existing));

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();

        let handlers = registry.root().handlers();
        assert_eq!(handlers.len(), 1);
        assert!(!handlers.iter().any(|h| Arc::ptr_eq(h, &pre_existing)));
    }

    #[test]
    fn test_unmentioned_loggers_survive_by_default() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, BASIC);
        let registry = Arc::new(LogRegistry::new());

        let legacy = registry.get_logger("legacy.tool");
        legacy.set_level(Level::Debug);
        let keeper: Arc<dyn Handler> = Arc::new(MemoryHandler::new(Level::Notset));
        legacy.add_handler(Arc::clone(&keeper));

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();

        assert!(!legacy.is_disabled());
        assert_eq!(legacy.level(), Some(Level::Debug));
        let handlers = legacy.handlers();
        assert_eq!(handlers.len(), 1);
        assert!(Arc::ptr_eq(&handlers[0], &keeper));
    }

    #[test]
    fn test_disable_existing_loggers_flag() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, BASIC);
        let registry = Arc::new(LogRegistry::new());

        let legacy = registry.get_logger("legacy.tool");
        let sink = MemoryHandler::new(Level::Notset);
        legacy.add_handler(Arc::new(sink.clone()));

        let options = LoadOptions { disable_existing_loggers: true, ..Default::default() };
        registry.load_logging_config(&path, &options).unwrap();

        assert!(legacy.is_disabled());
        legacy.critical("dropped");
        assert!(sink.messages().is_empty());
        // Declared loggers are never disabled by the flag.
        assert!(!registry.get_logger("rigkit").is_disabled());
    }

    #[test]
    fn test_declared_logger_is_reenabled() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, BASIC);
        let registry = Arc::new(LogRegistry::new());

        let rigkit = registry.get_logger("rigkit");
        rigkit.set_disabled(true);

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();
        assert!(!rigkit.is_disabled());
    }

    #[test]
    fn test_level_survives_when_section_omits_it() {
        let dir = TempDir::new().unwrap();
        // Drop the level option from the rigkit section.
        let text = BASIC.replace("level = INFO\n", "");
        let path = write_conf(&dir, &text);
        let registry = Arc::new(LogRegistry::new());

        let rigkit = registry.get_logger("rigkit");
        rigkit.set_level(Level::Debug);

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();
        assert_eq!(rigkit.level(), Some(Level::Debug));
    }

    #[test]
    fn test_file_handler_writes_through_config() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("session.log");
        let text = format!(
            "\
[loggers]
keys = root

[handlers]
keys = logfile

[formatters]
keys = standard

[logger_root]
level = INFO
handlers = logfile

[handler_logfile]
class = file
filename = {}
formatter = standard

[formatter_standard]
format = {{level}}:{{logger}}:{{message}}
",
            log_path.display()
        );
        let path = write_conf(&dir, &text);
        let registry = Arc::new(LogRegistry::new());

        registry.load_logging_config(&path, &LoadOptions::default()).unwrap();
        registry.root().info("written to disk");
        registry.flush_all();

        let contents = fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.trim_end(), "INFO:root:written to disk");
    }

    #[test]
    fn test_failed_handler_build_leaves_registry_untouched() {
        let dir = TempDir::new().unwrap();
        let missing_dir = dir.path().join("no").join("such").join("dir");
        let text = format!(
            "\
[loggers]
keys = root

[handlers]
keys = logfile

[formatters]
keys =

[logger_root]
level = DEBUG
handlers = logfile

[handler_logfile]
class = file
filename = {}
",
            missing_dir.join("out.log").display()
        );
        let path = write_conf(&dir, &text);
        let registry = Arc::new(LogRegistry::new());
        let pre_existing: Arc<dyn Handler> = Arc::new(MemoryHandler::new(Level::Notset));
        registry.root().add_handler(Arc::clone(&pre_existing));

        let err = registry.load_logging_config(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::HandlerIo { handler, .. } if handler == "logfile"));

        // Nothing was applied.
        assert_eq!(registry.root().level(), Some(Level::Warning));
        let handlers = registry.root().handlers();
        assert_eq!(handlers.len(), 1);
        assert!(Arc::ptr_eq(&handlers[0], &pre_existing));
    }
}
