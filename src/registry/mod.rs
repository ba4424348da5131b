//! Hierarchical logger registry.
//!
//! The registry is an explicit object rather than ambient process state:
//! startup code constructs one, owns it, and hands out [`Logger`] handles.
//! Every mutable piece lives behind a single mutex so the config loader can
//! hold one critical section across its install-and-merge sequence. Record
//! dispatch clones the handler list and emits outside the lock.

// Submodules
pub mod formatter;
pub mod handler;
pub mod logger;

// Re-export main types
pub use formatter::{FormatTemplate, DEFAULT_DATE_FORMAT, DEFAULT_FORMAT};
pub use handler::{
    ConsoleHandler, ConsoleStream, FileHandler, FileMode, Handler, HostOutputHandler,
    MemoryHandler, NullHandler,
};
pub use logger::{Logger, MODULE_INIT_SUFFIX};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};

use crate::level::Level;

/// Name addressing the root logger. The empty string aliases it.
pub const ROOT_NAME: &str = "root";

/// One emitted log event, as handlers receive it.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Dotted name of the logger the record was submitted to.
    pub logger: String,
    pub level: Level,
    pub message: String,
    /// Local wall-clock time at submission.
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    pub fn new(logger: String, level: Level, message: String) -> Self {
        Self { logger, level, message, timestamp: Local::now() }
    }
}

/// Per-logger bookkeeping inside the registry.
pub(crate) struct LoggerState {
    /// Explicit threshold; `None` (and NOTSET) defer to the parent chain.
    pub(crate) level: Option<Level>,
    pub(crate) handlers: Vec<Arc<dyn Handler>>,
    pub(crate) propagate: bool,
    pub(crate) disabled: bool,
}

impl LoggerState {
    fn named() -> Self {
        Self { level: None, handlers: Vec::new(), propagate: true, disabled: false }
    }

    fn root() -> Self {
        // The root logger starts at WARNING, so an unconfigured registry
        // stays quiet below warnings.
        Self { level: Some(Level::Warning), handlers: Vec::new(), propagate: true, disabled: false }
    }
}

/// Everything guarded by the registry mutex.
pub(crate) struct RegistryState {
    pub(crate) root: LoggerState,
    /// Named loggers; the root lives in its own slot, never in this map.
    pub(crate) loggers: HashMap<String, LoggerState>,
    /// Handlers registered by name, e.g. by the config loader. Keeps them
    /// alive independently of which loggers currently reference them.
    pub(crate) handler_table: HashMap<String, Arc<dyn Handler>>,
}

impl RegistryState {
    pub(crate) fn get(&self, name: &str) -> Option<&LoggerState> {
        if name == ROOT_NAME {
            Some(&self.root)
        } else {
            self.loggers.get(name)
        }
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut LoggerState> {
        if name == ROOT_NAME {
            Some(&mut self.root)
        } else {
            self.loggers.get_mut(name)
        }
    }

    /// Look up a logger's state, creating it on first use.
    pub(crate) fn ensure(&mut self, name: &str) -> &mut LoggerState {
        if name == ROOT_NAME {
            &mut self.root
        } else {
            self.loggers.entry(name.to_string()).or_insert_with(LoggerState::named)
        }
    }

    /// First explicit level walking from `name` towards the root.
    pub(crate) fn effective_level(&self, name: &str) -> Level {
        for node in chain_of(name) {
            if let Some(state) = self.get(node) {
                if let Some(level) = state.level {
                    if level != Level::Notset {
                        return level;
                    }
                }
            }
        }
        Level::Notset
    }

    /// Handlers that would see a record submitted to `name`: the logger's
    /// own, then each ancestor's, stopping at the first non-propagating
    /// registered node.
    pub(crate) fn collect_handlers(&self, name: &str) -> Vec<Arc<dyn Handler>> {
        let mut out = Vec::new();
        for node in chain_of(name) {
            if let Some(state) = self.get(node) {
                out.extend(state.handlers.iter().cloned());
                if !state.propagate {
                    break;
                }
            }
        }
        out
    }
}

/// Handler lists captured before a config load mutates anything.
pub(crate) struct HandlerSnapshot {
    pub(crate) root: Vec<Arc<dyn Handler>>,
    pub(crate) named: HashMap<String, Vec<Arc<dyn Handler>>>,
}

impl HandlerSnapshot {
    /// Pre-load handlers of the logger `name`, root included.
    pub(crate) fn for_logger(&self, name: &str) -> Option<&[Arc<dyn Handler>]> {
        if name == ROOT_NAME {
            Some(self.root.as_slice())
        } else {
            self.named.get(name).map(|v| v.as_slice())
        }
    }
}

/// Identity membership test used wherever handler duplicates are suppressed.
pub(crate) fn contains_handler(list: &[Arc<dyn Handler>], handler: &Arc<dyn Handler>) -> bool {
    list.iter().any(|present| Arc::ptr_eq(present, handler))
}

/// Owner of the logger namespace for one plugin runtime.
pub struct LogRegistry {
    inner: Mutex<RegistryState>,
}

impl LogRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryState {
                root: LoggerState::root(),
                loggers: HashMap::new(),
                handler_table: HashMap::new(),
            }),
        }
    }

    /// Take the registry lock. A poisoned lock is absorbed: a panicking
    /// thread elsewhere must not disable logging for the whole process.
    pub(crate) fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle for the named logger, creating its registry entry on first
    /// lookup. A trailing `.__init__` is stripped so package-level callers
    /// register under the package's own name; `""` and `"root"` address the
    /// root logger.
    pub fn get_logger(self: &Arc<Self>, name: &str) -> Logger {
        let name = logger::normalize_logger_name(name).to_string();
        if name != ROOT_NAME {
            self.state().ensure(&name);
        }
        Logger::from_parts(Arc::clone(self), name)
    }

    /// Handle for the root logger.
    pub fn root(self: &Arc<Self>) -> Logger {
        Logger::from_parts(Arc::clone(self), ROOT_NAME.to_string())
    }

    /// Register a handler instance under a name, keeping it alive in the
    /// registry independent of logger attachments.
    pub fn register_handler(&self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.state().handler_table.insert(name.into(), handler);
    }

    /// Handler previously registered under `name`.
    pub fn registered_handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.state().handler_table.get(name).cloned()
    }

    /// Flush every distinct handler known to the registry.
    pub fn flush_all(&self) {
        let mut unique: Vec<Arc<dyn Handler>> = Vec::new();
        {
            let state = self.state();
            let attached = state
                .root
                .handlers
                .iter()
                .chain(state.loggers.values().flat_map(|s| s.handlers.iter()))
                .chain(state.handler_table.values());
            for handler in attached {
                if !contains_handler(&unique, handler) {
                    unique.push(Arc::clone(handler));
                }
            }
        }
        for handler in &unique {
            handler.flush();
        }
    }

    /// Whether a record at `level` submitted to `name` would be dispatched.
    /// `name` must already be normalized.
    pub(crate) fn would_log(&self, name: &str, level: Level) -> bool {
        let state = self.state();
        if state.get(name).map(|s| s.disabled).unwrap_or(false) {
            return false;
        }
        level >= state.effective_level(name)
    }

    /// Dispatch one record. The handler list is cloned under the lock and
    /// the emit calls run outside it, so handler I/O never blocks the
    /// registry. `name` must already be normalized.
    pub(crate) fn submit(&self, name: &str, level: Level, message: String) {
        let handlers = {
            let state = self.state();
            if state.get(name).map(|s| s.disabled).unwrap_or(false) {
                return;
            }
            if level < state.effective_level(name) {
                return;
            }
            state.collect_handlers(name)
        };
        if handlers.is_empty() {
            return;
        }
        let record = LogRecord::new(name.to_string(), level, message);
        for handler in &handlers {
            handler.handle(&record);
        }
    }

    /// Handler lists of the root and of every registered logger, by name.
    pub(crate) fn snapshot_handlers(&self) -> HandlerSnapshot {
        let state = self.state();
        HandlerSnapshot {
            root: state.root.handlers.clone(),
            named: state
                .loggers
                .iter()
                .map(|(name, s)| (name.clone(), s.handlers.clone()))
                .collect(),
        }
    }
}

impl Default for LogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The name itself, its dotted-prefix ancestors, then the root.
fn chain_of(name: &str) -> Vec<&str> {
    let mut chain = vec![name];
    let mut current = name;
    while let Some(split) = current.rfind('.') {
        current = &current[..split];
        chain.push(current);
    }
    if name != ROOT_NAME {
        chain.push(ROOT_NAME);
    }
    chain
}
