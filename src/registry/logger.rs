//! Cheap cloneable handles onto registry loggers.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::level::Level;
use crate::registry::handler::Handler;
use crate::registry::{contains_handler, LogRegistry, ROOT_NAME};

/// Module names carried over from script callers may end in this suffix;
/// it is stripped so a package's `__init__` module logs under the package
/// name itself.
pub const MODULE_INIT_SUFFIX: &str = ".__init__";

/// Canonical registry key for a caller-supplied logger name.
pub(crate) fn normalize_logger_name(name: &str) -> &str {
    let name = name.strip_suffix(MODULE_INIT_SUFFIX).unwrap_or(name);
    if name.is_empty() { ROOT_NAME } else { name }
}

/// Handle to one named logger.
///
/// A `Logger` is a name plus a reference back to its registry; cloning it
/// is cheap and every clone addresses the same underlying state. Handles
/// compare equal when they name the same logger of the same registry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rigkit_logging::level::Level;
/// use rigkit_logging::registry::LogRegistry;
///
/// let registry = Arc::new(LogRegistry::new());
/// let log = registry.get_logger("rigkit.anim");
/// log.set_level(Level::Info);
/// log.info("rig loaded");
/// ```
#[derive(Clone)]
pub struct Logger {
    registry: Arc<LogRegistry>,
    name: String,
}

impl Logger {
    pub(crate) fn from_parts(registry: Arc<LogRegistry>, name: String) -> Self {
        Self { registry, name }
    }

    /// Normalized dotted name this handle addresses.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicitly configured threshold, if any.
    pub fn level(&self) -> Option<Level> {
        self.registry.state().get(&self.name).and_then(|s| s.level)
    }

    /// Set this logger's explicit threshold.
    pub fn set_level(&self, level: Level) {
        self.registry.state().ensure(&self.name).level = Some(level);
    }

    /// Clear the explicit threshold so the parent chain decides again.
    pub fn clear_level(&self) {
        if let Some(state) = self.registry.state().get_mut(&self.name) {
            state.level = None;
        }
    }

    /// Threshold in effect: the first explicit level walking towards the
    /// root, NOTSET if no logger on the chain has one.
    pub fn effective_level(&self) -> Level {
        self.registry.state().effective_level(&self.name)
    }

    /// Attach a handler. Attaching the same instance twice is a no-op.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        let mut state = self.registry.state();
        let logger = state.ensure(&self.name);
        if !contains_handler(&logger.handlers, &handler) {
            logger.handlers.push(handler);
        }
    }

    /// Detach a handler by instance identity.
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) {
        if let Some(state) = self.registry.state().get_mut(&self.name) {
            state.handlers.retain(|present| !Arc::ptr_eq(present, handler));
        }
    }

    /// Handlers currently attached to this logger alone.
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.registry
            .state()
            .get(&self.name)
            .map(|s| s.handlers.clone())
            .unwrap_or_default()
    }

    pub fn propagate(&self) -> bool {
        self.registry.state().get(&self.name).map(|s| s.propagate).unwrap_or(true)
    }

    /// Control whether records continue past this logger to its ancestors.
    pub fn set_propagate(&self, propagate: bool) {
        self.registry.state().ensure(&self.name).propagate = propagate;
    }

    pub fn is_disabled(&self) -> bool {
        self.registry.state().get(&self.name).map(|s| s.disabled).unwrap_or(false)
    }

    /// A disabled logger drops every record submitted to it.
    pub fn set_disabled(&self, disabled: bool) {
        self.registry.state().ensure(&self.name).disabled = disabled;
    }

    /// Whether a record at `level` would currently be dispatched.
    pub fn enabled_for(&self, level: Level) -> bool {
        self.registry.would_log(&self.name, level)
    }

    /// Submit a record at an explicit level.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.registry.submit(&self.name, level, message.into());
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    /// Run a closure and log its wall-clock duration.
    ///
    /// # Arguments
    ///
    /// * `level` - level the timing record is submitted at
    /// * `label` - name of the operation, quoted in the record
    /// * `f` - the work to time
    ///
    /// # Returns
    ///
    /// Whatever the closure returned.
    pub fn timed<R>(&self, level: Level, label: &str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed().as_secs_f64();
        self.log(level, format!("Function {label}(...) - finished in {elapsed:.3} seconds"));
        result
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry) && self.name == other.name
    }
}

impl Eq for Logger {}
