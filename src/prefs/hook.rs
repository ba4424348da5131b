//! Level changes that remember themselves.
//!
//! The host UI exposes a "log level" control. Routing its changes through
//! [`PreferenceLevelSetter`] makes every change stick: the new level is
//! applied, announced on the package logger, and written back to the user's
//! preference store. Startup then replays the saved value through
//! [`apply_initial_level_preference`].

use std::sync::Arc;

use crate::level::{level_to_name, parse_level, Level, LevelSpec, UnknownLevel};
use crate::prefs::OptionStore;
use crate::registry::Logger;

/// Saved preferences never raise the startup threshold above this.
const STARTUP_LEVEL_CEILING: Level = Level::Warning;

/// Applies a level given by typed value, name, or number.
pub trait SetLevel: Send + Sync {
    /// # Returns
    ///
    /// The level actually applied, after resolving the spec.
    fn set_level(&self, spec: LevelSpec) -> Result<Level, UnknownLevel>;
}

/// Plain setter with no side effects beyond the logger itself.
pub struct DirectLevelSetter {
    logger: Logger,
}

impl DirectLevelSetter {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl SetLevel for DirectLevelSetter {
    fn set_level(&self, spec: LevelSpec) -> Result<Level, UnknownLevel> {
        let level = spec.resolve()?;
        self.logger.set_level(level);
        Ok(level)
    }
}

/// Setter that persists each change to the user's preference store.
///
/// A store failure is reported as a warning on the same logger and then
/// swallowed: the level change itself must survive even when preferences
/// cannot be written yet.
pub struct PreferenceLevelSetter {
    logger: Logger,
    store: Arc<dyn OptionStore>,
    key: String,
}

impl PreferenceLevelSetter {
    pub fn new(logger: Logger, store: Arc<dyn OptionStore>, key: impl Into<String>) -> Self {
        Self { logger, store, key: key.into() }
    }
}

impl SetLevel for PreferenceLevelSetter {
    fn set_level(&self, spec: LevelSpec) -> Result<Level, UnknownLevel> {
        let level = spec.resolve()?;
        let name = level_to_name(level);
        self.logger.set_level(level);
        self.logger.info(format!("Log Level Changed to '{name}'"));
        if let Err(e) = self.store.set(&self.key, name) {
            self.logger.warn(format!("Log Level could not be saved to the user-prefs ('{e}')"));
        }
        Ok(level)
    }
}

/// Restore the saved log level at startup.
///
/// The environment override wins over the stored preference; an override
/// that is set but empty turns the whole mechanism off for this session.
/// Saved levels are capped at WARNING so a stale preference cannot hide
/// warnings, and an unparseable value is reported and ignored.
///
/// # Arguments
///
/// * `logger` - package logger the level is applied to
/// * `store` - preference store holding the saved value
/// * `key` - option key the level is saved under
/// * `env_override` - value of the override environment variable, if set
///
/// # Returns
///
/// The level that was applied, if any.
pub fn apply_initial_level_preference(
    logger: &Logger,
    store: &dyn OptionStore,
    key: &str,
    env_override: Option<&str>,
) -> Option<Level> {
    let saved = match env_override {
        Some(value) => value.to_string(),
        None => store.get(key).unwrap_or_default(),
    };
    if saved.is_empty() {
        return None;
    }
    match parse_level(&saved) {
        Ok(level) => {
            let level = level.min(STARTUP_LEVEL_CEILING);
            logger.set_level(level);
            logger.info(format!(
                "setting logLevel to user preference: {saved} ({})",
                level.value()
            ));
            Some(level)
        }
        Err(e) => {
            logger.warn(format!("ignoring saved log level: {e}"));
            None
        }
    }
}
