// Severity levels for the logging hierarchy.
//
// Levels are integers stepping by 10 so that host code and config files can
// address them either by canonical name ("WARNING") or by value (30).

use std::fmt;

use thiserror::Error;

/// Severity of a log record or a logger threshold.
///
/// Declaration order is ascending severity and the derived `Ord` follows it,
/// so `Level::Debug < Level::Warning` holds and `std::cmp::min` clamps a
/// level the way a preference ceiling needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// No explicit threshold; the logger inherits one from its parent.
    Notset,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Every level in ascending severity order.
pub const ALL_LEVELS: [Level; 6] = [
    Level::Notset,
    Level::Debug,
    Level::Info,
    Level::Warning,
    Level::Error,
    Level::Critical,
];

/// Lookup failure from the name/value bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownLevel {
    #[error("unknown log level name '{0}'")]
    Name(String),

    #[error("unknown log level value {0}")]
    Value(u32),
}

impl Level {
    /// Numeric severity. NOTSET is 0, CRITICAL is 50.
    pub fn value(self) -> u32 {
        match self {
            Level::Notset => 0,
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }

    /// Canonical upper-case name, e.g. `"WARNING"`.
    pub fn name(self) -> &'static str {
        match self {
            Level::Notset => "NOTSET",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Level for an exact numeric severity.
    pub fn from_value(value: u32) -> Result<Level, UnknownLevel> {
        ALL_LEVELS
            .iter()
            .copied()
            .find(|level| level.value() == value)
            .ok_or(UnknownLevel::Value(value))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_level(s)
    }
}

/// Canonical name to level. Exact match only ("WARNING", not "warning").
pub fn name_to_level(name: &str) -> Result<Level, UnknownLevel> {
    ALL_LEVELS
        .iter()
        .copied()
        .find(|level| level.name() == name)
        .ok_or_else(|| UnknownLevel::Name(name.to_string()))
}

/// Level to canonical name. Mirror of [`name_to_level`].
pub fn level_to_name(level: Level) -> &'static str {
    level.name()
}

/// Tolerant parse for user-facing inputs: accepts a canonical name in any
/// case ("warning") or a decimal severity value ("30").
pub fn parse_level(spec: &str) -> Result<Level, UnknownLevel> {
    let spec = spec.trim();
    if let Ok(value) = spec.parse::<u32>() {
        return Level::from_value(value);
    }
    name_to_level(&spec.to_ascii_uppercase())
}

/// A level argument as callers hand it over: an enum value, a name, or a
/// raw numeric severity. Used by the level-setter chain so callers do not
/// have to normalize first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSpec {
    Level(Level),
    Name(String),
    Value(u32),
}

impl LevelSpec {
    /// Round-trip the spec through the name/value bridge, yielding the
    /// canonical level or a lookup error.
    pub fn resolve(&self) -> Result<Level, UnknownLevel> {
        match self {
            LevelSpec::Level(level) => Ok(*level),
            LevelSpec::Name(name) => parse_level(name),
            LevelSpec::Value(value) => Level::from_value(*value),
        }
    }
}

impl From<Level> for LevelSpec {
    fn from(level: Level) -> Self {
        LevelSpec::Level(level)
    }
}

impl From<&str> for LevelSpec {
    fn from(name: &str) -> Self {
        LevelSpec::Name(name.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(name: String) -> Self {
        LevelSpec::Name(name)
    }
}

impl From<u32> for LevelSpec {
    fn from(value: u32) -> Self {
        LevelSpec::Value(value)
    }
}
