//! Typed model of the logging configuration file.
//!
//! Config files use the classic three-registry INI layout: `[loggers]`,
//! `[handlers]` and `[formatters]` each carry a `keys` list, and every key
//! names a `logger_*`, `handler_*` or `formatter_*` section. Parsing turns
//! the file into plain structs up front, so every reference and value is
//! checked before the loader touches any live logger.
//!
//! ```ini
//! [loggers]
//! keys = root,rigkit
//!
//! [handlers]
//! keys = console
//!
//! [formatters]
//! keys = standard
//!
//! [logger_root]
//! handlers = console
//! remove_existing_handlers = 0
//!
//! [logger_rigkit]
//! qualname = rigkit
//! level = INFO
//! handlers =
//!
//! [handler_console]
//! class = console
//! stream = stdout
//! formatter = standard
//!
//! [formatter_standard]
//! format = {level}:{logger}:{message}
//! ```

pub mod loader;

pub use loader::LoadOptions;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat, Source, Value, ValueKind};
use thiserror::Error;

use crate::level::{parse_level, Level};
use crate::registry::formatter::{FormatTemplate, DEFAULT_DATE_FORMAT, DEFAULT_FORMAT};
use crate::registry::handler::{ConsoleStream, FileMode};

/// Section listing logger keys; must include `root`.
const LOGGERS_SECTION: &str = "loggers";
const HANDLERS_SECTION: &str = "handlers";
const FORMATTERS_SECTION: &str = "formatters";
/// Options in this section act as fallbacks for every other section.
const DEFAULT_SECTION: &str = "DEFAULT";

/// Failure while locating, reading or validating a logging config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find a logging config file; searched {searched:?}")]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read logging config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("logging config {path}: missing section [{section}]")]
    MissingSection { path: PathBuf, section: String },

    #[error("logging config {path}: section [{section}] has no option '{option}'")]
    MissingOption { path: PathBuf, section: String, option: String },

    #[error(
        "logging config {path}: invalid value '{value}' for '{option}' in [{section}]: {reason}"
    )]
    InvalidValue {
        path: PathBuf,
        section: String,
        option: String,
        value: String,
        reason: String,
    },

    #[error("failed to open log file {path} for handler '{handler}': {source}")]
    HandlerIo {
        handler: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One `formatter_*` section.
#[derive(Debug, Clone)]
pub struct FormatterConf {
    pub name: String,
    pub format: String,
    pub datefmt: String,
}

impl FormatterConf {
    pub fn template(&self) -> FormatTemplate {
        FormatTemplate::new(&self.format, &self.datefmt)
    }
}

/// What a configured handler writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    Console { stream: ConsoleStream },
    File { filename: PathBuf, mode: FileMode },
    Null,
}

/// One `handler_*` section.
#[derive(Debug, Clone)]
pub struct HandlerConf {
    pub name: String,
    pub kind: HandlerKind,
    /// Per-handler threshold on top of the logger-side check.
    pub level: Level,
    /// Name of a declared formatter; the default template when absent.
    pub formatter: Option<String>,
}

/// One `logger_*` section. The root section uses the qualname `root`.
#[derive(Debug, Clone)]
pub struct LoggerConf {
    /// Dotted logger name this section configures.
    pub qualname: String,
    /// Present only when the section sets `level`.
    pub level: Option<Level>,
    /// Handler names to attach, in declaration order.
    pub handlers: Vec<String>,
    pub propagate: bool,
    /// When false, handlers present before the load survive it.
    pub remove_existing_handlers: bool,
}

/// A fully parsed and cross-checked configuration file.
#[derive(Debug, Clone)]
pub struct LoggingConf {
    pub formatters: HashMap<String, FormatterConf>,
    pub handlers: HashMap<String, HandlerConf>,
    pub root: LoggerConf,
    /// Non-root logger sections in `keys` order.
    pub loggers: Vec<LoggerConf>,
}

impl LoggingConf {
    /// Template for a handler's formatter reference. Falls back to the
    /// default template when the handler names none.
    pub fn template_for(&self, handler: &HandlerConf) -> FormatTemplate {
        handler
            .formatter
            .as_ref()
            .and_then(|name| self.formatters.get(name))
            .map(|f| f.template())
            .unwrap_or_default()
    }
}

/// Flat view of the INI file: sections plus the fallback option table.
struct RawConf {
    path: PathBuf,
    sections: HashMap<String, HashMap<String, String>>,
    defaults: HashMap<String, String>,
}

impl RawConf {
    fn load(path: &Path, defaults: Option<&HashMap<String, String>>) -> Result<Self, ConfigError> {
        let read_err = |source| ConfigError::Read { path: path.to_path_buf(), source };

        let built = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()
            .map_err(read_err)?;
        let top = built.collect().map_err(read_err)?;

        let mut sections = HashMap::new();
        let mut merged_defaults = defaults.cloned().unwrap_or_default();
        for (name, value) in top {
            if matches!(value.kind, ValueKind::Table(_)) {
                let table = value.into_table().map_err(read_err)?;
                let mut options = HashMap::new();
                for (key, option) in table {
                    options.insert(key, coerce_string(path, option)?);
                }
                if name.eq_ignore_ascii_case(DEFAULT_SECTION) {
                    // File-level defaults override programmatic ones.
                    merged_defaults.extend(options);
                } else {
                    sections.insert(name, options);
                }
            } else {
                // Option outside any section header.
                merged_defaults.insert(name, coerce_string(path, value)?);
            }
        }

        Ok(Self { path: path.to_path_buf(), sections, defaults: merged_defaults })
    }

    fn section(&self, name: &str) -> Result<&HashMap<String, String>, ConfigError> {
        self.sections.get(name).ok_or_else(|| ConfigError::MissingSection {
            path: self.path.clone(),
            section: name.to_string(),
        })
    }

    /// Option from the section, falling back to the defaults table.
    fn option(&self, section: &str, key: &str) -> Option<String> {
        self.sections
            .get(section)
            .and_then(|options| options.get(key))
            .or_else(|| self.defaults.get(key))
            .cloned()
    }

    fn required(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        self.option(section, key).ok_or_else(|| ConfigError::MissingOption {
            path: self.path.clone(),
            section: section.to_string(),
            option: key.to_string(),
        })
    }

    /// The comma-separated `keys` option of a registry section.
    fn keys_list(&self, section: &str) -> Result<Vec<String>, ConfigError> {
        self.section(section)?;
        Ok(split_list(&self.required(section, "keys")?))
    }

    fn invalid(&self, section: &str, option: &str, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            path: self.path.clone(),
            section: section.to_string(),
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn bool_option(&self, section: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.option(section, key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(self.invalid(section, key, &raw, "expected a boolean")),
            },
        }
    }

    fn level_option(&self, section: &str, key: &str) -> Result<Option<Level>, ConfigError> {
        match self.option(section, key) {
            None => Ok(None),
            Some(raw) => parse_level(&raw)
                .map(Some)
                .map_err(|e| self.invalid(section, key, &raw, e.to_string())),
        }
    }
}

fn coerce_string(path: &Path, value: Value) -> Result<String, ConfigError> {
    value.into_string().map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Read and validate a logging config file.
///
/// # Arguments
///
/// * `path` - the INI file to read
/// * `defaults` - fallback options applied to every section, merged under
///   any `[DEFAULT]` section in the file itself
///
/// # Returns
///
/// The typed configuration, or the first structural problem found.
pub fn parse_logging_conf(
    path: &Path,
    defaults: Option<&HashMap<String, String>>,
) -> Result<LoggingConf, ConfigError> {
    let raw = RawConf::load(path, defaults)?;

    let mut formatters = HashMap::new();
    for name in raw.keys_list(FORMATTERS_SECTION)? {
        let section = format!("formatter_{name}");
        raw.section(&section)?;
        let format = raw
            .option(&section, "format")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FORMAT.to_string());
        let datefmt = raw
            .option(&section, "datefmt")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
        formatters.insert(name.clone(), FormatterConf { name, format, datefmt });
    }

    let mut handlers = HashMap::new();
    for name in raw.keys_list(HANDLERS_SECTION)? {
        let section = format!("handler_{name}");
        raw.section(&section)?;
        let class = raw.required(&section, "class")?;
        let kind = match class.trim().to_ascii_lowercase().as_str() {
            "console" => {
                let stream = match raw.option(&section, "stream") {
                    None => ConsoleStream::Stderr,
                    Some(raw_stream) => match raw_stream.trim().to_ascii_lowercase().as_str() {
                        "stdout" => ConsoleStream::Stdout,
                        "stderr" => ConsoleStream::Stderr,
                        _ => {
                            return Err(raw.invalid(
                                &section,
                                "stream",
                                &raw_stream,
                                "expected stdout or stderr",
                            ));
                        }
                    },
                };
                HandlerKind::Console { stream }
            }
            "file" => {
                let filename = PathBuf::from(raw.required(&section, "filename")?);
                let mode = match raw.option(&section, "mode") {
                    None => FileMode::Append,
                    Some(raw_mode) => match raw_mode.trim().to_ascii_lowercase().as_str() {
                        "append" => FileMode::Append,
                        "truncate" => FileMode::Truncate,
                        _ => {
                            return Err(raw.invalid(
                                &section,
                                "mode",
                                &raw_mode,
                                "expected append or truncate",
                            ));
                        }
                    },
                };
                HandlerKind::File { filename, mode }
            }
            "null" => HandlerKind::Null,
            _ => {
                return Err(raw.invalid(
                    &section,
                    "class",
                    &class,
                    "expected console, file, or null",
                ));
            }
        };
        let level = raw.level_option(&section, "level")?.unwrap_or(Level::Notset);
        let formatter = raw.option(&section, "formatter").filter(|s| !s.trim().is_empty());
        if let Some(formatter_name) = &formatter {
            if !formatters.contains_key(formatter_name) {
                return Err(raw.invalid(
                    &section,
                    "formatter",
                    formatter_name,
                    "references an undeclared formatter",
                ));
            }
        }
        handlers.insert(name.clone(), HandlerConf { name, kind, level, formatter });
    }

    let logger_keys = raw.keys_list(LOGGERS_SECTION)?;
    if !logger_keys.iter().any(|key| key == "root") {
        return Err(raw.invalid(
            LOGGERS_SECTION,
            "keys",
            &logger_keys.join(","),
            "must include 'root'",
        ));
    }

    let mut root = None;
    let mut loggers = Vec::new();
    for key in &logger_keys {
        let section = format!("logger_{key}");
        raw.section(&section)?;
        let is_root = key == "root";
        let qualname = if is_root { "root".to_string() } else { raw.required(&section, "qualname")? };
        let conf = LoggerConf {
            qualname,
            level: raw.level_option(&section, "level")?,
            handlers: split_list(&raw.required(&section, "handlers")?),
            propagate: raw.bool_option(&section, "propagate", true)?,
            remove_existing_handlers: raw.bool_option(&section, "remove_existing_handlers", true)?,
        };
        for handler_name in &conf.handlers {
            if !handlers.contains_key(handler_name) {
                return Err(raw.invalid(
                    &section,
                    "handlers",
                    handler_name,
                    "references an undeclared handler",
                ));
            }
        }
        if is_root {
            root = Some(conf);
        } else {
            loggers.push(conf);
        }
    }
    // keys included "root", so the section was parsed above
    let root = root.ok_or_else(|| ConfigError::MissingSection {
        path: raw.path.clone(),
        section: "logger_root".to_string(),
    })?;

    Ok(LoggingConf { formatters, handlers, root, loggers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_conf(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("logging.conf");
        fs::write(&path, text).unwrap();
        path
    }

    const FULL_SAMPLE: &str = "\
[loggers]
keys = root, rigkit

[handlers]
keys = console, logfile, quiet

[formatters]
keys = standard, bare

[logger_root]
handlers = console
remove_existing_handlers = 0

[logger_rigkit]
qualname = rigkit
level = INFO
handlers = logfile, quiet
propagate = 0

[handler_console]
class = console
stream = stdout
level = WARNING
formatter = standard

[handler_logfile]
class = file
filename = rigkit.log
mode = truncate
formatter = bare

[handler_quiet]
class = null

[formatter_standard]
format = {time} {level} {logger} {message}
datefmt = %H:%M:%S

[formatter_bare]
format =
datefmt =
";

    #[test]
    fn test_parse_full_sample() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, FULL_SAMPLE);
        let conf = parse_logging_conf(&path, None).unwrap();

        assert_eq!(conf.formatters.len(), 2);
        let standard = &conf.formatters["standard"];
        assert_eq!(standard.format, "{time} {level} {logger} {message}");
        assert_eq!(standard.datefmt, "%H:%M:%S");
        // Empty options fall back to the defaults.
        let bare = &conf.formatters["bare"];
        assert_eq!(bare.format, DEFAULT_FORMAT);
        assert_eq!(bare.datefmt, DEFAULT_DATE_FORMAT);

        let console = &conf.handlers["console"];
        assert_eq!(console.kind, HandlerKind::Console { stream: ConsoleStream::Stdout });
        assert_eq!(console.level, Level::Warning);
        assert_eq!(console.formatter.as_deref(), Some("standard"));
        assert_eq!(
            conf.template_for(console).format_pattern(),
            "{time} {level} {logger} {message}"
        );

        let logfile = &conf.handlers["logfile"];
        assert_eq!(
            logfile.kind,
            HandlerKind::File { filename: PathBuf::from("rigkit.log"), mode: FileMode::Truncate }
        );
        assert_eq!(logfile.level, Level::Notset);
        let quiet = &conf.handlers["quiet"];
        assert_eq!(quiet.kind, HandlerKind::Null);
        // No formatter reference means the default template.
        assert_eq!(conf.template_for(quiet).format_pattern(), DEFAULT_FORMAT);

        assert_eq!(conf.root.qualname, "root");
        assert_eq!(conf.root.level, None);
        assert_eq!(conf.root.handlers, vec!["console".to_string()]);
        assert!(!conf.root.remove_existing_handlers);

        assert_eq!(conf.loggers.len(), 1);
        let rigkit = &conf.loggers[0];
        assert_eq!(rigkit.qualname, "rigkit");
        assert_eq!(rigkit.level, Some(Level::Info));
        assert_eq!(rigkit.handlers, vec!["logfile".to_string(), "quiet".to_string()]);
        assert!(!rigkit.propagate);
        assert!(rigkit.remove_existing_handlers);
    }

    #[test]
    fn test_missing_loggers_section() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, "[handlers]\nkeys =\n\n[formatters]\nkeys =\n");
        let err = parse_logging_conf(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { section, .. } if section == "loggers"));
    }

    #[test]
    fn test_root_must_be_listed() {
        let dir = TempDir::new().unwrap();
        let text = "\
[loggers]
keys = rigkit

[handlers]
keys =

[formatters]
keys =

[logger_rigkit]
qualname = rigkit
handlers =
";
        let path = write_conf(&dir, text);
        let err = parse_logging_conf(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { option, .. } if option == "keys"));
    }

    #[test]
    fn test_qualname_required_for_named_loggers() {
        let dir = TempDir::new().unwrap();
        let text = "\
[loggers]
keys = root, rigkit

[handlers]
keys =

[formatters]
keys =

[logger_root]
handlers =

[logger_rigkit]
handlers =
";
        let path = write_conf(&dir, text);
        let err = parse_logging_conf(&path, None).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingOption { option, section, .. }
                if option == "qualname" && section == "logger_rigkit")
        );
    }

    #[test]
    fn test_dangling_handler_reference() {
        let dir = TempDir::new().unwrap();
        let text = "\
[loggers]
keys = root

[handlers]
keys =

[formatters]
keys =

[logger_root]
handlers = ghost
";
        let path = write_conf(&dir, text);
        let err = parse_logging_conf(&path, None).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { value, .. } if value == "ghost")
        );
    }

    #[test]
    fn test_unknown_handler_class() {
        let dir = TempDir::new().unwrap();
        let text = "\
[loggers]
keys = root

[handlers]
keys = smtp

[formatters]
keys =

[logger_root]
handlers =

[handler_smtp]
class = smtp
";
        let path = write_conf(&dir, text);
        let err = parse_logging_conf(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { option, .. } if option == "class"));
    }

    #[test]
    fn test_file_handler_requires_filename() {
        let dir = TempDir::new().unwrap();
        let text = "\
[loggers]
keys = root

[handlers]
keys = logfile

[formatters]
keys =

[logger_root]
handlers =

[handler_logfile]
class = file
";
        let path = write_conf(&dir, text);
        let err = parse_logging_conf(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption { option, .. } if option == "filename"));
    }

    #[test]
    fn test_defaults_fill_missing_options() {
        let dir = TempDir::new().unwrap();
        let text = "\
[loggers]
keys = root

[handlers]
keys = console

[formatters]
keys =

[logger_root]
handlers = console

[handler_console]
class = console
";
        let path = write_conf(&dir, text);
        let mut defaults = HashMap::new();
        defaults.insert("stream".to_string(), "stdout".to_string());
        defaults.insert("level".to_string(), "ERROR".to_string());
        let conf = parse_logging_conf(&path, Some(&defaults)).unwrap();

        let console = &conf.handlers["console"];
        assert_eq!(console.kind, HandlerKind::Console { stream: ConsoleStream::Stdout });
        assert_eq!(console.level, Level::Error);
        // The defaults leak into logger sections too.
        assert_eq!(conf.root.level, Some(Level::Error));
    }

    #[test]
    fn test_default_section_in_file_wins_over_programmatic() {
        let dir = TempDir::new().unwrap();
        let text = "\
[DEFAULT]
level = DEBUG

[loggers]
keys = root

[handlers]
keys =

[formatters]
keys =

[logger_root]
handlers =
";
        let path = write_conf(&dir, text);
        let mut defaults = HashMap::new();
        defaults.insert("level".to_string(), "ERROR".to_string());
        let conf = parse_logging_conf(&path, Some(&defaults)).unwrap();
        assert_eq!(conf.root.level, Some(Level::Debug));
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.conf");
        let err = parse_logging_conf(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
