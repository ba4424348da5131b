// Record-to-text templates.
//
// A template is a literal string with `{time}`, `{level}`, `{logger}` and
// `{message}` tokens. The date pattern is chrono strftime syntax, applied to
// the record timestamp wherever `{time}` appears.

use chrono::format::StrftimeItems;

use crate::registry::LogRecord;

/// Render pattern used when a formatter section gives no `format`.
pub const DEFAULT_FORMAT: &str = "{level}:{logger}:{message}";

/// Date pattern used when a formatter section gives no `datefmt`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Immutable template describing how a record renders to text.
#[derive(Debug, Clone)]
pub struct FormatTemplate {
    format: String,
    datefmt: String,
}

impl FormatTemplate {
    /// Build a template from a render pattern and a chrono date pattern.
    /// An unparseable date pattern falls back to [`DEFAULT_DATE_FORMAT`] so
    /// that rendering can never panic inside the host application.
    pub fn new(format: impl Into<String>, datefmt: impl Into<String>) -> Self {
        let datefmt = datefmt.into();
        let datefmt = if datefmt_is_valid(&datefmt) {
            datefmt
        } else {
            DEFAULT_DATE_FORMAT.to_string()
        };
        Self { format: format.into(), datefmt }
    }

    /// Render pattern this template was built with.
    pub fn format_pattern(&self) -> &str {
        &self.format
    }

    /// Render a record to its final text, without a trailing newline.
    pub fn format_record(&self, record: &LogRecord) -> String {
        let time = record.timestamp.format(&self.datefmt).to_string();
        // The message is substituted last so tokens inside user text stay
        // literal instead of being expanded.
        self.format
            .replace("{time}", &time)
            .replace("{level}", record.level.name())
            .replace("{logger}", &record.logger)
            .replace("{message}", &record.message)
    }
}

impl Default for FormatTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT, DEFAULT_DATE_FORMAT)
    }
}

/// Check that chrono can interpret a strftime pattern.
pub(crate) fn datefmt_is_valid(pattern: &str) -> bool {
    StrftimeItems::new(pattern).parse().is_ok()
}
