// Output sinks attached to loggers.
//
// Handlers are shared through `Arc<dyn Handler>`; the loader's preservation
// logic and `Logger::add_handler` deduplicate by `Arc` pointer identity.
// Emit paths swallow I/O failures: logging is fire-and-forget and must never
// take the host application down.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::host::HostSink;
use crate::level::Level;
use crate::registry::formatter::FormatTemplate;
use crate::registry::LogRecord;

/// An output sink for log records.
pub trait Handler: Send + Sync {
    /// Threshold below which this handler ignores records. NOTSET lets
    /// everything through.
    fn level(&self) -> Level {
        Level::Notset
    }

    /// Write one record. Implementations swallow their own I/O failures.
    fn emit(&self, record: &LogRecord);

    /// Flush buffered output. Default: nothing to flush.
    fn flush(&self) {}

    /// Level-gated entry point used by record dispatch.
    fn handle(&self, record: &LogRecord) {
        if record.level >= self.level() {
            self.emit(record);
        }
    }
}

/// Which standard stream a [`ConsoleHandler`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

/// Handler writing formatted records to stdout or stderr.
pub struct ConsoleHandler {
    stream: ConsoleStream,
    level: Level,
    template: FormatTemplate,
}

impl ConsoleHandler {
    pub fn new(stream: ConsoleStream, level: Level, template: FormatTemplate) -> Self {
        Self { stream, level, template }
    }

    /// Stderr handler with no threshold and the default template.
    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr, Level::Notset, FormatTemplate::default())
    }
}

impl Handler for ConsoleHandler {
    fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, record: &LogRecord) {
        let line = self.template.format_record(record);
        match self.stream {
            ConsoleStream::Stdout => {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{}", line);
            }
            ConsoleStream::Stderr => {
                let mut out = io::stderr().lock();
                let _ = writeln!(out, "{}", line);
            }
        }
    }

    fn flush(&self) {
        match self.stream {
            ConsoleStream::Stdout => {
                let _ = io::stdout().lock().flush();
            }
            ConsoleStream::Stderr => {
                let _ = io::stderr().lock().flush();
            }
        }
    }
}

/// How a [`FileHandler`] opens its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Append,
    Truncate,
}

/// Handler appending formatted records to a file.
pub struct FileHandler {
    path: PathBuf,
    file: Mutex<File>,
    level: Level,
    template: FormatTemplate,
}

impl FileHandler {
    /// Open the target file. Creation and permission failures propagate so
    /// the config loader can report which handler could not be built.
    pub fn open(
        path: impl Into<PathBuf>,
        mode: FileMode,
        level: Level,
        template: FormatTemplate,
    ) -> io::Result<Self> {
        let path = path.into();
        let file = match mode {
            FileMode::Append => OpenOptions::new().create(true).append(true).open(&path)?,
            FileMode::Truncate => File::create(&path)?,
        };
        Ok(Self { path, file: Mutex::new(file), level, template })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Handler for FileHandler {
    fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, record: &LogRecord) {
        let line = self.template.format_record(record);
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(file, "{}", line);
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = file.flush();
    }
}

/// Handler that discards everything. Declarable from config to silence a
/// subtree without touching its propagation.
#[derive(Debug, Default)]
pub struct NullHandler;

impl Handler for NullHandler {
    fn emit(&self, _record: &LogRecord) {}
}

/// Handler forwarding formatted records into the host's output stream.
pub struct HostOutputHandler {
    sink: Arc<dyn HostSink>,
    level: Level,
    template: FormatTemplate,
}

impl HostOutputHandler {
    pub fn new(sink: Arc<dyn HostSink>, level: Level, template: FormatTemplate) -> Self {
        Self { sink, level, template }
    }
}

impl Handler for HostOutputHandler {
    fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, record: &LogRecord) {
        self.sink.write_line(&self.template.format_record(record));
    }

    fn flush(&self) {
        self.sink.flush();
    }
}

/// Handler retaining records in memory for assertions.
///
/// Clones share the same backing store, so a test can keep one clone and
/// attach the other to a logger.
#[derive(Clone)]
pub struct MemoryHandler {
    level: Level,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryHandler {
    pub fn new(level: Level) -> Self {
        Self { level, records: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Copy of every record handled so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Just the message strings, in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Handler for MemoryHandler {
    fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, record: &LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
    }
}
