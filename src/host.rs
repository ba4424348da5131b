// Bridges to the host application's output streams.
//
// The host 3D application exposes its own script-output object. Some hosts
// hand out stream objects with no usable flush, so the sink trait makes
// flush a no-op by default and adapters never rely on it.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// One line of log output, delivered to wherever the host shows script
/// output. Implementations must be safe to call from any thread.
pub trait HostSink: Send + Sync {
    /// Write one already-formatted line.
    fn write_line(&self, line: &str);

    /// Flush buffered output. Default is a no-op so host stream objects
    /// without flush semantics are safe to wrap.
    fn flush(&self) {}
}

/// Stdout sink for standalone runs outside the host.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl HostSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stdout().lock().flush();
    }
}

/// Sink that retains every line in memory. Used by tests and by host-side
/// self-checks that want to inspect plugin log output.
#[derive(Clone, Default)]
pub struct CapturingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl HostSink for CapturingSink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
    }
}
