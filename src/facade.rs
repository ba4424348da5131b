//! Bridge from the `log` facade into the registry.
//!
//! Rust modules inside the plugin log through the usual `log` macros. The
//! facade maps each record's target onto a registry logger, `::` path
//! separators becoming the registry's dots, so `log::warn!` from module
//! `rigkit::io` lands on the `rigkit.io` logger and follows its handlers
//! and levels like any other record.

use std::sync::Arc;

use log::{Log, Metadata, Record};

use crate::level::Level;
use crate::registry::logger::normalize_logger_name;
use crate::registry::LogRegistry;

/// Registry-backed implementation of `log::Log`.
pub struct RegistryLogFacade {
    registry: Arc<LogRegistry>,
}

impl RegistryLogFacade {
    pub fn new(registry: Arc<LogRegistry>) -> Self {
        Self { registry }
    }

    fn logger_name(target: &str) -> String {
        normalize_logger_name(&target.replace("::", ".")).to_string()
    }
}

/// The facade has five levels and no NOTSET; `Trace` collapses into DEBUG.
fn convert_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warning,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}

impl Log for RegistryLogFacade {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let name = Self::logger_name(metadata.target());
        self.registry.would_log(&name, convert_level(metadata.level()))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let name = Self::logger_name(record.target());
        self.registry.submit(&name, convert_level(record.level()), record.args().to_string());
    }

    fn flush(&self) {
        self.registry.flush_all();
    }
}

/// Route the process-global `log` macros through a registry.
///
/// The `log` crate accepts exactly one global logger, so this can succeed
/// only once per process; later calls report [`log::SetLoggerError`].
pub fn install_log_facade(registry: Arc<LogRegistry>) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(RegistryLogFacade::new(registry)))?;
    // Filtering happens in the registry, so the static gate stays open.
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
