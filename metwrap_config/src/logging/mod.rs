//! Logging for the metwrap field engine
//!
//! Every diagnostic carries a [`Code`] with registered metadata. Events go to
//! the global [`LoggingService`] when one is installed and to the `log` facade
//! otherwise, so library callers never have to initialise anything.

pub mod codes;
pub mod events;
pub mod macros;
pub mod service;

use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{FacadeLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

use crate::config::RuntimeConfig;

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

/// Install the global logging service built from runtime preferences
pub fn init_global_logging(config: &RuntimeConfig) -> Result<(), String> {
    init_global_logging_with_service(Arc::new(LoggingService::with_config(config)))
}

/// Install a custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

/// Route an event to the global service, falling back to the `log` facade
pub fn dispatch(event: LogEvent) {
    match try_get_global_logger() {
        Some(logger) => logger.log_event(event),
        None => FacadeLogger::default().log(&event),
    }
}

/// Attach context pairs and dispatch (used by the logging macros)
pub fn log_with_context(mut event: LogEvent, context: Vec<(&str, String)>) {
    for (key, value) in context {
        event = event.with_context(key, &value);
    }
    dispatch(event);
}

/// Memory logger installed as the global service for the test binary
#[cfg(test)]
pub(crate) fn test_memory_logger() -> Arc<MemoryLogger> {
    static MEMORY: OnceLock<Arc<MemoryLogger>> = OnceLock::new();

    MEMORY
        .get_or_init(|| {
            let logger = Arc::new(MemoryLogger::new());
            let service = LoggingService::new(logger.clone(), LogLevel::Debug);
            // Nothing else installs a global service under test
            let _ = init_global_logging_with_service(Arc::new(service));
            logger
        })
        .clone()
}
