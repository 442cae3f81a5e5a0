//! Configuration module for the metwrap field engine
//!
//! Compile-time limits live in [`constants`]; user preferences that may be
//! changed per run live in [`runtime`] and are read from `METWRAP_*`
//! environment variables.

pub mod constants;
pub mod runtime;

pub use runtime::{LogLevel, RuntimeConfig};

/// Build information and configuration metadata
pub mod build_info {
    /// Crate version baked in at compile time
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!(
            "metwrap_config {} (limits: max range items {}, interpolation depth {})",
            version(),
            super::constants::compile_time::parsing::MAX_RANGE_ITEMS,
            super::constants::compile_time::namespace::MAX_INTERPOLATION_DEPTH,
        )
    }
}
