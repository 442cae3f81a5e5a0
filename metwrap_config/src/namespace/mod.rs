//! Configuration namespace snapshot and the read capability the core uses
//!
//! The namespace is built once by [`loader::NamespaceLoader`] and then only
//! read. Field resolution goes through [`ConfigSource`] so callers can plug in
//! any key/value store.

pub mod loader;

use crate::config::constants::compile_time::namespace::{DEFAULT_SECTION, MAX_INTERPOLATION_DEPTH};
use crate::logging::codes::{self, Code};
use std::collections::HashMap;
use std::path::PathBuf;

pub use loader::NamespaceLoader;

#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    #[error("Unsupported {kind} value for '{key}'")]
    UnsupportedValue { key: String, kind: String },

    #[error("Invalid override '{text}', expected [SECTION.]KEY=VALUE")]
    InvalidOverride { text: String },

    #[error("Interpolation of '{key}' exceeds depth {MAX_INTERPOLATION_DEPTH}")]
    InterpolationTooDeep { key: String },
}

impl NamespaceError {
    pub fn error_code(&self) -> Code {
        match self {
            NamespaceError::FileNotFound { .. } => codes::namespace::FILE_NOT_FOUND,
            NamespaceError::Io { .. } => codes::namespace::IO_ERROR,
            NamespaceError::InvalidToml { .. } => codes::namespace::INVALID_TOML,
            NamespaceError::UnsupportedValue { .. } => codes::namespace::UNSUPPORTED_VALUE,
            NamespaceError::InvalidOverride { .. } => codes::namespace::INVALID_OVERRIDE,
            NamespaceError::InterpolationTooDeep { .. } => {
                codes::namespace::INTERPOLATION_TOO_DEEP
            }
        }
    }
}

/// Read access to a sectioned key/value store
pub trait ConfigSource {
    /// Value exactly as stored, without `{...}` substitution
    fn get_string_raw(&self, section: &str, key: &str) -> Option<String>;

    /// Value with `{KEY}` and `{ENV[NAME]}` references substituted
    fn get_string(&self, section: &str, key: &str) -> Result<Option<String>, NamespaceError>;

    /// Keys of `section` in insertion order
    fn all_keys(&self, section: &str) -> Vec<String>;

    fn has_option(&self, section: &str, key: &str) -> bool {
        self.get_string_raw(section, key).is_some()
    }
}

#[derive(Debug, Clone, Default)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.positions.get(key) {
            Some(&position) => self.entries[position].1 = value.to_string(),
            None => {
                self.positions.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value.to_string()));
            }
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }
}

/// Ordered, case-sensitive mapping of section to key to string value
#[derive(Debug, Clone, Default)]
pub struct ConfigNamespace {
    sections: Vec<Section>,
    section_positions: HashMap<String, usize>,
}

impl ConfigNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a namespace holding `pairs` in the default section
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut namespace = Self::new();
        for (key, value) in pairs {
            namespace.set(DEFAULT_SECTION, key.as_ref(), value.as_ref());
        }
        namespace
    }

    /// Set a value; an existing key keeps its position
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let position = match self.section_positions.get(section) {
            Some(&position) => position,
            None => {
                self.section_positions
                    .insert(section.to_string(), self.sections.len());
                self.sections.push(Section::new(section));
                self.sections.len() - 1
            }
        };
        self.sections[position].set(key, value);
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section_positions
            .get(section)
            .and_then(|&position| self.sections[position].get(key))
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.name.as_str())
    }

    /// `(key, value)` pairs of a section in insertion order
    pub fn entries(&self, section: &str) -> impl Iterator<Item = (&str, &str)> {
        self.section_positions
            .get(section)
            .map(|&position| self.sections[position].entries.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|section| section.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look in `section` first, then in the default section
    fn lookup(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key)
            .or_else(|| self.get(DEFAULT_SECTION, key))
    }

    fn interpolate(
        &self,
        section: &str,
        key: &str,
        value: &str,
        depth: usize,
    ) -> Result<String, NamespaceError> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(NamespaceError::InterpolationTooDeep {
                key: key.to_string(),
            });
        }

        let mut output = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(open) = rest.find('{') {
            output.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            // Only innermost `{...}` groups are references
            let close = match after.find(['{', '}']) {
                Some(position) if after[position..].starts_with('}') => position,
                _ => {
                    output.push('{');
                    rest = after;
                    continue;
                }
            };

            let reference = &after[..close];
            rest = &after[close + 1..];

            if let Some(variable) = reference
                .strip_prefix("ENV[")
                .and_then(|name| name.strip_suffix(']'))
            {
                match std::env::var(variable) {
                    Ok(resolved) => output.push_str(&resolved),
                    Err(_) => {
                        log::warn!(
                            "Environment variable {} referenced by {} is not set",
                            variable,
                            key
                        );
                        output.push('{');
                        output.push_str(reference);
                        output.push('}');
                    }
                }
            } else if let Some(referenced) = self.lookup(section, reference) {
                output.push_str(&self.interpolate(section, reference, referenced, depth + 1)?);
            } else {
                // Template tags such as {init?fmt=%Y} are left for later substitution
                output.push('{');
                output.push_str(reference);
                output.push('}');
            }
        }

        output.push_str(rest);
        Ok(output)
    }
}

impl ConfigSource for ConfigNamespace {
    fn get_string_raw(&self, section: &str, key: &str) -> Option<String> {
        self.get(section, key).map(str::to_string)
    }

    fn get_string(&self, section: &str, key: &str) -> Result<Option<String>, NamespaceError> {
        match self.get(section, key) {
            Some(value) => self.interpolate(section, key, value, 0).map(Some),
            None => Ok(None),
        }
    }

    fn all_keys(&self, section: &str) -> Vec<String> {
        self.entries(section).map(|(key, _)| key.to_string()).collect()
    }
}
