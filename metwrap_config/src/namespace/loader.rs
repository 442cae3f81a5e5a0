//! Layered TOML loader producing a [`ConfigNamespace`]
//!
//! Top-level tables become sections, top-level scalars land in the default
//! section. Files are applied in order so later files override earlier ones,
//! and `[SECTION.]KEY=VALUE` overrides are applied last.

use super::{ConfigNamespace, NamespaceError};
use crate::config::constants::compile_time::namespace::{CONFIG_INPUT_KEY, DEFAULT_SECTION};
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct NamespaceLoader {
    files: Vec<PathBuf>,
    overrides: Vec<String>,
}

impl NamespaceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn with_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_override(mut self, assignment: impl Into<String>) -> Self {
        self.overrides.push(assignment.into());
        self
    }

    pub fn with_overrides<I, S>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.extend(assignments.into_iter().map(Into::into));
        self
    }

    /// Read every file and override into a fresh namespace
    pub fn load(&self) -> Result<ConfigNamespace, NamespaceError> {
        let mut namespace = ConfigNamespace::new();

        for path in &self.files {
            let text = read_file(path)?;
            merge_toml(&mut namespace, &text, path)?;
            log_debug!("Merged configuration file", "path" => path.display());
        }

        if !self.files.is_empty() {
            let inputs: Vec<String> = self
                .files
                .iter()
                .map(|path| path.display().to_string())
                .collect();
            namespace.set(DEFAULT_SECTION, CONFIG_INPUT_KEY, &inputs.join(","));
        }

        for assignment in &self.overrides {
            apply_override(&mut namespace, assignment)?;
        }

        log_success!(
            codes::success::NAMESPACE_LOADED,
            "Configuration namespace loaded",
            "files" => self.files.len(),
            "keys" => namespace.len()
        );

        Ok(namespace)
    }
}

fn read_file(path: &Path) -> Result<String, NamespaceError> {
    if !path.exists() {
        let error = NamespaceError::FileNotFound {
            path: path.to_path_buf(),
        };
        log_error!(error.error_code(), "Configuration file not found", "path" => path.display());
        return Err(error);
    }

    fs::read_to_string(path).map_err(|source| {
        let error = NamespaceError::Io {
            path: path.to_path_buf(),
            source,
        };
        log_error!(error.error_code(), error.to_string());
        error
    })
}

/// Merge TOML `text` into `namespace`; `origin` is used in error messages
pub fn merge_toml(
    namespace: &mut ConfigNamespace,
    text: &str,
    origin: &Path,
) -> Result<(), NamespaceError> {
    let table = text
        .parse::<toml::Table>()
        .map_err(|error| NamespaceError::InvalidToml {
            path: origin.to_path_buf(),
            message: error.message().to_string(),
        })?;

    for (key, value) in &table {
        match value {
            toml::Value::Table(section) => {
                for (section_key, section_value) in section {
                    let rendered = render_value(section_key, section_value)?;
                    namespace.set(key, section_key, &rendered);
                }
            }
            other => {
                let rendered = render_value(key, other)?;
                namespace.set(DEFAULT_SECTION, key, &rendered);
            }
        }
    }

    Ok(())
}

/// Flatten a TOML value into the string form the namespace stores
fn render_value(key: &str, value: &toml::Value) -> Result<String, NamespaceError> {
    match value {
        toml::Value::String(text) => Ok(text.clone()),
        toml::Value::Integer(number) => Ok(number.to_string()),
        toml::Value::Float(number) => Ok(number.to_string()),
        toml::Value::Boolean(flag) => Ok(flag.to_string()),
        toml::Value::Datetime(datetime) => Ok(datetime.to_string()),
        toml::Value::Array(items) => {
            let rendered = items
                .iter()
                .map(|item| match item {
                    toml::Value::Array(_) | toml::Value::Table(_) => {
                        Err(NamespaceError::UnsupportedValue {
                            key: key.to_string(),
                            kind: "nested array".to_string(),
                        })
                    }
                    scalar => render_value(key, scalar),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rendered.join(","))
        }
        toml::Value::Table(_) => Err(NamespaceError::UnsupportedValue {
            key: key.to_string(),
            kind: "table".to_string(),
        }),
    }
}

/// Apply one `[SECTION.]KEY=VALUE` assignment
pub fn apply_override(
    namespace: &mut ConfigNamespace,
    assignment: &str,
) -> Result<(), NamespaceError> {
    let invalid = || NamespaceError::InvalidOverride {
        text: assignment.to_string(),
    };

    let (target, value) = assignment.split_once('=').ok_or_else(invalid)?;
    let (section, key) = match target.trim().split_once('.') {
        Some((section, key)) => (section.trim(), key.trim()),
        None => (DEFAULT_SECTION, target.trim()),
    };

    if key.is_empty() || section.is_empty() {
        return Err(invalid());
    }

    namespace.set(section, key, value.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ConfigSource;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sections_and_scalars() {
        let file = write_config(
            r#"
PROCESS_LIST = "GridStat"
FCST_VAR1_LEVELS = ["P500", "P750"]
LEAD_SECONDS = 3600

[dir]
OUTPUT_BASE = "/tmp/out"
"#,
        );

        let namespace = NamespaceLoader::new().with_file(file.path()).load().unwrap();

        assert_eq!(namespace.get("config", "PROCESS_LIST"), Some("GridStat"));
        assert_eq!(namespace.get("config", "FCST_VAR1_LEVELS"), Some("P500,P750"));
        assert_eq!(namespace.get("config", "LEAD_SECONDS"), Some("3600"));
        assert_eq!(namespace.get("dir", "OUTPUT_BASE"), Some("/tmp/out"));
        assert_eq!(
            namespace.get_string_raw("config", CONFIG_INPUT_KEY),
            Some(file.path().display().to_string())
        );
    }

    #[test]
    fn test_later_files_and_overrides_win() {
        let first = write_config("FCST_VAR1_NAME = \"TMP\"\nOBS_VAR1_NAME = \"TMP\"\n");
        let second = write_config("FCST_VAR1_NAME = \"RH\"\n");

        let namespace = NamespaceLoader::new()
            .with_files([first.path(), second.path()])
            .with_override("OBS_VAR1_NAME=DPT")
            .with_override("dir.OUTPUT_BASE = /out")
            .load()
            .unwrap();

        assert_eq!(namespace.get("config", "FCST_VAR1_NAME"), Some("RH"));
        assert_eq!(namespace.get("config", "OBS_VAR1_NAME"), Some("DPT"));
        assert_eq!(namespace.get("dir", "OUTPUT_BASE"), Some("/out"));
        assert_eq!(
            namespace.all_keys("config")[..2],
            ["FCST_VAR1_NAME".to_string(), "OBS_VAR1_NAME".to_string()]
        );

        let inputs = namespace.get("config", CONFIG_INPUT_KEY).unwrap();
        assert_eq!(inputs.split(',').count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = NamespaceLoader::new()
            .with_file("/nonexistent/metwrap.toml")
            .load();
        assert_matches!(result, Err(NamespaceError::FileNotFound { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("FCST_VAR1_NAME = \n");
        let result = NamespaceLoader::new().with_file(file.path()).load();

        let error = result.unwrap_err();
        assert_matches!(error, NamespaceError::InvalidToml { .. });
        assert_eq!(error.error_code(), codes::namespace::INVALID_TOML);
    }

    #[test]
    fn test_nested_tables_rejected() {
        let file = write_config("[dir]\n[dir.nested]\nA = 1\n");
        let result = NamespaceLoader::new().with_file(file.path()).load();
        assert_matches!(result, Err(NamespaceError::UnsupportedValue { .. }));
    }

    #[test]
    fn test_invalid_override() {
        let mut namespace = ConfigNamespace::new();
        assert_matches!(
            apply_override(&mut namespace, "NO_EQUALS_SIGN"),
            Err(NamespaceError::InvalidOverride { .. })
        );
        assert_matches!(
            apply_override(&mut namespace, "=value"),
            Err(NamespaceError::InvalidOverride { .. })
        );
        assert!(apply_override(&mut namespace, "KEY=").is_ok());
        assert_eq!(namespace.get("config", "KEY"), Some(""));
    }
}
