//! Regex discovery of numbered field keys

use super::{FieldAttribute, Role};
use crate::config::constants::compile_time::namespace::DEFAULT_SECTION;
use crate::logging::codes::{self, Code};
use crate::namespace::ConfigSource;
use crate::tools::Tool;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Positive field number from a `VAR<n>` key; orders numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldIndex(u64);

impl FieldIndex {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FieldIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FieldIndex {
    type Err = std::num::ParseIntError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        text.parse::<u64>().map(FieldIndex)
    }
}

impl Serialize for FieldIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Discovered indices with the identifiers seen for each, in key order
pub type IndexMap = BTreeMap<FieldIndex, Vec<Option<String>>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("Invalid key pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl IndexError {
    pub fn error_code(&self) -> Code {
        match self {
            IndexError::InvalidPattern { .. } => codes::fields::INVALID_INDEX_PATTERN,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, IndexError> {
    Regex::new(pattern).map_err(|error| IndexError::InvalidPattern {
        pattern: pattern.to_string(),
        message: error.to_string(),
    })
}

/// Apply `pattern` to every key of `section` and group matches by index
///
/// Keys whose index group does not hold a number are skipped.
pub fn find_indices<S: ConfigSource + ?Sized>(
    pattern: &Regex,
    source: &S,
    section: &str,
    index_group: usize,
    id_group: Option<usize>,
) -> IndexMap {
    let mut indices = IndexMap::new();

    for key in source.all_keys(section) {
        let Some(captures) = pattern.captures(&key) else {
            continue;
        };
        let Some(index) = captures
            .get(index_group)
            .and_then(|found| found.as_str().parse::<FieldIndex>().ok())
        else {
            continue;
        };

        let identifier = id_group
            .and_then(|group| captures.get(group))
            .map(|found| found.as_str().to_string());
        indices.entry(index).or_default().push(identifier);
    }

    indices
}

/// `(FCST|OBS|BOTH)`-style alternation, adding BOTH for FCST/OBS
fn role_alternation(roles: &[Role]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for role in roles {
        if !names.contains(&role.as_str()) {
            names.push(role.as_str());
        }
        if role.has_both_fallback() && !names.contains(&Role::Both.as_str()) {
            names.push(Role::Both.as_str());
        }
    }
    names.join("|")
}

fn tool_infix(tool: Option<&Tool>) -> String {
    tool.map(|tool| format!("{}_", regex::escape(&tool.identifier)))
        .unwrap_or_default()
}

/// Indices that have a name set for any of `roles` (plus BOTH)
///
/// With a tool only `<ROLE>_<TOOL>_VAR<n>_` keys match; without one only
/// `<ROLE>_VAR<n>_` keys match. The identifier is the role.
pub fn find_var_name_indices<S: ConfigSource + ?Sized>(
    source: &S,
    roles: &[Role],
    tool: Option<&Tool>,
) -> Result<IndexMap, IndexError> {
    find_var_extension_indices(source, roles, tool, FieldAttribute::Name)
}

/// Indices that have any spelling of `attribute` set for `roles` (plus BOTH)
pub fn find_var_extension_indices<S: ConfigSource + ?Sized>(
    source: &S,
    roles: &[Role],
    tool: Option<&Tool>,
    attribute: FieldAttribute,
) -> Result<IndexMap, IndexError> {
    let pattern = format!(
        r"^({})_{}VAR([1-9]\d*)_({})$",
        role_alternation(roles),
        tool_infix(tool),
        attribute.suffixes().join("|")
    );
    let regex = compile(&pattern)?;

    Ok(find_indices(&regex, source, DEFAULT_SECTION, 2, Some(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ConfigNamespace;

    fn namespace(keys: &[&str]) -> ConfigNamespace {
        ConfigNamespace::from_pairs(keys.iter().map(|key| (*key, "value")))
    }

    #[test]
    fn test_find_indices_without_identifier() {
        let source = namespace(&["FCST_VAR1_NAME", "FCST_VAR2_NAME", "FCST_VAR4_NAME", "OTHER"]);
        let pattern = Regex::new(r"^FCST_VAR(\d+)_NAME$").unwrap();

        let indices = find_indices(&pattern, &source, "config", 1, None);

        let expected: IndexMap = [1, 2, 4]
            .into_iter()
            .map(|i| (FieldIndex::new(i), vec![None]))
            .collect();
        assert_eq!(indices, expected);
        assert!(!indices.contains_key(&FieldIndex::new(3)));
    }

    #[test]
    fn test_identifiers_keep_duplicates_and_order() {
        let source = namespace(&["OBS_VAR1_LEVELS", "FCST_VAR1_NAME", "FCST_VAR1_LEVELS"]);
        let pattern = Regex::new(r"^(\w+?)_VAR(\d+)_(NAME|LEVELS)$").unwrap();

        let indices = find_indices(&pattern, &source, "config", 2, Some(1));

        assert_eq!(
            indices[&FieldIndex::new(1)],
            vec![
                Some("OBS".to_string()),
                Some("FCST".to_string()),
                Some("FCST".to_string())
            ]
        );
    }

    #[test]
    fn test_indices_sort_numerically() {
        let source = namespace(&["FCST_VAR10_NAME", "FCST_VAR9_NAME", "FCST_VAR2_NAME"]);

        let indices = find_var_name_indices(&source, &[Role::Fcst], None).unwrap();
        let order: Vec<u64> = indices.keys().map(FieldIndex::value).collect();
        assert_eq!(order, vec![2, 9, 10]);
    }

    #[test]
    fn test_var_name_indices_include_both() {
        let source = namespace(&[
            "BOTH_VAR1_NAME",
            "OBS_VAR2_INPUT_FIELD_NAME",
            "ENS_VAR3_NAME",
            "FCST_VAR05_NAME",
            "FCST_VAR6_LEVELS",
        ]);

        let indices = find_var_name_indices(&source, &[Role::Fcst, Role::Obs], None).unwrap();

        assert_eq!(indices.len(), 2);
        assert_eq!(indices[&FieldIndex::new(1)], vec![Some("BOTH".to_string())]);
        assert_eq!(indices[&FieldIndex::new(2)], vec![Some("OBS".to_string())]);
    }

    #[test]
    fn test_tool_specific_keys_are_separate() {
        let source = namespace(&["FCST_VAR1_NAME", "FCST_GRID_STAT_VAR2_NAME"]);
        let tool = Tool::canonicalize("GridStat");

        let generic = find_var_name_indices(&source, &[Role::Fcst], None).unwrap();
        let specific = find_var_name_indices(&source, &[Role::Fcst], Some(&tool)).unwrap();

        assert_eq!(generic.keys().copied().collect::<Vec<_>>(), vec![FieldIndex::new(1)]);
        assert_eq!(specific.keys().copied().collect::<Vec<_>>(), vec![FieldIndex::new(2)]);
    }

    #[test]
    fn test_extension_indices() {
        let source = namespace(&["FCST_VAR1_THRESH", "BOTH_VAR1_THRESH", "OBS_VAR2_NAME"]);

        let indices =
            find_var_extension_indices(&source, &[Role::Fcst, Role::Obs], None, FieldAttribute::Thresh)
                .unwrap();

        assert_eq!(
            indices[&FieldIndex::new(1)],
            vec![Some("FCST".to_string()), Some("BOTH".to_string())]
        );
        assert!(!indices.contains_key(&FieldIndex::new(2)));
    }

    #[test]
    fn test_field_index_serializes_as_string() {
        assert_eq!(serde_json::to_string(&FieldIndex::new(7)).unwrap(), "\"7\"");
    }
}
