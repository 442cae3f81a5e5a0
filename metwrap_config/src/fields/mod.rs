//! Numbered field (`<ROLE>_[<TOOL>_]VAR<n>_<EXT>`) resolution
//!
//! Flow: [`indexer`] discovers which `VAR<n>` indices are set, [`prefixes`]
//! orders the key prefixes to search, [`resolver`] picks each attribute's
//! authoritative key, [`var_list`] turns the result into field records and
//! [`validation`] reports every inconsistent combination of keys at once.

pub mod indexer;
pub mod prefixes;
pub mod resolver;
pub mod validation;
pub mod var_list;

use crate::logging::codes::{self, Code};
use serde::Serialize;

pub use indexer::{
    find_indices, find_var_extension_indices, find_var_name_indices, FieldIndex, IndexError,
    IndexMap,
};
pub use prefixes::search_prefixes;
pub use resolver::{normalize_options, resolve_attribute, resolve_field_configs, FieldConfigs};
pub use validation::{
    validate_field_info_configs, validate_field_info_configs_with, Suggestion, ValidationReport,
};
pub use var_list::{
    assemble_field_groups, assemble_var_list, FieldGroup, FieldInfo, FieldRecord, FieldSide,
};

/// Which side of a comparison a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Fcst,
    Obs,
    Both,
    Ens,
    Data,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Fcst, Role::Obs, Role::Both, Role::Ens, Role::Data];

    /// Key prefix spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Fcst => "FCST",
            Role::Obs => "OBS",
            Role::Both => "BOTH",
            Role::Ens => "ENS",
            Role::Data => "DATA",
        }
    }

    /// Lowercase spelling used for record keys and `{<role>_level}` tags
    pub fn key(&self) -> &'static str {
        match self {
            Role::Fcst => "fcst",
            Role::Obs => "obs",
            Role::Both => "both",
            Role::Ens => "ens",
            Role::Data => "data",
        }
    }

    /// FCST and OBS may be supplied through BOTH keys
    pub fn has_both_fallback(&self) -> bool {
        matches!(self, Role::Fcst | Role::Obs)
    }

    /// The other side of a FCST/OBS pair
    pub fn counterpart(&self) -> Option<Role> {
        match self {
            Role::Fcst => Some(Role::Obs),
            Role::Obs => Some(Role::Fcst),
            _ => None,
        }
    }

    pub fn parse(text: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(text.trim()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic attribute of a numbered field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAttribute {
    Name,
    Levels,
    Thresh,
    Options,
    OutputNames,
}

impl FieldAttribute {
    pub const ALL: [FieldAttribute; 5] = [
        FieldAttribute::Name,
        FieldAttribute::Levels,
        FieldAttribute::Thresh,
        FieldAttribute::Options,
        FieldAttribute::OutputNames,
    ];

    /// Key suffixes in priority order; the first is the current spelling
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            FieldAttribute::Name => &["NAME", "INPUT_FIELD_NAME", "FIELD_NAME"],
            FieldAttribute::Levels => &["LEVELS", "FIELD_LEVEL", "INPUT_LEVEL"],
            FieldAttribute::Thresh => &["THRESH"],
            FieldAttribute::Options => &["OPTIONS"],
            FieldAttribute::OutputNames => &["OUTPUT_NAMES", "OUTPUT_FIELD_NAME"],
        }
    }

    /// Extension used in diagnostics, e.g. `OUTPUT_NAMES`
    pub fn extension(&self) -> &'static str {
        self.suffixes()[0]
    }

    /// Whether FCST-only or OBS-only settings are allowed
    pub fn allows_one_sided(&self) -> bool {
        matches!(self, FieldAttribute::Thresh | FieldAttribute::Options)
    }
}

/// Full key for one attribute spelling, e.g. `FCST_GRID_STAT_VAR1_NAME`
pub fn field_key(prefix: &str, index: &FieldIndex, suffix: &str) -> String {
    format!("{}VAR{}_{}", prefix, index, suffix)
}

/// Why one side of a field could not be formatted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldFormatError {
    #[error("No name set for {role}_VAR{index}")]
    NameNotFound { role: Role, index: FieldIndex },

    #[error("Invalid threshold in {role}_VAR{index}: {thresholds}")]
    InvalidThresholds {
        role: Role,
        index: FieldIndex,
        thresholds: String,
    },

    #[error("{role}_VAR{index} lists {names} output names for {levels} levels")]
    OutputNameCountMismatch {
        role: Role,
        index: FieldIndex,
        names: usize,
        levels: usize,
    },
}

impl FieldFormatError {
    pub fn error_code(&self) -> Code {
        match self {
            FieldFormatError::NameNotFound { .. } => codes::fields::NAME_NOT_FOUND,
            FieldFormatError::InvalidThresholds { .. } => codes::threshold::INVALID_THRESHOLD,
            FieldFormatError::OutputNameCountMismatch { .. } => {
                codes::fields::OUTPUT_NAME_COUNT_MISMATCH
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VarListError {
    #[error("BOTH cannot be requested as a data type; request FCST or OBS")]
    BothNotAllowed,

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl VarListError {
    pub fn error_code(&self) -> Code {
        match self {
            VarListError::BothNotAllowed => codes::fields::BOTH_ROLE_REQUESTED,
            VarListError::Index(error) => error.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse("fcst"), Some(Role::Fcst));
        assert_eq!(Role::parse(" OBS "), Some(Role::Obs));
        assert_eq!(Role::parse("Both"), Some(Role::Both));
        assert_eq!(Role::parse("model"), None);
    }

    #[test]
    fn test_role_fallbacks() {
        assert!(Role::Fcst.has_both_fallback());
        assert!(!Role::Ens.has_both_fallback());
        assert!(!Role::Both.has_both_fallback());
        assert_eq!(Role::Obs.counterpart(), Some(Role::Fcst));
        assert_eq!(Role::Data.counterpart(), None);
    }

    #[test]
    fn test_suffix_table() {
        assert_eq!(
            FieldAttribute::Name.suffixes(),
            &["NAME", "INPUT_FIELD_NAME", "FIELD_NAME"]
        );
        assert_eq!(FieldAttribute::OutputNames.extension(), "OUTPUT_NAMES");
        assert!(FieldAttribute::Thresh.allows_one_sided());
        assert!(!FieldAttribute::Levels.allows_one_sided());
    }

    #[test]
    fn test_field_key() {
        let index = FieldIndex::new(3);
        assert_eq!(field_key("FCST_GRID_STAT_", &index, "NAME"), "FCST_GRID_STAT_VAR3_NAME");
    }

    #[test]
    fn test_error_codes() {
        let error = FieldFormatError::NameNotFound {
            role: Role::Obs,
            index: FieldIndex::new(2),
        };
        assert_eq!(error.to_string(), "No name set for OBS_VAR2");
        assert_eq!(error.error_code(), codes::fields::NAME_NOT_FOUND);
        assert_eq!(
            VarListError::BothNotAllowed.error_code(),
            codes::fields::BOTH_ROLE_REQUESTED
        );
    }
}
