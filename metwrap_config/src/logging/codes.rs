//! Error and success codes with classification metadata
//!
//! Single source of truth for every code the field engine emits. Each code
//! carries a category, severity and a recommended action so the CLI can
//! print actionable diagnostics.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Code {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
}

/// Namespace loading error codes
pub mod namespace {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_TOML: Code = Code::new("E012");
    pub const UNSUPPORTED_VALUE: Code = Code::new("E013");
    pub const INVALID_OVERRIDE: Code = Code::new("E014");
    pub const INTERPOLATION_TOO_DEEP: Code = Code::new("E015");
}

/// List parsing codes
pub mod parsing {
    use super::Code;

    pub const MALFORMED_RANGE: Code = Code::new("E020");
    pub const RANGE_TOO_LARGE: Code = Code::new("E021");
    pub const INVALID_INTEGER: Code = Code::new("E022");
}

/// Threshold grammar codes
pub mod threshold {
    use super::Code;

    pub const INVALID_THRESHOLD: Code = Code::new("E030");
}

/// Field resolution codes
pub mod fields {
    use super::Code;

    pub const NAME_NOT_FOUND: Code = Code::new("E040");
    pub const OUTPUT_NAME_COUNT_MISMATCH: Code = Code::new("E041");
    pub const INVALID_INDEX_PATTERN: Code = Code::new("E042");
    pub const BOTH_ROLE_REQUESTED: Code = Code::new("E043");
    pub const FIELD_SKIPPED: Code = Code::new("E044");
}

/// Field info validation codes
pub mod validation {
    use super::Code;

    pub const BOTH_WITH_SIDE: Code = Code::new("E050");
    pub const MISSING_COUNTERPART: Code = Code::new("E051");
    pub const LEVEL_COUNT_MISMATCH: Code = Code::new("E052");
    pub const INVALID_FIELD_THRESHOLD: Code = Code::new("E053");
    pub const TOO_MANY_DIAGNOSTICS: Code = Code::new("E054");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const NAMESPACE_LOADED: Code = Code::new("I010");
    pub const VAR_LIST_ASSEMBLED: Code = Code::new("I040");
    pub const FIELD_VALIDATION_PASSED: Code = Code::new("I050");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn register(
    registry: &mut HashMap<&'static str, ErrorMetadata>,
    code: Code,
    category: &'static str,
    severity: Severity,
    recoverable: bool,
    description: &'static str,
    recommended_action: &'static str,
) {
    registry.insert(
        code.as_str(),
        ErrorMetadata {
            code: code.as_str(),
            category,
            severity,
            recoverable,
            description,
            recommended_action,
        },
    );
}

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let mut r = HashMap::new();

        register(
            &mut r,
            system::INTERNAL_ERROR,
            "System",
            Severity::Critical,
            false,
            "Critical internal error",
            "File a bug report with the configuration that triggered it",
        );

        register(
            &mut r,
            namespace::FILE_NOT_FOUND,
            "Namespace",
            Severity::High,
            false,
            "Configuration file not found",
            "Check the path passed with --config",
        );
        register(
            &mut r,
            namespace::IO_ERROR,
            "Namespace",
            Severity::High,
            false,
            "Configuration file could not be read",
            "Check file permissions",
        );
        register(
            &mut r,
            namespace::INVALID_TOML,
            "Namespace",
            Severity::High,
            false,
            "Configuration file is not valid TOML",
            "Fix the syntax error reported by the parser",
        );
        register(
            &mut r,
            namespace::UNSUPPORTED_VALUE,
            "Namespace",
            Severity::Medium,
            false,
            "Configuration value type cannot be represented as a string",
            "Use a string, number, boolean or flat array",
        );
        register(
            &mut r,
            namespace::INVALID_OVERRIDE,
            "Namespace",
            Severity::Medium,
            false,
            "Command line override is not of the form [SECTION.]KEY=VALUE",
            "Rewrite the override as KEY=VALUE",
        );
        register(
            &mut r,
            namespace::INTERPOLATION_TOO_DEEP,
            "Namespace",
            Severity::Medium,
            false,
            "Nested {KEY} references exceed the interpolation depth",
            "Remove the circular reference between configuration keys",
        );

        register(
            &mut r,
            parsing::MALFORMED_RANGE,
            "Parsing",
            Severity::Low,
            true,
            "begin_end_incr expression could not be expanded and was kept literally",
            "Use begin_end_incr(start,end,step[,precision]) with integer arguments",
        );
        register(
            &mut r,
            parsing::RANGE_TOO_LARGE,
            "Parsing",
            Severity::Medium,
            true,
            "begin_end_incr expression would produce too many items",
            "Check the end value and step of the expression",
        );
        register(
            &mut r,
            parsing::INVALID_INTEGER,
            "Parsing",
            Severity::Medium,
            false,
            "List item is not an integer",
            "Use only whole numbers in this list",
        );

        register(
            &mut r,
            threshold::INVALID_THRESHOLD,
            "Threshold",
            Severity::High,
            false,
            "Threshold does not follow the comparison grammar",
            "Use >,>=,==,!=,<,<=,gt,ge,eq,ne,lt or le followed by a number, optionally joined by && or ||",
        );

        register(
            &mut r,
            fields::NAME_NOT_FOUND,
            "Fields",
            Severity::High,
            true,
            "Field has no name configured",
            "Set <ROLE>_VAR<n>_NAME for the field",
        );
        register(
            &mut r,
            fields::OUTPUT_NAME_COUNT_MISMATCH,
            "Fields",
            Severity::High,
            true,
            "Number of output names does not match number of levels",
            "List one output name per level",
        );
        register(
            &mut r,
            fields::INVALID_INDEX_PATTERN,
            "Fields",
            Severity::Critical,
            false,
            "Key discovery pattern is not a valid regular expression",
            "Fix the pattern passed to the indexer",
        );
        register(
            &mut r,
            fields::BOTH_ROLE_REQUESTED,
            "Fields",
            Severity::High,
            false,
            "BOTH cannot be requested as a data type",
            "Request FCST, OBS, ENS or DATA, or omit the data type",
        );
        register(
            &mut r,
            fields::FIELD_SKIPPED,
            "Fields",
            Severity::Medium,
            true,
            "Field was skipped while building the field list",
            "Fix the preceding error for this field",
        );

        register(
            &mut r,
            validation::BOTH_WITH_SIDE,
            "Validation",
            Severity::High,
            false,
            "BOTH is set together with FCST or OBS for the same field item",
            "Remove either the BOTH key or the FCST/OBS keys",
        );
        register(
            &mut r,
            validation::MISSING_COUNTERPART,
            "Validation",
            Severity::High,
            false,
            "FCST or OBS field item is set without its counterpart",
            "Set the counterpart or rename the key to BOTH",
        );
        register(
            &mut r,
            validation::LEVEL_COUNT_MISMATCH,
            "Validation",
            Severity::High,
            false,
            "FCST and OBS list a different number of levels",
            "List the same number of levels for both sides",
        );
        register(
            &mut r,
            validation::INVALID_FIELD_THRESHOLD,
            "Validation",
            Severity::High,
            false,
            "Field threshold does not follow the comparison grammar",
            "Fix the THRESH value of the field",
        );
        register(
            &mut r,
            validation::TOO_MANY_DIAGNOSTICS,
            "Validation",
            Severity::Low,
            true,
            "Further diagnostics were suppressed",
            "Fix the reported problems and validate again",
        );

        register(
            &mut r,
            success::NAMESPACE_LOADED,
            "Success",
            Severity::Low,
            true,
            "Configuration namespace loaded",
            "No action required",
        );
        register(
            &mut r,
            success::VAR_LIST_ASSEMBLED,
            "Success",
            Severity::Low,
            true,
            "Field list assembled",
            "No action required",
        );
        register(
            &mut r,
            success::FIELD_VALIDATION_PASSED,
            "Success",
            Severity::Low,
            true,
            "Field info configuration is valid",
            "No action required",
        );

        r
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get error metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get error severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
