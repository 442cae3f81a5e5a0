// Internal modules
pub mod config;
pub mod fields;
#[macro_use]
pub mod logging;
pub mod namespace;
pub mod parsing;
pub mod template;
pub mod tools;

// Re-export key types for library consumers
pub use config::RuntimeConfig;
pub use fields::{
    assemble_var_list, validate_field_info_configs, FieldRecord, Role, ValidationReport,
    VarListError,
};
pub use namespace::{ConfigNamespace, ConfigSource, NamespaceError, NamespaceLoader};
pub use parsing::{getlist, parse_list, parse_threshold, validate_thresholds};
pub use template::{NoSubstitution, TagContext, TemplateContext};
pub use tools::Tool;
