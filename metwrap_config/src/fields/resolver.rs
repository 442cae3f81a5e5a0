//! Resolution of one numbered field's attributes through prefixes and synonyms

use super::{field_key, FieldAttribute, FieldIndex};
use crate::config::constants::compile_time::namespace::DEFAULT_SECTION;
use crate::namespace::ConfigSource;
use crate::parsing::getlist;
use serde::Serialize;

/// Raw attribute values of one field; `None` means no key was set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldConfigs {
    pub name: Option<String>,
    pub levels: Option<String>,
    pub thresh: Option<String>,
    pub options: Option<String>,
    pub output_names: Option<String>,
}

impl FieldConfigs {
    pub fn get(&self, attribute: FieldAttribute) -> Option<&str> {
        match attribute {
            FieldAttribute::Name => self.name.as_deref(),
            FieldAttribute::Levels => self.levels.as_deref(),
            FieldAttribute::Thresh => self.thresh.as_deref(),
            FieldAttribute::Options => self.options.as_deref(),
            FieldAttribute::OutputNames => self.output_names.as_deref(),
        }
    }

    fn set(&mut self, attribute: FieldAttribute, value: Option<String>) {
        let slot = match attribute {
            FieldAttribute::Name => &mut self.name,
            FieldAttribute::Levels => &mut self.levels,
            FieldAttribute::Thresh => &mut self.thresh,
            FieldAttribute::Options => &mut self.options,
            FieldAttribute::OutputNames => &mut self.output_names,
        };
        *slot = value;
    }

    pub fn level_list(&self) -> Vec<String> {
        self.levels.as_deref().map(getlist).unwrap_or_default()
    }

    pub fn thresh_list(&self) -> Vec<String> {
        self.thresh.as_deref().map(getlist).unwrap_or_default()
    }

    pub fn output_name_list(&self) -> Vec<String> {
        self.output_names.as_deref().map(getlist).unwrap_or_default()
    }
}

/// First `(suffix, prefix)` key that is set, suffix-major
pub fn resolve_attribute<S: ConfigSource + ?Sized>(
    source: &S,
    index: &FieldIndex,
    prefixes: &[String],
    attribute: FieldAttribute,
) -> Option<String> {
    attribute.suffixes().iter().find_map(|suffix| {
        prefixes.iter().find_map(|prefix| {
            source.get_string_raw(DEFAULT_SECTION, &field_key(prefix, index, suffix))
        })
    })
}

/// Resolve all attributes of field `index`; options are normalized
pub fn resolve_field_configs<S: ConfigSource + ?Sized>(
    source: &S,
    index: &FieldIndex,
    prefixes: &[String],
) -> FieldConfigs {
    let mut configs = FieldConfigs::default();
    for attribute in FieldAttribute::ALL {
        let value = resolve_attribute(source, index, prefixes, attribute);
        let value = match attribute {
            FieldAttribute::Options => value.map(|options| normalize_options(&options)),
            _ => value,
        };
        configs.set(attribute, value);
    }
    configs
}

/// `a=1 ;b=2` becomes `a=1; b=2;`
pub fn normalize_options(raw: &str) -> String {
    let statements: Vec<&str> = raw
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect();

    if statements.is_empty() {
        return String::new();
    }
    format!("{};", statements.join("; "))
}
