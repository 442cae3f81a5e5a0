//! Field info validation across the generic tier and every tool
//!
//! Problems are collected into one [`ValidationReport`] so a user can fix the
//! whole configuration in one pass. Nothing here returns an error.

use super::{
    field_key, find_var_extension_indices, find_var_name_indices, resolve_attribute,
    resolve_field_configs, search_prefixes, FieldAttribute, FieldIndex, Role,
};
use crate::config::constants::compile_time::namespace::{CONFIG_INPUT_KEY, DEFAULT_SECTION};
use crate::config::constants::compile_time::validation::MAX_REPORT_DIAGNOSTICS;
use crate::config::runtime::ValidationPreferences;
use crate::log_success;
use crate::logging::{self, codes, LogEvent};
use crate::namespace::ConfigSource;
use crate::parsing::{getlist, is_python_script, parse_threshold};
use crate::tools::{process_list_tools, Tool};
use serde::Serialize;
use std::collections::HashSet;

/// Find-and-replace edit that fixes a config key in one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub find: String,
    pub replace: String,
    pub file: Option<String>,
}

impl Suggestion {
    pub fn sed_command(&self) -> String {
        format!(
            "sed -i 's|^\\s*{}\\s*=|{} =|g' {}",
            self.find,
            self.replace,
            self.file.as_deref().unwrap_or("<config file>")
        )
    }
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sed_command())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub diagnostics: Vec<LogEvent>,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip)]
    truncated: bool,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            is_valid: true,
            diagnostics: Vec::new(),
            suggestions: Vec::new(),
            truncated: false,
        }
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and mark the report invalid
    pub fn add_error(&mut self, event: LogEvent) {
        self.is_valid = false;
        self.push(event);
    }

    /// Record a diagnostic that does not fail validation
    pub fn add_warning(&mut self, event: LogEvent) {
        self.push(event);
    }

    fn push(&mut self, event: LogEvent) {
        if self.diagnostics.len() < MAX_REPORT_DIAGNOSTICS {
            self.diagnostics.push(event);
        } else if !self.truncated {
            self.truncated = true;
            self.diagnostics.push(LogEvent::warning_with_code(
                codes::validation::TOO_MANY_DIAGNOSTICS,
                &format!("More than {} problems found", MAX_REPORT_DIAGNOSTICS),
            ));
        }
    }

    pub fn add_suggestion(&mut self, suggestion: Suggestion) {
        if !self.suggestions.contains(&suggestion) {
            self.suggestions.push(suggestion);
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &LogEvent> {
        self.diagnostics.iter().filter(|event| event.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_error_with_code(&self, code: logging::Code) -> bool {
        self.errors().any(|event| event.code == code)
    }

    /// Send every diagnostic and suggestion to the logging service
    pub fn log_diagnostics(&self) {
        for event in &self.diagnostics {
            logging::dispatch(event.clone());
        }
        if !self.suggestions.is_empty() {
            logging::dispatch(LogEvent::info(
                "Run the following to rename the offending config variables:",
            ));
            for suggestion in &self.suggestions {
                logging::dispatch(LogEvent::info(&suggestion.sed_command()));
            }
        }
    }
}

/// Validate with preferences read from the environment
///
/// `tools` of `None` reads the tools from the process list.
pub fn validate_field_info_configs<S: ConfigSource + ?Sized>(
    source: &S,
    tools: Option<&[Tool]>,
) -> ValidationReport {
    validate_field_info_configs_with(source, tools, &ValidationPreferences::default())
}

pub fn validate_field_info_configs_with<S: ConfigSource + ?Sized>(
    source: &S,
    tools: Option<&[Tool]>,
    preferences: &ValidationPreferences,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    let tools = match tools {
        Some(tools) => tools.to_vec(),
        None => process_list_tools(source, DEFAULT_SECTION).unwrap_or_else(|error| {
            report.add_warning(LogEvent::warning_with_code(
                error.error_code(),
                &error.to_string(),
            ));
            Vec::new()
        }),
    };

    let config_files = if preferences.suggest_edits {
        config_input_files(source, &mut report)
    } else {
        Vec::new()
    };

    let tiers = std::iter::once(None).chain(tools.iter().map(Some));
    for tool in tiers {
        check_role_exclusion(source, tool, preferences, &config_files, &mut report);
        if preferences.check_level_counts || preferences.check_thresholds {
            check_resolved_fields(source, tool, preferences, &mut report);
        }
    }

    if report.is_valid {
        log_success!(
            codes::success::FIELD_VALIDATION_PASSED,
            "Field info configuration is valid",
            "tools" => tools.len()
        );
    }

    report
}

fn config_input_files<S: ConfigSource + ?Sized>(
    source: &S,
    report: &mut ValidationReport,
) -> Vec<String> {
    match source.get_string(DEFAULT_SECTION, CONFIG_INPUT_KEY) {
        Ok(value) => value
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|file| !file.is_empty())
            .map(str::to_string)
            .collect(),
        Err(error) => {
            report.add_warning(LogEvent::warning_with_code(
                error.error_code(),
                &error.to_string(),
            ));
            Vec::new()
        }
    }
}

fn tier_prefix(role: Role, tool: Option<&Tool>) -> String {
    match tool {
        Some(tool) => format!("{}_{}_", role, tool.identifier),
        None => format!("{}_", role),
    }
}

fn check_role_exclusion<S: ConfigSource + ?Sized>(
    source: &S,
    tool: Option<&Tool>,
    preferences: &ValidationPreferences,
    config_files: &[String],
    report: &mut ValidationReport,
) {
    for attribute in FieldAttribute::ALL {
        let indices =
            match find_var_extension_indices(source, &[Role::Fcst, Role::Obs], tool, attribute) {
                Ok(indices) => indices,
                Err(error) => {
                    report.add_error(LogEvent::error(error.error_code(), &error.to_string()));
                    continue;
                }
            };

        for (index, identifiers) in &indices {
            let has = |role: Role| {
                identifiers
                    .iter()
                    .any(|identifier| identifier.as_deref() == Some(role.as_str()))
            };
            let key = |role: Role| field_key(&tier_prefix(role, tool), index, attribute.extension());

            if has(Role::Both) && (has(Role::Fcst) || has(Role::Obs)) {
                report.add_error(
                    LogEvent::error(
                        codes::validation::BOTH_WITH_SIDE,
                        &format!(
                            "Cannot set {} or {} if {} is set",
                            key(Role::Fcst),
                            key(Role::Obs),
                            key(Role::Both)
                        ),
                    )
                    .with_context("index", &index.to_string())
                    .with_context("extension", attribute.extension()),
                );
                continue;
            }

            if attribute.allows_one_sided() {
                continue;
            }

            for role in [Role::Fcst, Role::Obs] {
                let Some(counterpart) = role.counterpart() else {
                    continue;
                };
                if !has(role) || has(counterpart) {
                    continue;
                }
                if is_python_embedding_exception(source, tool, index, role, counterpart) {
                    continue;
                }

                report.add_error(
                    LogEvent::error(
                        codes::validation::MISSING_COUNTERPART,
                        &format!(
                            "If {} is set, you must either set {} or change {} to {}",
                            key(role),
                            key(counterpart),
                            key(role),
                            key(Role::Both)
                        ),
                    )
                    .with_context("index", &index.to_string())
                    .with_context("extension", attribute.extension()),
                );

                if preferences.suggest_edits {
                    suggest_rename(source, tool, index, role, attribute, config_files, report);
                }
            }
        }
    }
}

/// A one-sided field is fine when the other side reads through a python
/// script and this side has exactly one level
fn is_python_embedding_exception<S: ConfigSource + ?Sized>(
    source: &S,
    tool: Option<&Tool>,
    index: &FieldIndex,
    role: Role,
    counterpart: Role,
) -> bool {
    let counterpart_name = resolve_attribute(
        source,
        index,
        &[tier_prefix(counterpart, tool)],
        FieldAttribute::Name,
    );
    let levels = resolve_attribute(
        source,
        index,
        &[tier_prefix(role, tool)],
        FieldAttribute::Levels,
    );

    counterpart_name.as_deref().is_some_and(is_python_script)
        && levels.map(|levels| getlist(&levels).len()) == Some(1)
}

/// Suggest `FCST_VAR<n>_<EXT>` to `BOTH_VAR<n>_<EXT>` for every spelling set
fn suggest_rename<S: ConfigSource + ?Sized>(
    source: &S,
    tool: Option<&Tool>,
    index: &FieldIndex,
    role: Role,
    attribute: FieldAttribute,
    config_files: &[String],
    report: &mut ValidationReport,
) {
    for suffix in attribute.suffixes() {
        let find = field_key(&tier_prefix(role, tool), index, suffix);
        if !source.has_option(DEFAULT_SECTION, &find) {
            continue;
        }
        let replace = field_key(&tier_prefix(Role::Both, tool), index, suffix);

        if config_files.is_empty() {
            report.add_suggestion(Suggestion {
                find: find.clone(),
                replace: replace.clone(),
                file: None,
            });
        }
        for file in config_files {
            report.add_suggestion(Suggestion {
                find: find.clone(),
                replace: replace.clone(),
                file: Some(file.clone()),
            });
        }
    }
}

/// Level counts and threshold grammar of the resolved FCST/OBS values
fn check_resolved_fields<S: ConfigSource + ?Sized>(
    source: &S,
    tool: Option<&Tool>,
    preferences: &ValidationPreferences,
    report: &mut ValidationReport,
) {
    let indices = match find_var_name_indices(source, &[Role::Fcst, Role::Obs], tool) {
        Ok(indices) => indices,
        Err(error) => {
            report.add_error(LogEvent::error(error.error_code(), &error.to_string()));
            return;
        }
    };

    for index in indices.keys() {
        let fcst = resolve_field_configs(source, index, &search_prefixes(Role::Fcst, tool));
        let obs = resolve_field_configs(source, index, &search_prefixes(Role::Obs, tool));

        if preferences.check_level_counts {
            let fcst_levels = fcst.level_list();
            let obs_levels = obs.level_list();
            if !fcst_levels.is_empty()
                && !obs_levels.is_empty()
                && fcst_levels.len() != obs_levels.len()
            {
                report.add_error(
                    LogEvent::error(
                        codes::validation::LEVEL_COUNT_MISMATCH,
                        &format!(
                            "{} has {} levels but {} has {}",
                            field_key(&tier_prefix(Role::Fcst, tool), index, "LEVELS"),
                            fcst_levels.len(),
                            field_key(&tier_prefix(Role::Obs, tool), index, "LEVELS"),
                            obs_levels.len()
                        ),
                    )
                    .with_context("index", &index.to_string()),
                );
            }
        }

        if preferences.check_thresholds {
            let mut reported = HashSet::new();
            for (role, configs) in [(Role::Fcst, &fcst), (Role::Obs, &obs)] {
                for threshold in configs.thresh_list() {
                    if parse_threshold(&threshold).is_some() || !reported.insert(threshold.clone()) {
                        continue;
                    }
                    report.add_error(
                        LogEvent::error(
                            codes::validation::INVALID_FIELD_THRESHOLD,
                            &format!(
                                "Invalid threshold '{}' in {}",
                                threshold,
                                field_key(&tier_prefix(role, tool), index, "THRESH")
                            ),
                        )
                        .with_context("index", &index.to_string()),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ConfigNamespace;

    fn preferences() -> ValidationPreferences {
        ValidationPreferences {
            suggest_edits: true,
            check_thresholds: true,
            check_level_counts: true,
        }
    }

    fn validate(source: &ConfigNamespace) -> ValidationReport {
        validate_field_info_configs_with(source, None, &preferences())
    }

    #[test]
    fn test_symmetric_config_is_valid() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "P500"),
            ("OBS_VAR1_NAME", "TMP"),
            ("OBS_VAR1_LEVELS", "P500"),
            ("BOTH_VAR2_NAME", "RH"),
            ("FCST_VAR2_THRESH", "gt50"),
        ]);

        let report = validate(&source);
        assert!(report.is_valid, "{:?}", report.diagnostics);
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_fcst_only_name_and_levels() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "P500"),
        ]);

        let report = validate(&source);

        assert!(!report.is_valid);
        assert_eq!(report.error_count(), 2);
        assert!(report.has_error_with_code(codes::validation::MISSING_COUNTERPART));
        assert!(report.diagnostics[0]
            .message
            .contains("If FCST_VAR1_NAME is set, you must either set OBS_VAR1_NAME"));
    }

    #[test]
    fn test_both_with_side() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "TMP"),
            ("FCST_VAR1_NAME", "TMP"),
        ]);

        let report = validate(&source);
        assert!(report.has_error_with_code(codes::validation::BOTH_WITH_SIDE));
        assert!(!report.has_error_with_code(codes::validation::MISSING_COUNTERPART));
    }

    #[test]
    fn test_both_with_side_thresh_still_rejected() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "TMP"),
            ("BOTH_VAR1_THRESH", "gt1"),
            ("OBS_VAR1_THRESH", "gt2"),
        ]);

        let report = validate(&source);
        assert!(report.has_error_with_code(codes::validation::BOTH_WITH_SIDE));
    }

    #[test]
    fn test_one_sided_thresh_and_options_allowed() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "TMP"),
            ("FCST_VAR1_THRESH", "gt1"),
            ("OBS_VAR1_OPTIONS", "censor_val = [];"),
        ]);

        assert!(validate(&source).is_valid);
    }

    #[test]
    fn test_python_embedding_exception() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "P500"),
            ("OBS_VAR1_NAME", "read_obs.py obs.txt"),
        ]);
        assert!(validate(&source).is_valid);

        let two_levels = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "P500,P750"),
            ("OBS_VAR1_NAME", "read_obs.py obs.txt"),
        ]);
        assert!(!validate(&two_levels).is_valid);
    }

    #[test]
    fn test_suggestions_per_config_file() {
        let source = ConfigNamespace::from_pairs([
            ("CONFIG_INPUT", "/a.toml,/b.toml"),
            ("OBS_VAR3_NAME", "TMP"),
            ("OBS_VAR3_LEVELS", "Z2"),
        ]);

        let report = validate(&source);

        assert_eq!(report.suggestions.len(), 4);
        assert_eq!(
            report.suggestions[0],
            Suggestion {
                find: "OBS_VAR3_NAME".to_string(),
                replace: "BOTH_VAR3_NAME".to_string(),
                file: Some("/a.toml".to_string()),
            }
        );
        assert_eq!(
            report.suggestions[0].sed_command(),
            "sed -i 's|^\\s*OBS_VAR3_NAME\\s*=|BOTH_VAR3_NAME =|g' /a.toml"
        );
    }

    #[test]
    fn test_suggestion_uses_actual_spelling() {
        let source = ConfigNamespace::from_pairs([("FCST_VAR1_INPUT_FIELD_NAME", "TMP")]);

        let report = validate(&source);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].find, "FCST_VAR1_INPUT_FIELD_NAME");
        assert_eq!(report.suggestions[0].replace, "BOTH_VAR1_INPUT_FIELD_NAME");
        assert_eq!(report.suggestions[0].file, None);
    }

    #[test]
    fn test_suggestions_can_be_disabled() {
        let source = ConfigNamespace::from_pairs([("FCST_VAR1_NAME", "TMP")]);
        let mut preferences = preferences();
        preferences.suggest_edits = false;

        let report = validate_field_info_configs_with(&source, None, &preferences);
        assert!(!report.is_valid);
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_level_count_mismatch() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "P500,P750"),
            ("OBS_VAR1_NAME", "TMP"),
            ("OBS_VAR1_LEVELS", "P500"),
        ]);

        let report = validate(&source);
        assert!(report.has_error_with_code(codes::validation::LEVEL_COUNT_MISMATCH));
    }

    #[test]
    fn test_invalid_threshold_reported_once() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "TMP"),
            ("BOTH_VAR1_THRESH", "gt1, bogus"),
        ]);

        let report = validate(&source);
        assert_eq!(report.error_count(), 1);
        assert!(report.has_error_with_code(codes::validation::INVALID_FIELD_THRESHOLD));
    }

    #[test]
    fn test_process_list_tools_are_checked() {
        let source = ConfigNamespace::from_pairs([
            ("PROCESS_LIST", "GridStat, PointStat"),
            ("BOTH_VAR1_NAME", "TMP"),
            ("FCST_POINT_STAT_VAR1_NAME", "TMP"),
        ]);

        let report = validate(&source);
        assert!(!report.is_valid);
        assert!(report.diagnostics[0]
            .message
            .contains("FCST_POINT_STAT_VAR1_NAME"));

        let generic_only = validate_field_info_configs_with(&source, Some(&[] as &[Tool]), &preferences());
        assert!(generic_only.is_valid);
    }

    #[test]
    fn test_diagnostics_are_capped() {
        let pairs: Vec<(String, String)> = (1..=MAX_REPORT_DIAGNOSTICS + 5)
            .map(|i| (format!("FCST_VAR{}_OPTIONS", i), "a=1".to_string()))
            .chain(
                (1..=MAX_REPORT_DIAGNOSTICS + 5)
                    .map(|i| (format!("BOTH_VAR{}_OPTIONS", i), "a=1".to_string())),
            )
            .collect();
        let source = ConfigNamespace::from_pairs(pairs);

        let report = validate(&source);
        assert_eq!(report.diagnostics.len(), MAX_REPORT_DIAGNOSTICS + 1);
        assert!(report
            .diagnostics
            .last()
            .is_some_and(|event| event.code == codes::validation::TOO_MANY_DIAGNOSTICS));
    }
}
