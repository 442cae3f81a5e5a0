//! Assembly of the ordered field list from resolved attributes

use super::{
    find_var_name_indices, resolve_field_configs, search_prefixes, validate_field_info_configs,
    FieldConfigs, FieldFormatError, FieldIndex, Role, VarListError,
};
use crate::logging::codes;
use crate::namespace::ConfigSource;
use crate::parsing::text::replace_tag;
use crate::parsing::validate_thresholds;
use crate::template::TemplateContext;
use crate::tools::Tool;
use crate::{log_error, log_success};
use serde::Serialize;
use std::collections::BTreeMap;

/// One role of a field with its levels kept as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSide {
    pub name: String,
    pub levels: Vec<String>,
    pub thresh: Vec<String>,
    pub extra: String,
    pub output_names: Vec<String>,
}

impl FieldSide {
    /// Validate and template one role's raw attribute values
    pub fn format(
        configs: &FieldConfigs,
        role: Role,
        index: FieldIndex,
        context: &dyn TemplateContext,
    ) -> Result<Self, FieldFormatError> {
        let name = configs
            .name
            .as_deref()
            .map(|name| context.substitute(name))
            .ok_or(FieldFormatError::NameNotFound { role, index })?;

        let substitute_all = |items: Vec<String>| -> Vec<String> {
            items.iter().map(|item| context.substitute(item)).collect()
        };

        let levels = substitute_all(configs.level_list());
        let thresh = substitute_all(configs.thresh_list());
        if !validate_thresholds(&thresh) {
            return Err(FieldFormatError::InvalidThresholds {
                role,
                index,
                thresholds: thresh.join(","),
            });
        }

        let extra = configs
            .options
            .as_deref()
            .map(|options| context.substitute(options))
            .unwrap_or_default();

        // A field without levels still produces one record
        let expected = levels.len().max(1);
        let output_names = match configs.output_names {
            Some(_) => {
                let names = substitute_all(configs.output_name_list());
                if names.len() != expected {
                    return Err(FieldFormatError::OutputNameCountMismatch {
                        role,
                        index,
                        names: names.len(),
                        levels: expected,
                    });
                }
                names
            }
            None => vec![name.clone(); expected],
        };

        Ok(Self {
            name,
            levels,
            thresh,
            extra,
            output_names,
        })
    }
}

/// Every requested role of one field index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldGroup {
    pub index: FieldIndex,
    pub sides: BTreeMap<Role, FieldSide>,
}

impl FieldGroup {
    pub fn side(&self, role: Role) -> Option<&FieldSide> {
        self.sides.get(&role)
    }

    /// Number of records this group expands to
    pub fn record_count(&self) -> usize {
        self.sides
            .values()
            .map(|side| side.levels.len())
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// One record per level position; sides without levels get `""`
    pub fn records(&self) -> Vec<FieldRecord> {
        (0..self.record_count())
            .map(|position| {
                let levels: Vec<(Role, &str)> = self
                    .sides
                    .iter()
                    .map(|(role, side)| {
                        let level = side.levels.get(position).map(String::as_str).unwrap_or("");
                        (*role, level)
                    })
                    .collect();

                let sides = self
                    .sides
                    .iter()
                    .zip(&levels)
                    .map(|((role, side), (_, level))| {
                        let name_position = if side.levels.is_empty() { 0 } else { position };
                        let output_name = side
                            .output_names
                            .get(name_position)
                            .unwrap_or(&side.name);

                        let info = FieldInfo {
                            name: fill_level_tags(&side.name, &levels),
                            level: level.to_string(),
                            thresh: side.thresh.clone(),
                            extra: side.extra.clone(),
                            output_name: fill_level_tags(output_name, &levels),
                        };
                        (*role, info)
                    })
                    .collect();

                FieldRecord {
                    index: self.index,
                    sides,
                }
            })
            .collect()
    }
}

/// Replace `{fcst_level}`, `{obs_level}`, ... with this record's levels
fn fill_level_tags(text: &str, levels: &[(Role, &str)]) -> String {
    levels.iter().fold(text.to_string(), |current, (role, level)| {
        replace_tag(&current, &format!("{}_level", role.key()), level)
    })
}

/// Resolved values of one role for one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub level: String,
    pub thresh: Vec<String>,
    pub extra: String,
    pub output_name: String,
}

/// One entry of the field list handed to the command builders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRecord {
    pub index: FieldIndex,
    #[serde(flatten)]
    pub sides: BTreeMap<Role, FieldInfo>,
}

impl FieldRecord {
    pub fn side(&self, role: Role) -> Option<&FieldInfo> {
        self.sides.get(&role)
    }

    pub fn fcst(&self) -> Option<&FieldInfo> {
        self.side(Role::Fcst)
    }

    pub fn obs(&self) -> Option<&FieldInfo> {
        self.side(Role::Obs)
    }
}

/// Build one [`FieldGroup`] per configured index, ascending
///
/// Without `data_type` both FCST and OBS are resolved and the field info
/// validator must pass first; a failing configuration yields an empty list.
/// When `tool` is given and any tool-specific name is set, only the
/// tool-specific indices are used.
pub fn assemble_field_groups<S: ConfigSource + ?Sized>(
    source: &S,
    data_type: Option<Role>,
    tool: Option<&Tool>,
    context: &dyn TemplateContext,
) -> Result<Vec<FieldGroup>, VarListError> {
    let roles = match data_type {
        Some(Role::Both) => return Err(VarListError::BothNotAllowed),
        Some(role) => vec![role],
        None => vec![Role::Fcst, Role::Obs],
    };

    if data_type.is_none() {
        let tools: Vec<Tool> = tool.into_iter().cloned().collect();
        let report = validate_field_info_configs(source, Some(tools.as_slice()));
        if !report.is_valid {
            report.log_diagnostics();
            return Ok(Vec::new());
        }
    }

    let indices = match tool {
        Some(tool) => {
            let specific = find_var_name_indices(source, &roles, Some(tool))?;
            if specific.is_empty() {
                find_var_name_indices(source, &roles, None)?
            } else {
                specific
            }
        }
        None => find_var_name_indices(source, &roles, None)?,
    };

    let mut groups = Vec::with_capacity(indices.len());
    for index in indices.keys() {
        if let Some(group) = build_group(source, *index, &roles, tool, context) {
            groups.push(group);
        }
    }

    log_success!(
        codes::success::VAR_LIST_ASSEMBLED,
        "Field list assembled",
        "fields" => groups.len(),
        "tool" => tool.map(|t| t.wrapper_name.as_str()).unwrap_or("none")
    );

    Ok(groups)
}

fn build_group<S: ConfigSource + ?Sized>(
    source: &S,
    index: FieldIndex,
    roles: &[Role],
    tool: Option<&Tool>,
    context: &dyn TemplateContext,
) -> Option<FieldGroup> {
    let mut sides = BTreeMap::new();

    for role in roles {
        let configs = resolve_field_configs(source, &index, &search_prefixes(*role, tool));
        match FieldSide::format(&configs, *role, index, context) {
            Ok(side) => {
                sides.insert(*role, side);
            }
            Err(error) => {
                log_error!(error.error_code(), error.to_string(), "index" => index, "role" => role);
                log_error!(
                    codes::fields::FIELD_SKIPPED,
                    format!("Could not process {}_VAR{} variables", role, index)
                );
                return None;
            }
        }
    }

    let mut counts = sides
        .iter()
        .filter(|(_, side)| !side.levels.is_empty())
        .map(|(role, side)| (*role, side.levels.len()));
    if let Some((first_role, first_count)) = counts.next() {
        if let Some((role, count)) = counts.find(|(_, count)| *count != first_count) {
            log_error!(
                codes::validation::LEVEL_COUNT_MISMATCH,
                format!(
                    "{}_VAR{} has {} levels but {}_VAR{} has {}",
                    first_role, index, first_count, role, index, count
                )
            );
            return None;
        }
    }

    Some(FieldGroup { index, sides })
}

/// Ordered field records: index ascending, then level position
pub fn assemble_var_list<S: ConfigSource + ?Sized>(
    source: &S,
    data_type: Option<Role>,
    tool: Option<&Tool>,
    context: &dyn TemplateContext,
) -> Result<Vec<FieldRecord>, VarListError> {
    Ok(assemble_field_groups(source, data_type, tool, context)?
        .iter()
        .flat_map(FieldGroup::records)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ConfigNamespace;
    use crate::template::{NoSubstitution, TagContext};
    use assert_matches::assert_matches;

    fn assemble(source: &ConfigNamespace, data_type: Option<Role>) -> Vec<FieldRecord> {
        assemble_var_list(source, data_type, None, &NoSubstitution).unwrap()
    }

    #[test]
    fn test_level_pairing() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "A,B"),
            ("OBS_VAR1_NAME", "TMP"),
            ("OBS_VAR1_LEVELS", "C,D"),
        ]);

        let records = assemble(&source, None);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, FieldIndex::new(1));
        assert_eq!(records[0].fcst().unwrap().level, "A");
        assert_eq!(records[0].obs().unwrap().level, "C");
        assert_eq!(records[1].fcst().unwrap().level, "B");
        assert_eq!(records[1].obs().unwrap().level, "D");
    }

    #[test]
    fn test_one_sided_config_needs_explicit_data_type() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "P500,P750"),
        ]);

        assert!(assemble(&source, None).is_empty());

        let records = assemble(&source, Some(Role::Fcst));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fcst().unwrap().level, "P500");
        assert!(records[0].obs().is_none());
    }

    #[test]
    fn test_both_cannot_be_requested() {
        let source = ConfigNamespace::from_pairs([("BOTH_VAR1_NAME", "TMP")]);

        let result = assemble_var_list(&source, Some(Role::Both), None, &NoSubstitution);
        assert_matches!(result, Err(VarListError::BothNotAllowed));
    }

    #[test]
    fn test_both_keys_fill_both_sides() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "RH"),
            ("BOTH_VAR1_LEVELS", "P850"),
            ("BOTH_VAR1_THRESH", "gt50, ge80"),
            ("OBS_VAR1_OPTIONS", "censor_thresh = [ <0 ]"),
        ]);

        let records = assemble(&source, None);

        assert_eq!(records.len(), 1);
        let fcst = records[0].fcst().unwrap();
        let obs = records[0].obs().unwrap();
        assert_eq!(fcst.name, "RH");
        assert_eq!(obs.name, "RH");
        assert_eq!(fcst.thresh, vec!["gt50", "ge80"]);
        assert_eq!(fcst.extra, "");
        assert_eq!(obs.extra, "censor_thresh = [ <0 ];");
        assert_eq!(fcst.output_name, "RH");
    }

    #[test]
    fn test_indices_ascend_numerically() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR10_NAME", "TEN"),
            ("BOTH_VAR9_NAME", "NINE"),
            ("BOTH_VAR2_NAME", "TWO"),
        ]);

        let names: Vec<String> = assemble(&source, None)
            .iter()
            .map(|record| record.fcst().unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["TWO", "NINE", "TEN"]);
    }

    #[test]
    fn test_field_without_levels_yields_one_record() {
        let source = ConfigNamespace::from_pairs([("BOTH_VAR1_NAME", "TMP")]);

        let records = assemble(&source, None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fcst().unwrap().level, "");
    }

    #[test]
    fn test_python_embedding_counterpart_without_levels() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_LEVELS", "P500"),
            ("OBS_VAR1_NAME", "/path/read_obs.py /path/obs.nc"),
        ]);

        let records = assemble(&source, None);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fcst().unwrap().level, "P500");
        let obs = records[0].obs().unwrap();
        assert_eq!(obs.level, "");
        assert_eq!(obs.output_name, "/path/read_obs.py /path/obs.nc");
    }

    #[test]
    fn test_tool_specific_indices_override_generic() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "GENERIC"),
            ("BOTH_GRID_STAT_VAR2_NAME", "SPECIFIC"),
            ("BOTH_VAR2_LEVELS", "Z2"),
        ]);
        let grid_stat = Tool::canonicalize("grid_stat");
        let point_stat = Tool::canonicalize("PointStat");

        let records = assemble_var_list(&source, None, Some(&grid_stat), &NoSubstitution).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].index, FieldIndex::new(2));
        assert_eq!(records[0].fcst().unwrap().name, "SPECIFIC");
        assert_eq!(records[0].fcst().unwrap().level, "Z2");

        let records = assemble_var_list(&source, None, Some(&point_stat), &NoSubstitution).unwrap();
        let indices: Vec<FieldIndex> = records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![FieldIndex::new(1)]);
        assert_eq!(records[0].fcst().unwrap().name, "GENERIC");
    }

    #[test]
    fn test_level_tags_in_name() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP_{fcst_level}_{obs_level}"),
            ("FCST_VAR1_LEVELS", "P500,P750"),
            ("OBS_VAR1_NAME", "T_{obs_level}_{ens_level}"),
            ("OBS_VAR1_LEVELS", "500,750"),
        ]);

        let records = assemble(&source, None);

        assert_eq!(records[0].fcst().unwrap().name, "TMP_P500_500");
        assert_eq!(records[1].obs().unwrap().name, "T_750_{ens_level}");
        assert_eq!(records[1].obs().unwrap().output_name, "T_750_{ens_level}");
    }

    #[test]
    fn test_output_name_count_mismatch_skips_index() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "TMP"),
            ("BOTH_VAR1_LEVELS", "P500,P750"),
            ("BOTH_VAR1_OUTPUT_NAMES", "only_one"),
            ("BOTH_VAR2_NAME", "RH"),
            ("BOTH_VAR2_LEVELS", "P500,P750"),
            ("BOTH_VAR2_OUTPUT_NAMES", "rh500, rh750"),
        ]);

        let records = assemble(&source, None);

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.index == FieldIndex::new(2)));
        assert_eq!(records[1].fcst().unwrap().output_name, "rh750");
    }

    #[test]
    fn test_invalid_threshold_skips_index() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("FCST_VAR1_THRESH", "bogus"),
            ("FCST_VAR2_NAME", "RH"),
            ("FCST_VAR2_THRESH", ">80"),
        ]);

        let records = assemble(&source, Some(Role::Fcst));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fcst().unwrap().thresh, vec![">80"]);
    }

    #[test]
    fn test_requested_role_without_names_is_empty() {
        let source = ConfigNamespace::from_pairs([
            ("FCST_VAR1_NAME", "TMP"),
            ("OBS_VAR1_THRESH", "gt1"),
        ]);

        let groups = assemble_field_groups(&source, Some(Role::Obs), None, &NoSubstitution).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_template_context_applied() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "{model}_APCP"),
            ("BOTH_VAR1_LEVELS", "A{accum}"),
        ]);
        let context = TagContext::new()
            .with_value("model", "GFS")
            .with_value("accum", "06");

        let records = assemble_var_list(&source, None, None, &context).unwrap();
        assert_eq!(records[0].fcst().unwrap().name, "GFS_APCP");
        assert_eq!(records[0].obs().unwrap().level, "A06");
    }

    #[test]
    fn test_field_groups_keep_level_lists() {
        let source = ConfigNamespace::from_pairs([
            ("BOTH_VAR1_NAME", "TMP"),
            ("BOTH_VAR1_LEVELS", "P500, P750, P850"),
        ]);

        let groups = assemble_field_groups(&source, None, None, &NoSubstitution).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].record_count(), 3);
        assert_eq!(
            groups[0].side(Role::Obs).unwrap().levels,
            vec!["P500", "P750", "P850"]
        );
    }

    #[test]
    fn test_record_serialization() {
        let source = ConfigNamespace::from_pairs([("ENS_VAR1_NAME", "TMP"), ("ENS_VAR1_LEVELS", "Z2")]);

        let records = assemble(&source, Some(Role::Ens));
        let json = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(json["index"], "1");
        assert_eq!(json["ens"]["name"], "TMP");
        assert_eq!(json["ens"]["level"], "Z2");
        assert_eq!(json["ens"]["output_name"], "TMP");
    }
}
