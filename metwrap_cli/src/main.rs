//! # metwrap CLI
//!
//! Loads wrapper config files into a namespace and runs one field or list
//! operation on it. Results go to stdout as JSON; diagnostics go to stderr.

mod cli;

use chrono::NaiveDateTime;
use clap::Parser;
use cli::{Cli, Commands};
use metwrap_config::config::build_info;
use metwrap_config::fields::{
    assemble_var_list, find_var_extension_indices, validate_field_info_configs_with,
};
use metwrap_config::logging::codes;
use metwrap_config::parsing::{
    expand_int_ranges, format_level, format_thresh, list_to_str, parse_list, parse_threshold,
    split_level,
};
use metwrap_config::{
    log_debug, log_error, logging, ConfigNamespace, ConfigSource, NamespaceLoader, RuntimeConfig,
    TagContext, Tool,
};
use serde::Serialize;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let mut runtime = RuntimeConfig::default();
    if cli.json_logs {
        runtime.logging.use_structured_logging = true;
    }
    if cli.verbose {
        runtime.logging.min_log_level = metwrap_config::config::LogLevel::Debug;
    }

    env_logger::Builder::new()
        .filter_level(runtime.logging.min_log_level.to_level_filter())
        .parse_default_env()
        .format_target(false)
        .init();
    logging::init_global_logging(&runtime)?;
    log_debug!(build_info::source_info());

    if let Err(error) = run(cli, &runtime) {
        log_error!(
            codes::system::INTERNAL_ERROR,
            format!("metwrap failed: {}", error)
        );
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli, runtime: &RuntimeConfig) -> CliResult<()> {
    let namespace = NamespaceLoader::new()
        .with_files(&cli.configs)
        .with_overrides(&cli.overrides)
        .load()?;
    log::debug!(
        "loaded {} keys from {} config files",
        namespace.len(),
        cli.configs.len()
    );

    match cli.command {
        Commands::List {
            value,
            key,
            section,
            no_expand,
            ints,
            rejoin,
        } => {
            let raw = match (value, key) {
                (Some(value), _) => value,
                (None, Some(key)) => namespace.get_string(&section, &key)?.unwrap_or_default(),
                (None, None) => return Err("either a list value or --key is required".into()),
            };

            if ints {
                return print_json(&expand_int_ranges(&raw)?);
            }

            let expand = runtime.parser.expand_ranges && !no_expand;
            let items = parse_list(&raw, expand);
            if rejoin {
                print_json(&list_to_str(&items, true))
            } else {
                print_json(&items)
            }
        }

        Commands::Filename { level, thresh } => {
            print_json(&filename_parts(level.as_deref(), thresh.as_deref()))
        }

        Commands::Thresh { thresholds } => run_thresh(&thresholds),

        Commands::Indices {
            roles,
            tool,
            extension,
        } => {
            let tool = tool.as_deref().map(Tool::canonicalize);
            let indices =
                find_var_extension_indices(&namespace, &roles, tool.as_ref(), extension)?;
            print_json(&indices)
        }

        Commands::Fields {
            data_type,
            tool,
            times,
            values,
        } => {
            let tool = tool.as_deref().map(Tool::canonicalize);
            let context = build_context(&times, &values)?;
            let records = assemble_var_list(&namespace, data_type, tool.as_ref(), &context)?;
            print_json(&records)
        }

        Commands::Validate { tools } => run_validate(&namespace, &tools, runtime),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ThresholdReport<'a> {
    threshold: &'a str,
    valid: bool,
    components: Option<Vec<metwrap_config::parsing::ThresholdComponent>>,
}

fn run_thresh(thresholds: &[String]) -> CliResult<()> {
    let reports: Vec<ThresholdReport> = thresholds
        .iter()
        .map(|threshold| {
            let components = parse_threshold(threshold);
            ThresholdReport {
                threshold,
                valid: components.is_some(),
                components,
            }
        })
        .collect();

    print_json(&reports)?;
    if reports.iter().any(|report| !report.valid) {
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq, Serialize)]
struct FilenameParts {
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thresh: Option<String>,
}

fn filename_parts(level: Option<&str>, thresh: Option<&str>) -> FilenameParts {
    let mut parts = FilenameParts {
        thresh: thresh.map(format_thresh),
        ..FilenameParts::default()
    };

    if let Some(level) = level {
        parts.level = Some(format_level(level));
        if let Some((level_type, value)) = split_level(level) {
            parts.level_type = Some(level_type);
            parts.level_value = Some(value);
        }
    }
    parts
}

fn run_validate(
    namespace: &ConfigNamespace,
    tools: &[String],
    runtime: &RuntimeConfig,
) -> CliResult<()> {
    let tools: Vec<Tool> = tools.iter().map(|tool| Tool::canonicalize(tool)).collect();
    let requested = if tools.is_empty() {
        None
    } else {
        Some(tools.as_slice())
    };

    let report = validate_field_info_configs_with(namespace, requested, &runtime.validation);
    report.log_diagnostics();
    print_json(&report)?;

    if !report.is_valid {
        std::process::exit(1);
    }
    Ok(())
}

/// Accepts `YYYYmmddHH`, `YYYYmmddHHMM` or `YYYYmmddHHMMSS`
fn parse_time(text: &str) -> Option<NaiveDateTime> {
    if !matches!(text.len(), 10 | 12 | 14) || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0<14}", text);
    NaiveDateTime::parse_from_str(&padded, "%Y%m%d%H%M%S").ok()
}

fn split_assignment(text: &str) -> CliResult<(&str, &str)> {
    text.split_once('=')
        .map(|(tag, value)| (tag.trim(), value.trim()))
        .filter(|(tag, _)| !tag.is_empty())
        .ok_or_else(|| format!("expected TAG=VALUE, got '{}'", text).into())
}

fn build_context(times: &[String], values: &[String]) -> CliResult<TagContext> {
    let mut context = TagContext::new();
    for assignment in times {
        let (tag, value) = split_assignment(assignment)?;
        let time =
            parse_time(value).ok_or_else(|| format!("invalid time '{}' for {}", value, tag))?;
        context = context.with_time(tag, time);
    }
    for assignment in values {
        let (tag, value) = split_assignment(assignment)?;
        context = context.with_value(tag, value);
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metwrap_config::TemplateContext;

    #[test]
    fn test_parse_time_precisions() {
        let expected = NaiveDateTime::parse_from_str("20240101120000", "%Y%m%d%H%M%S").ok();
        assert_eq!(parse_time("2024010112"), expected);
        assert_eq!(parse_time("202401011200"), expected);
        assert_eq!(parse_time("20240101120000"), expected);
        assert_eq!(parse_time("20240101"), None);
        assert_eq!(parse_time("2024010112ab"), None);
    }

    #[test]
    fn test_filename_parts() {
        assert_eq!(
            filename_parts(Some("P500"), Some(">=5, <1")),
            FilenameParts {
                level: Some("P500".to_string()),
                level_type: Some("P".to_string()),
                level_value: Some("500".to_string()),
                thresh: Some("ge5_lt1".to_string()),
            }
        );

        let wildcard = filename_parts(Some("(*,*)"), None);
        assert_eq!(wildcard.level.as_deref(), Some("allall"));
        assert_eq!(wildcard.level_type, None);
        assert_eq!(wildcard.thresh, None);
    }

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("init = 2024").unwrap(), ("init", "2024"));
        assert!(split_assignment("=2024").is_err());
        assert!(split_assignment("init").is_err());
    }

    #[test]
    fn test_build_context_substitutes_tags() {
        let context = build_context(
            &["init=2024010112".to_string()],
            &["model=GFS".to_string()],
        )
        .unwrap();

        assert_eq!(
            context.substitute("{model}_{init?fmt=%Y%m%d%H}"),
            "GFS_2024010112"
        );
    }
}
