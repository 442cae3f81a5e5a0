//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use metwrap_config::fields::FieldAttribute;
use metwrap_config::Role;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "metwrap")]
#[command(about = "Resolve numbered field settings and parse list values from wrapper configs")]
#[command(version)]
pub(crate) struct Cli {
    /// Config file to load (TOML); later files override earlier ones
    #[arg(short, long = "config", global = true)]
    pub(crate) configs: Vec<PathBuf>,

    /// Override a value after all files are loaded: [SECTION.]KEY=VALUE
    #[arg(long = "set", global = true)]
    pub(crate) overrides: Vec<String>,

    /// Emit diagnostics as JSON lines on stderr
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) json_logs: bool,

    /// Show debug diagnostics
    #[arg(short, long, global = true, default_value_t = false)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Parse a list value, expanding begin_end_incr(...) ranges
    List {
        /// Raw list text, e.g. "1, begin_end_incr(0,6,3)"
        value: Option<String>,

        /// Read the list from this config key instead
        #[arg(long, conflicts_with = "value")]
        key: Option<String>,

        /// Section to read `--key` from
        #[arg(long, default_value = "config")]
        section: String,

        /// Keep begin_end_incr(...) expressions as written
        #[arg(long, default_value_t = false)]
        no_expand: bool,

        /// Parse the items as integers
        #[arg(long, default_value_t = false, conflicts_with = "rejoin")]
        ints: bool,

        /// Print the items rejoined as one quoted list string
        #[arg(long, default_value_t = false)]
        rejoin: bool,
    },

    /// Render a level and thresholds the way they appear in output filenames
    Filename {
        /// Level, e.g. P500 or "(*,*)"
        #[arg(short, long)]
        level: Option<String>,

        /// Threshold list, e.g. ">=5, <1"
        #[arg(short, long)]
        thresh: Option<String>,
    },

    /// Parse threshold expressions, e.g. "gt4" or ">3&&<5"
    Thresh {
        #[arg(required = true)]
        thresholds: Vec<String>,
    },

    /// List the VAR<n> indices set for the given roles
    Indices {
        /// Roles to search (FCST, OBS, ENS, DATA); BOTH is implied for FCST/OBS
        #[arg(short, long = "role", value_parser = parse_role, default_values = ["FCST", "OBS"])]
        roles: Vec<Role>,

        /// Only match tool-specific keys, e.g. GridStat
        #[arg(short, long)]
        tool: Option<String>,

        /// Field attribute to look for (NAME, LEVELS, THRESH, OPTIONS, OUTPUT_NAMES)
        #[arg(short, long, value_parser = parse_attribute, default_value = "NAME")]
        extension: FieldAttribute,
    },

    /// Build the field records a tool would run on
    Fields {
        /// Only one side: FCST, OBS, ENS or DATA; FCST/OBS pairs are validated first otherwise
        #[arg(short, long, value_parser = parse_role)]
        data_type: Option<Role>,

        #[arg(short, long)]
        tool: Option<String>,

        /// Time tag for template substitution: TAG=YYYYmmddHH[MM[SS]]
        #[arg(long = "time")]
        times: Vec<String>,

        /// Plain tag for template substitution: TAG=VALUE
        #[arg(long = "value")]
        values: Vec<String>,
    },

    /// Check every field setting for the generic tier and each tool
    Validate {
        /// Tools to check; defaults to the tools named in PROCESS_LIST
        #[arg(short, long = "tool")]
        tools: Vec<String>,
    },
}

fn parse_role(text: &str) -> Result<Role, String> {
    Role::parse(text).ok_or_else(|| format!("unknown role '{}'", text))
}

fn parse_attribute(text: &str) -> Result<FieldAttribute, String> {
    let upper = text.trim().to_uppercase();
    FieldAttribute::ALL
        .into_iter()
        .find(|attribute| attribute.suffixes().contains(&upper.as_str()))
        .ok_or_else(|| format!("unknown field extension '{}'", text))
}
