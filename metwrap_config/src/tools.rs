//! Registry of wrapper names and the identifiers used in config keys
//!
//! Key prefixes are built from the registered identifier, never from the raw
//! text a user typed, so `point2grid`, `Point2Grid` and `POINT2GRID` all
//! resolve to `POINT2GRID` and `grid_stat` / `GridStat` to `GRID_STAT`.

use crate::config::constants::compile_time::namespace::PROCESS_LIST_KEY;
use crate::namespace::{ConfigSource, NamespaceError};
use crate::parsing::getlist;
use serde::Serialize;

/// `(wrapper name, config key identifier)`
const REGISTERED_TOOLS: &[(&str, &str)] = &[
    ("ASCII2NC", "ASCII2NC"),
    ("CyclonePlotter", "CYCLONE_PLOTTER"),
    ("EnsembleStat", "ENSEMBLE_STAT"),
    ("ExtractTiles", "EXTRACT_TILES"),
    ("GempakToCF", "GEMPAKTOCF"),
    ("GenEnsProd", "GEN_ENS_PROD"),
    ("GenVxMask", "GEN_VX_MASK"),
    ("GFDLTracker", "GFDL_TRACKER"),
    ("GridDiag", "GRID_DIAG"),
    ("GridStat", "GRID_STAT"),
    ("IODA2NC", "IODA2NC"),
    ("METDbLoad", "MET_DB_LOAD"),
    ("MODE", "MODE"),
    ("MTD", "MTD"),
    ("PB2NC", "PB2NC"),
    ("PCPCombine", "PCP_COMBINE"),
    ("PlotDataPlane", "PLOT_DATA_PLANE"),
    ("PlotPointObs", "PLOT_POINT_OBS"),
    ("Point2Grid", "POINT2GRID"),
    ("PointStat", "POINT_STAT"),
    ("PyEmbedIngest", "PY_EMBED_INGEST"),
    ("RegridDataPlane", "REGRID_DATA_PLANE"),
    ("SeriesAnalysis", "SERIES_ANALYSIS"),
    ("StatAnalysis", "STAT_ANALYSIS"),
    ("TCDiag", "TC_DIAG"),
    ("TCGen", "TC_GEN"),
    ("TCMPRPlotter", "TCMPR_PLOTTER"),
    ("TCPairs", "TC_PAIRS"),
    ("TCRMW", "TC_RMW"),
    ("TCStat", "TC_STAT"),
    ("UserScript", "USER_SCRIPT"),
    ("WaveletStat", "WAVELET_STAT"),
];

/// Alternate spellings that do not reduce to a wrapper name
const ALIASES: &[(&str, &str)] = &[("modetimedomain", "MTD"), ("pointtogrid", "Point2Grid")];

/// A canonical tool: the wrapper name and its config key identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Tool {
    pub wrapper_name: String,
    pub identifier: String,
    pub registered: bool,
}

impl Tool {
    /// Resolve any spelling of a tool name
    ///
    /// Unregistered names fall back to uppercasing with underscores preserved.
    pub fn canonicalize(raw: &str) -> Self {
        let lookup = normalize(raw);
        let lookup = ALIASES
            .iter()
            .find(|(alias, _)| *alias == lookup)
            .map(|(_, wrapper)| normalize(wrapper))
            .unwrap_or(lookup);

        match REGISTERED_TOOLS
            .iter()
            .find(|(wrapper, _)| normalize(wrapper) == lookup)
        {
            Some((wrapper, identifier)) => Self {
                wrapper_name: wrapper.to_string(),
                identifier: identifier.to_string(),
                registered: true,
            },
            None => Self {
                wrapper_name: raw.trim().to_string(),
                identifier: raw.trim().to_uppercase(),
                registered: false,
            },
        }
    }

    /// Every registered tool
    pub fn registered() -> impl Iterator<Item = Tool> {
        REGISTERED_TOOLS.iter().map(|(wrapper, identifier)| Tool {
            wrapper_name: wrapper.to_string(),
            identifier: identifier.to_string(),
            registered: true,
        })
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wrapper_name)
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// One `PROCESS_LIST` entry, e.g. `PointStat(obs2)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessEntry {
    pub tool: Tool,
    pub instance: Option<String>,
}

/// Parse a process list value into tools with optional instance names
pub fn parse_process_list(raw: &str) -> Vec<ProcessEntry> {
    getlist(raw)
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            let item = item.trim();
            match item.split_once('(') {
                Some((name, rest)) => {
                    let instance = rest.trim_end_matches(')').trim();
                    ProcessEntry {
                        tool: Tool::canonicalize(name),
                        instance: (!instance.is_empty()).then(|| instance.to_string()),
                    }
                }
                None => ProcessEntry {
                    tool: Tool::canonicalize(item),
                    instance: None,
                },
            }
        })
        .collect()
}

/// Tools named by the namespace's process list, deduplicated in order
pub fn process_list_tools<S: ConfigSource + ?Sized>(
    source: &S,
    section: &str,
) -> Result<Vec<Tool>, NamespaceError> {
    let raw = source.get_string(section, PROCESS_LIST_KEY)?.unwrap_or_default();

    let mut tools: Vec<Tool> = Vec::new();
    for entry in parse_process_list(&raw) {
        if !tools.contains(&entry.tool) {
            tools.push(entry.tool);
        }
    }
    Ok(tools)
}
