//! Ordered key prefixes searched for one role

use super::Role;
use crate::tools::Tool;

/// Prefixes to search for `role`, most specific first
///
/// The tool tier (`FCST_GRID_STAT_`, `BOTH_GRID_STAT_`) precedes the generic
/// tier (`FCST_`, `BOTH_`). Only FCST and OBS get BOTH fallbacks.
pub fn search_prefixes(role: Role, tool: Option<&Tool>) -> Vec<String> {
    let mut tiers = Vec::with_capacity(2);
    if let Some(tool) = tool {
        tiers.push(format!("{}_", tool.identifier));
    }
    tiers.push(String::new());

    let mut prefixes = Vec::with_capacity(4);
    for tier in &tiers {
        prefixes.push(format!("{}_{}", role.as_str(), tier));
        if role.has_both_fallback() {
            prefixes.push(format!("{}_{}", Role::Both.as_str(), tier));
        }
    }
    prefixes
}
