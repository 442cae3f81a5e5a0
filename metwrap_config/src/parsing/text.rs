//! Small string helpers shared by the list parser and field formatting

use crate::config::constants::compile_time::parsing::PYTHON_SCRIPT_EXTENSION;

/// Strip one layer of matching double or single quotes
pub fn remove_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// True when any whitespace-separated token of `name` is a python script,
/// e.g. `/path/read_data.py /path/input.nc`
pub fn is_python_script(name: &str) -> bool {
    name.split_whitespace()
        .any(|token| token.ends_with(PYTHON_SCRIPT_EXTENSION))
}

/// Split a level like `P500` into its type letter and value
///
/// Returns `None` unless the level is one letter followed by word characters.
/// Command builders use the parts for output filenames (`metwrap filename`).
pub fn split_level(level: &str) -> Option<(String, String)> {
    let mut characters = level.chars();
    let level_type = characters.next().filter(|c| c.is_ascii_alphabetic())?;
    let value = characters.as_str();

    if value.is_empty() || !value.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((level_type.to_string(), value.to_string()))
}

/// Make a level safe to use inside a filename, e.g. `(*,*)` to `allall`
pub fn format_level(level: &str) -> String {
    remove_quotes(level)
        .chars()
        .filter_map(|c| match c {
            '(' | ')' | ',' => None,
            '*' => Some("all".to_string()),
            c if c.is_whitespace() => Some("_".to_string()),
            c => Some(c.to_string()),
        })
        .collect()
}

/// Replace `{tag}` with `value` everywhere in `text`
pub fn replace_tag(text: &str, tag: &str, value: &str) -> String {
    text.replace(&format!("{{{}}}", tag), value)
}
