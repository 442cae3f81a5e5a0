//! Comma-separated list parsing (`getlist`)
//!
//! Values in the namespace are loosely formatted lists: they may be wrapped
//! in `[ ... ];`, carry quoted items containing commas, nest groups such as
//! `{init?fmt=%H}` or `(*,*)`, and embed `begin_end_incr(...)` ranges. The
//! parser never fails; the worst case is an item that reads unexpectedly.

use super::range::{self, split_top_level_items};
use super::text::remove_quotes;
use crate::config::constants::compile_time::parsing::MAX_RANGE_ITEMS;
use crate::logging::codes::{self, Code};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("Invalid integer '{item}' in list")]
    InvalidInteger { item: String },

    #[error("Range '{item}' would produce {count} items (max {MAX_RANGE_ITEMS})")]
    RangeTooLarge { item: String, count: u128 },
}

impl ListError {
    pub fn error_code(&self) -> Code {
        match self {
            ListError::InvalidInteger { .. } => codes::parsing::INVALID_INTEGER,
            ListError::RangeTooLarge { .. } => codes::parsing::RANGE_TOO_LARGE,
        }
    }
}

/// Parse a list value with range expansion enabled
pub fn getlist(raw: &str) -> Vec<String> {
    parse_list(raw, true)
}

/// Parse a raw value into an ordered list of items
pub fn parse_list(raw: &str, expand_ranges: bool) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let unwrapped = strip_list_literal(trimmed);
    if unwrapped.is_empty() {
        return Vec::new();
    }

    let collapsed = collapse_separator_whitespace(unwrapped);
    let expanded = if expand_ranges {
        range::expand_ranges(&collapsed)
    } else {
        collapsed
    };

    let pieces = split_top_level_items(&expanded);
    repair_quoted_items(&pieces)
        .into_iter()
        .map(|item| strip_double_quotes(&item).to_string())
        .collect()
}

/// Remove a trailing `;` and one layer of `[...]` enclosing the whole value
fn strip_list_literal(value: &str) -> &str {
    let value = value.strip_suffix(';').unwrap_or(value).trim_end();

    if value.starts_with('[') && value.ends_with(']') && closing_bracket(value) == Some(value.len() - 1)
    {
        return value[1..value.len() - 1].trim();
    }
    value
}

/// Byte offset of the `]` closing the `[` at offset 0
fn closing_bracket(value: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (position, character) in value.char_indices() {
        match character {
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(position);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop whitespace next to commas that separate top-level items
fn collapse_separator_whitespace(value: &str) -> String {
    split_top_level_items(value)
        .iter()
        .map(|item| item.trim())
        .collect::<Vec<_>>()
        .join(",")
}

/// Re-join pieces that were split inside a double-quoted item
fn repair_quoted_items(pieces: &[&str]) -> Vec<String> {
    let mut items = Vec::with_capacity(pieces.len());
    let mut buffer: Option<String> = None;

    for piece in pieces {
        let quotes = piece.matches('"').count();
        if let Some(mut pending) = buffer.take() {
            pending.push(',');
            pending.push_str(piece);
            if quotes == 1 {
                items.push(pending);
            } else {
                buffer = Some(pending);
            }
        } else if quotes % 2 == 1 {
            buffer = Some(piece.to_string());
        } else {
            items.push(piece.to_string());
        }
    }

    items.extend(buffer);
    items
}

fn strip_double_quotes(item: &str) -> &str {
    if item.len() >= 2 && item.starts_with('"') && item.ends_with('"') {
        &item[1..item.len() - 1]
    } else {
        item
    }
}

/// Parse a list whose items must all be integers
pub fn parse_int_list(raw: &str) -> Result<Vec<i64>, ListError> {
    getlist(raw)
        .into_iter()
        .map(|item| {
            item.trim()
                .parse::<i64>()
                .map_err(|_| ListError::InvalidInteger { item })
        })
        .collect()
}

/// Expand dash ranges like `1-3,5` into `[1, 2, 3, 5]`
pub fn expand_int_ranges(raw: &str) -> Result<Vec<i64>, ListError> {
    let mut values = Vec::new();

    for item in getlist(raw) {
        let text = item.trim();
        let invalid = || ListError::InvalidInteger {
            item: text.to_string(),
        };

        // A leading '-' is a sign, not a separator
        let split_at = text
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '-')
            .map(|(position, _)| position);

        match split_at {
            Some(position) => {
                let first = text[..position].trim().parse::<i64>().map_err(|_| invalid())?;
                let last = text[position + 1..]
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| invalid())?;

                let count = (last as i128 - first as i128).unsigned_abs() + 1;
                if count > MAX_RANGE_ITEMS as u128 {
                    return Err(ListError::RangeTooLarge {
                        item: text.to_string(),
                        count,
                    });
                }

                if first <= last {
                    values.extend(first..=last);
                } else {
                    values.extend((last..=first).rev());
                }
            }
            None => values.push(text.parse::<i64>().map_err(|_| invalid())?),
        }
    }

    Ok(values)
}

/// Format items back into a list string, optionally quoting each item
///
/// This is how resolved lists are written into generated tool config
/// files; `metwrap list --rejoin` prints the same text.
pub fn list_to_str(items: &[String], add_quotes: bool) -> String {
    if !add_quotes {
        return items.join(", ");
    }

    items
        .iter()
        .map(|item| format!("\"{}\"", remove_quotes(item)))
        .collect::<Vec<_>>()
        .join(", ")
}
