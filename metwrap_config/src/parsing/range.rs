//! `begin_end_incr(start,end,step[,precision])` expansion
//!
//! Expansion runs on the raw value before the top-level comma split. Each
//! top-level item is expanded on its own: text before and after the token is
//! re-applied to every generated element, and several tokens in one item
//! expand as a cartesian product with the left-most token outermost.

use crate::config::constants::compile_time::parsing::{
    MAX_RANGE_ITEMS, MAX_RANGE_PRECISION, RANGE_FUNCTION,
};
use crate::logging::codes::{self, Code};

/// Why a range expression was left literally in place
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("Expected 3 or 4 integer arguments, precision at most {MAX_RANGE_PRECISION}, in '{expression}'")]
    InvalidArguments { expression: String },

    #[error("Step of zero in '{expression}'")]
    ZeroStep { expression: String },

    #[error("Step direction of '{expression}' produces no values")]
    EmptyRange { expression: String },

    #[error("'{expression}' would produce {count} items (max {MAX_RANGE_ITEMS})")]
    TooManyItems { expression: String, count: u128 },
}

impl RangeError {
    pub fn error_code(&self) -> Code {
        match self {
            RangeError::TooManyItems { .. } => codes::parsing::RANGE_TOO_LARGE,
            _ => codes::parsing::MALFORMED_RANGE,
        }
    }
}

/// Parsed arguments of one range token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub precision: Option<usize>,
}

impl RangeSpec {
    /// Parse the comma-separated argument text found between the parentheses
    pub fn parse(arguments: &str, expression: &str) -> Result<Self, RangeError> {
        let invalid = || RangeError::InvalidArguments {
            expression: expression.to_string(),
        };

        let parts: Vec<&str> = arguments.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(invalid());
        }

        let start = parts[0].parse::<i64>().map_err(|_| invalid())?;
        let end = parts[1].parse::<i64>().map_err(|_| invalid())?;
        let step = parts[2].parse::<i64>().map_err(|_| invalid())?;
        let precision = match parts.get(3) {
            Some(text) => Some(text.parse::<usize>().map_err(|_| invalid())?),
            None => None,
        };

        let spec = Self {
            start,
            end,
            step,
            precision,
        };
        spec.check(expression)?;
        Ok(spec)
    }

    fn check(&self, expression: &str) -> Result<(), RangeError> {
        if self.precision.is_some_and(|width| width > MAX_RANGE_PRECISION) {
            return Err(RangeError::InvalidArguments {
                expression: expression.to_string(),
            });
        }
        if self.step == 0 {
            return Err(RangeError::ZeroStep {
                expression: expression.to_string(),
            });
        }
        if (self.step > 0 && self.start > self.end) || (self.step < 0 && self.start < self.end) {
            return Err(RangeError::EmptyRange {
                expression: expression.to_string(),
            });
        }

        let count = self.count();
        if count > MAX_RANGE_ITEMS as u128 {
            return Err(RangeError::TooManyItems {
                expression: expression.to_string(),
                count,
            });
        }
        Ok(())
    }

    /// Number of values the range produces, `end` inclusive
    pub fn count(&self) -> u128 {
        let span = (self.end as i128 - self.start as i128).unsigned_abs();
        span / self.step.unsigned_abs() as u128 + 1
    }

    /// Generated values, zero-padded with the sign kept in front
    pub fn values(&self) -> Vec<String> {
        let mut values = Vec::new();
        let mut current = self.start as i128;
        let end = self.end as i128;
        let step = self.step as i128;

        while (step > 0 && current <= end) || (step < 0 && current >= end) {
            values.push(match self.precision {
                Some(width) => format!("{:0width$}", current, width = width),
                None => current.to_string(),
            });
            current += step;
        }
        values
    }
}

/// Expand every range token in `raw`, keeping top-level item boundaries
pub fn expand_ranges(raw: &str) -> String {
    if !raw.contains(RANGE_FUNCTION) {
        return raw.to_string();
    }

    split_top_level_items(raw)
        .into_iter()
        .flat_map(expand_item)
        .collect::<Vec<_>>()
        .join(",")
}

/// Split on the commas found by [`top_level_commas`]
pub(crate) fn split_top_level_items(raw: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;

    for position in top_level_commas(raw) {
        items.push(&raw[start..position]);
        start = position + 1;
    }
    items.push(&raw[start..]);
    items
}

/// Byte offsets of the commas outside any `[]`, `()` or `{}` group
///
/// Brackets inside double quotes do not count. A closer ends the nearest
/// open group of its own kind. An opener that is never closed is read as
/// plain text and the scan resumes right after it.
pub(crate) fn top_level_commas(raw: &str) -> Vec<usize> {
    let mut commas = Vec::new();
    let mut resume = 0;

    loop {
        let mut open: Vec<(char, usize)> = Vec::new();
        let mut in_quotes = false;

        for (offset, character) in raw[resume..].char_indices() {
            let position = resume + offset;
            match character {
                '"' => in_quotes = !in_quotes,
                _ if in_quotes => {}
                '[' | '(' | '{' => open.push((character, position)),
                ']' | ')' | '}' => {
                    let opener = opener_for(character);
                    if let Some(depth) = open.iter().rposition(|(kind, _)| *kind == opener) {
                        open.truncate(depth);
                    }
                }
                ',' if open.is_empty() => commas.push(position),
                _ => {}
            }
        }

        // Commas after the outermost unclosed opener were never recorded
        match open.first() {
            Some(&(_, position)) => resume = position + 1,
            None => return commas,
        }
    }
}

fn opener_for(closer: char) -> char {
    match closer {
        ']' => '[',
        ')' => '(',
        _ => '{',
    }
}

enum Segment<'a> {
    Text(&'a str),
    Range(RangeSpec),
}

/// Expand the range tokens of one item as a cartesian product
fn expand_item(item: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut text_from = 0;
    let mut search_from = 0;
    let mut total: u128 = 1;

    while let Some(token) = find_token(item, search_from) {
        let expression = &item[token.start..token.end];
        match RangeSpec::parse(&item[token.arguments_start..token.end - 1], expression) {
            Ok(spec) => {
                segments.push(Segment::Text(&item[text_from..token.start]));
                segments.push(Segment::Range(spec));
                total = total.saturating_mul(spec.count());
                text_from = token.end;
            }
            Err(error) => log_unexpanded(&error, expression),
        }
        search_from = token.end;
    }

    if segments.is_empty() {
        return vec![item.to_string()];
    }
    if total > MAX_RANGE_ITEMS as u128 {
        let error = RangeError::TooManyItems {
            expression: item.to_string(),
            count: total,
        };
        log_unexpanded(&error, item);
        return vec![item.to_string()];
    }
    segments.push(Segment::Text(&item[text_from..]));

    let mut expanded = vec![String::new()];
    for segment in segments {
        match segment {
            Segment::Text(text) => expanded.iter_mut().for_each(|value| value.push_str(text)),
            Segment::Range(spec) => {
                let values = spec.values();
                expanded = expanded
                    .iter()
                    .flat_map(|head| values.iter().map(move |value| format!("{}{}", head, value)))
                    .collect();
            }
        }
    }
    expanded
}

fn log_unexpanded(error: &RangeError, expression: &str) {
    crate::log_warning!(
        error.error_code(),
        format!("{}; left unexpanded", error),
        "expression" => expression
    );
}

struct Token {
    start: usize,
    arguments_start: usize,
    end: usize,
}

/// Locate the next `begin_end_incr(` … `)` at or after `from`
fn find_token(item: &str, from: usize) -> Option<Token> {
    let opener = format!("{}(", RANGE_FUNCTION);
    let mut search_from = from;

    while let Some(offset) = item.get(search_from..)?.find(&opener) {
        let start = search_from + offset;
        let arguments_start = start + opener.len();
        match item[arguments_start..].find(')') {
            Some(close) => {
                return Some(Token {
                    start,
                    arguments_start,
                    end: arguments_start + close + 1,
                })
            }
            None => search_from = arguments_start,
        }
    }
    None
}
