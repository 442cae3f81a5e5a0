//! `{tag}` substitution applied to field values before they are emitted
//!
//! Field names and levels may carry filename-template tags such as
//! `{init?fmt=%Y%m%d}`. The time loop that knows the real values lives
//! outside this crate and hands one in as a [`TemplateContext`].

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

const DEFAULT_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

pub trait TemplateContext {
    /// Replace every tag this context knows; unknown tags stay in place
    fn substitute(&self, template: &str) -> String;
}

/// Context that leaves every value untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSubstitution;

impl TemplateContext for NoSubstitution {
    fn substitute(&self, template: &str) -> String {
        template.to_string()
    }
}

/// Context built from named times and plain string values
#[derive(Debug, Clone, Default)]
pub struct TagContext {
    times: BTreeMap<String, NaiveDateTime>,
    values: BTreeMap<String, String>,
}

impl TagContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a time tag, rendered with `{tag?fmt=...}`
    pub fn with_time(mut self, tag: &str, time: NaiveDateTime) -> Self {
        self.times.insert(tag.to_string(), time);
        self
    }

    pub fn with_value(mut self, tag: &str, value: &str) -> Self {
        self.values.insert(tag.to_string(), value.to_string());
        self
    }

    fn render(&self, tag: &str) -> Option<String> {
        let (name, format) = match tag.split_once("?fmt=") {
            Some((name, format)) => (name, Some(format)),
            None => (tag, None),
        };

        if let Some(time) = self.times.get(name) {
            let format = format.unwrap_or(DEFAULT_TIME_FORMAT);
            let items: Vec<Item> = StrftimeItems::new(format).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                log::warn!("Invalid time format '{}' in tag {{{}}}", format, tag);
                return None;
            }
            return Some(time.format_with_items(items.into_iter()).to_string());
        }

        match format {
            None => self.values.get(name).cloned(),
            Some(_) => None,
        }
    }
}

impl TemplateContext for TagContext {
    fn substitute(&self, template: &str) -> String {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            output.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find('}') {
                Some(close) => {
                    let tag = &after[..close];
                    match self.render(tag) {
                        Some(value) => output.push_str(&value),
                        None => {
                            output.push('{');
                            output.push_str(tag);
                            output.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    output.push('{');
                    rest = after;
                }
            }
        }

        output.push_str(rest);
        output
    }
}
