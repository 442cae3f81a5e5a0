//! Comparison threshold grammar
//!
//! A threshold is one or more `<op><value>` components joined by `&&` or
//! `||`, where the operator is symbolic (`>=`) or lettered (`ge`) and the
//! value contains at least one digit. `NA` is accepted as a component.

use super::list::getlist;
use crate::config::constants::compile_time::parsing::THRESHOLD_NOT_APPLICABLE;
use crate::logging::codes;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "NA")]
    NotApplicable,
}

impl ComparisonOperator {
    /// Matching order: two-character symbols before their one-character prefixes
    pub const ALL: [ComparisonOperator; 6] = [
        ComparisonOperator::Ge,
        ComparisonOperator::Gt,
        ComparisonOperator::Eq,
        ComparisonOperator::Ne,
        ComparisonOperator::Le,
        ComparisonOperator::Lt,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::NotApplicable => THRESHOLD_NOT_APPLICABLE,
        }
    }

    pub fn letters(&self) -> &'static str {
        match self {
            ComparisonOperator::Ge => "ge",
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Eq => "eq",
            ComparisonOperator::Ne => "ne",
            ComparisonOperator::Le => "le",
            ComparisonOperator::Lt => "lt",
            ComparisonOperator::NotApplicable => THRESHOLD_NOT_APPLICABLE,
        }
    }

    /// Split a leading operator (either spelling) off `component`
    fn split_prefix(component: &str) -> Option<(Self, &str)> {
        Self::ALL.iter().find_map(|operator| {
            component
                .strip_prefix(operator.symbol())
                .or_else(|| component.strip_prefix(operator.letters()))
                .map(|rest| (*operator, rest))
        })
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Number(f64),
    Text(String),
}

pub type ThresholdComponent = (ComparisonOperator, ThresholdValue);

/// Parse one threshold expression; `None` when any component is invalid
pub fn parse_threshold(expression: &str) -> Option<Vec<ThresholdComponent>> {
    expression
        .split("&&")
        .flat_map(|part| part.split("||"))
        .map(parse_component)
        .collect()
}

fn parse_component(component: &str) -> Option<ThresholdComponent> {
    if component == THRESHOLD_NOT_APPLICABLE {
        return Some((
            ComparisonOperator::NotApplicable,
            ThresholdValue::Text(String::new()),
        ));
    }

    let (operator, value) = ComparisonOperator::split_prefix(component)?;
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = match value.parse::<f64>() {
        Ok(number) => ThresholdValue::Number(number),
        Err(_) => ThresholdValue::Text(value.to_string()),
    };
    Some((operator, value))
}

/// Check every threshold; logs one error per invalid entry
pub fn validate_thresholds<S: AsRef<str>>(expressions: &[S]) -> bool {
    let mut valid = true;

    for expression in expressions {
        let expression = expression.as_ref();
        if parse_threshold(expression).is_none() {
            crate::log_error!(
                codes::threshold::INVALID_THRESHOLD,
                format!("Invalid threshold: {}", expression),
                "threshold" => expression
            );
            valid = false;
        }
    }

    if !valid {
        let symbols: Vec<&str> = ComparisonOperator::ALL.iter().map(|o| o.symbol()).collect();
        let letters: Vec<&str> = ComparisonOperator::ALL.iter().map(|o| o.letters()).collect();
        crate::log_error!(
            codes::threshold::INVALID_THRESHOLD,
            format!(
                "Valid threshold comparisons are {} or {} followed by a number, optionally joined with && or ||",
                symbols.join(" "),
                letters.join(" ")
            )
        );
    }

    valid
}

/// Convert symbolic comparisons to letters, e.g. `>=5` to `ge5`
pub fn comparison_to_letter_format(expression: &str) -> String {
    ComparisonOperator::ALL
        .iter()
        .fold(expression.to_string(), |text, operator| {
            text.replace(operator.symbol(), operator.letters())
        })
}

/// Filename-safe rendering of a threshold list value, used by command
/// builders and `metwrap filename`
pub fn format_thresh(raw: &str) -> String {
    getlist(raw)
        .iter()
        .map(|threshold| {
            comparison_to_letter_format(threshold)
                .replace("&&", "_and_")
                .replace("||", "_or_")
        })
        .filter(|threshold| !threshold.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbolic_and_letter_operators() {
        assert_eq!(
            parse_threshold(">=5"),
            Some(vec![(ComparisonOperator::Ge, ThresholdValue::Number(5.0))])
        );
        assert_eq!(
            parse_threshold("gt2.7"),
            Some(vec![(ComparisonOperator::Gt, ThresholdValue::Number(2.7))])
        );
        assert_eq!(
            parse_threshold("le-1"),
            Some(vec![(ComparisonOperator::Le, ThresholdValue::Number(-1.0))])
        );
    }

    #[test]
    fn test_parse_compound_threshold() {
        assert_eq!(
            parse_threshold(">3&&<5"),
            Some(vec![
                (ComparisonOperator::Gt, ThresholdValue::Number(3.0)),
                (ComparisonOperator::Lt, ThresholdValue::Number(5.0)),
            ])
        );
        assert_eq!(parse_threshold("gt3||lt1").map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_non_numeric_value_kept_as_text() {
        assert_eq!(
            parse_threshold(">SFP50"),
            Some(vec![(
                ComparisonOperator::Gt,
                ThresholdValue::Text("SFP50".to_string())
            )])
        );
    }

    #[test]
    fn test_not_applicable_sentinel() {
        assert_eq!(
            parse_threshold("NA"),
            Some(vec![(
                ComparisonOperator::NotApplicable,
                ThresholdValue::Text(String::new())
            )])
        );
    }

    #[test]
    fn test_invalid_thresholds() {
        assert_eq!(parse_threshold("bogus"), None);
        assert_eq!(parse_threshold(">abc"), None);
        assert_eq!(parse_threshold(">3&&"), None);
        assert_eq!(parse_threshold(""), None);
        assert_eq!(parse_threshold("5"), None);
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(!validate_thresholds(&["gt4", ">3&&<5", "gt3||lt1", "bogus"]));
        assert!(validate_thresholds(&["gt4", "NA"]));
        assert!(validate_thresholds::<&str>(&[]));
    }

    #[test]
    fn test_invalid_threshold_is_logged() {
        let logger = crate::logging::test_memory_logger();
        assert!(!validate_thresholds(&["gt1", "bogus_threshold_value"]));

        let errors = logger.get_errors();
        assert!(errors.iter().any(|event| {
            event.code == codes::threshold::INVALID_THRESHOLD
                && event.context.get("threshold").map(String::as_str)
                    == Some("bogus_threshold_value")
        }));
        assert!(!errors.iter().any(|event| {
            event.context.get("threshold").map(String::as_str) == Some("gt1")
        }));
    }

    #[test]
    fn test_comparison_to_letter_format() {
        assert_eq!(comparison_to_letter_format(">=5"), "ge5");
        assert_eq!(comparison_to_letter_format(">1&&<=3"), "gt1&&le3");
        assert_eq!(comparison_to_letter_format("!=0"), "ne0");
    }

    #[test]
    fn test_format_thresh() {
        assert_eq!(format_thresh(">=5, <1"), "ge5_lt1");
        assert_eq!(format_thresh(">1&&<3"), "gt1_and_lt3");
        assert_eq!(format_thresh("ge1||le0"), "ge1_or_le0");
    }

    #[test]
    fn test_operator_serializes_as_symbol() {
        let json = serde_json::to_string(&(ComparisonOperator::Ge, ThresholdValue::Number(5.0)))
            .unwrap();
        assert_eq!(json, "[\">=\",5.0]");
    }
}
