//! Value parsing: lists, ranges, thresholds and small text helpers

pub mod list;
pub mod range;
pub mod text;
pub mod threshold;

pub use list::{expand_int_ranges, getlist, list_to_str, parse_int_list, parse_list, ListError};
pub use range::{expand_ranges, RangeError, RangeSpec};
pub use text::{format_level, is_python_script, remove_quotes, split_level};
pub use threshold::{
    comparison_to_letter_format, format_thresh, parse_threshold, validate_thresholds,
    ComparisonOperator, ThresholdComponent, ThresholdValue,
};
