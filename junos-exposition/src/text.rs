//! Text exposition encoding primitives.

use std::fmt::Write;

use crate::labels::LabelSet;

/// Check a metric name against `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub(crate) fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Check a label name against `[a-zA-Z_][a-zA-Z0-9_]*`.
pub(crate) fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escape special characters in label values.
pub(crate) fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Format a floating point value.
///
/// Finite values use the shortest decimal that round-trips, never an
/// exponent, and always carry a fractional part.
pub(crate) fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else {
        let mut formatted = format!("{}", value);
        if !formatted.contains('.') {
            formatted.push_str(".0");
        }
        formatted
    }
}

/// Append the brace-delimited label group, or nothing for an empty set.
pub(crate) fn write_labels(output: &mut String, labels: &LabelSet) {
    if labels.is_empty() {
        return;
    }

    output.push('{');
    for (i, (name, value)) in labels.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        write!(output, "{}=\"{}\"", name, escape_label_value(value)).ok();
    }
    output.push('}');
}
