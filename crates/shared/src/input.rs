use std::collections::HashMap;

use crate::{
    domain::{RawRow, RawStatus, Record, RowIssue, RowIssueReason},
    error::InputError,
};

/// Parses a user-typed number. Surrounding whitespace is ignored and a comma
/// is accepted as the decimal separator. Non-finite results are rejected.
pub fn parse_number(text: &str) -> Result<f64, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyInput);
    }

    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::InvalidNumber(trimmed.to_string())),
    }
}

/// Names are stored one per line in the bulk-edit text, so control
/// characters inside a name are not allowed.
pub fn has_control_chars(name: &str) -> bool {
    name.chars().any(char::is_control)
}

/// Lenient coercion used by bulk edits: blank or missing is `0.0`, anything
/// unparseable is `0.0` and flagged with `false`.
pub fn coerce_status(status: Option<&RawStatus>) -> (f64, bool) {
    match status {
        None => (0.0, true),
        Some(RawStatus::Number(value)) if value.is_finite() => (*value, true),
        Some(RawStatus::Number(_)) => (0.0, false),
        Some(RawStatus::Text(text)) => match parse_number(text) {
            Ok(value) => (value, true),
            Err(InputError::EmptyInput) => (0.0, true),
            Err(_) => (0.0, false),
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRows {
    pub records: Vec<Record>,
    pub issues: Vec<RowIssue>,
}

/// Validation pass for a bulk replace. Names are trimmed, blank names are
/// dropped, statuses are coerced, and duplicate names resolve to the last
/// occurrence (which keeps its own position).
pub fn normalize_rows(rows: &[RawRow]) -> NormalizedRows {
    let mut issues = Vec::new();
    let mut candidates: Vec<(usize, Record)> = Vec::with_capacity(rows.len());

    for (row, raw) in rows.iter().enumerate() {
        let name = raw.name.trim();
        if name.is_empty() {
            issues.push(RowIssue {
                row,
                name: String::new(),
                reason: RowIssueReason::EmptyName,
            });
            continue;
        }
        if has_control_chars(name) {
            issues.push(RowIssue {
                row,
                name: name.to_string(),
                reason: RowIssueReason::InvalidName,
            });
            continue;
        }

        let (status, valid) = coerce_status(raw.status.as_ref());
        if !valid {
            issues.push(RowIssue {
                row,
                name: name.to_string(),
                reason: RowIssueReason::InvalidStatus,
            });
        }
        candidates.push((row, Record::new(name, status)));
    }

    let mut last_seen: HashMap<&str, usize> = HashMap::with_capacity(candidates.len());
    for (row, record) in &candidates {
        last_seen.insert(record.name.as_str(), *row);
    }

    let mut records = Vec::with_capacity(last_seen.len());
    for (row, record) in &candidates {
        if last_seen.get(record.name.as_str()) == Some(row) {
            records.push(record.clone());
        } else {
            issues.push(RowIssue {
                row: *row,
                name: record.name.clone(),
                reason: RowIssueReason::DuplicateName,
            });
        }
    }

    issues.sort_by_key(|issue| issue.row);
    NormalizedRows { records, issues }
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
