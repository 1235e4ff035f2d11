//! Turns a store snapshot into what the dashboard draws, and validates the
//! text users type into it.

use shared::{
    domain::{Record, StatusColor},
    error::InputError,
    input::{has_control_chars, parse_number},
    protocol::{DashboardView, EntityRow},
};

/// Largest status in the snapshot, or `0.0` when there is none.
pub fn compute_max(records: &[Record]) -> f64 {
    records
        .iter()
        .map(|record| record.status)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Bar length relative to `max`, truncated to a whole percent. Anything at or
/// below zero draws an empty bar.
pub fn bar_width_percent(status: f64, max: f64) -> u8 {
    if max == 0.0 {
        return 0;
    }
    let ratio = (status / max).clamp(0.0, 1.0);
    if ratio.is_nan() {
        return 0;
    }
    (ratio * 100.0) as u8
}

pub fn status_color(status: f64) -> StatusColor {
    if status > 0.0 {
        StatusColor::Positive
    } else if status < 0.0 {
        StatusColor::Negative
    } else {
        StatusColor::Neutral
    }
}

pub fn format_status(status: f64) -> String {
    // -0.0 prints as "-0.00"
    let status = if status == 0.0 { 0.0 } else { status };
    format!("{status:.2}")
}

pub fn parse_delta(delta_text: &str) -> Result<f64, InputError> {
    parse_number(delta_text)
}

/// `current + delta`, where the delta is typed text such as `" -3,5 "`.
pub fn apply_delta(current: f64, delta_text: &str) -> Result<f64, InputError> {
    let next = current + parse_delta(delta_text)?;
    if !next.is_finite() {
        return Err(InputError::InvalidNumber(delta_text.trim().to_string()));
    }
    Ok(next)
}

pub fn validate_name(text: &str) -> Result<String, InputError> {
    let name = text.trim();
    if name.is_empty() {
        return Err(InputError::EmptyInput);
    }
    if has_control_chars(name) {
        return Err(InputError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}

/// Initial status from the add form. Blank means zero.
pub fn parse_initial_status(text: &str) -> Result<f64, InputError> {
    match parse_number(text) {
        Err(InputError::EmptyInput) => Ok(0.0),
        other => other,
    }
}

pub fn present(records: &[Record]) -> DashboardView {
    let max = compute_max(records);
    let rows = records
        .iter()
        .map(|record| EntityRow {
            name: record.name.clone(),
            status: record.status,
            formatted_status: format_status(record.status),
            color: status_color(record.status),
            bar_width_percent: bar_width_percent(record.status, max),
        })
        .collect();
    DashboardView { rows, max }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
