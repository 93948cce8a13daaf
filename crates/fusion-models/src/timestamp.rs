//! Timestamp parsing for model-reported scene starts.
//!
//! Supports `SS`, `MM:SS` and `HH:MM:SS`, each with optional `.mmm`.

use thiserror::Error;

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use MM:SS, MM:SS.mmm, HH:MM:SS or SS")]
    InvalidFormat(String),
}

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use fusion_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("00:03.250").unwrap(), 3.25);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [s] => ("0", "0", *s),
        [m, s] => ("0", *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    let hours = parse_component("hours", hours)?;
    let minutes = parse_component("minutes", minutes)?;
    let seconds = parse_component("seconds", seconds)?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_component(name: &'static str, value: &str) -> Result<f64, TimestampError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| TimestampError::InvalidValue(name, value.to_string()))?;
    if !parsed.is_finite() {
        return Err(TimestampError::InvalidValue(name, value.to_string()));
    }
    if parsed < 0.0 {
        return Err(TimestampError::Negative);
    }
    Ok(parsed)
}

/// Format seconds into HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}
