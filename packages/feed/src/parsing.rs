//! Parsers for the loosely-typed feed fields.
//!
//! Every function here is total: malformed input yields `None` or a default,
//! never an error. The feed mixes strings, numbers, and empty cells at the
//! same positions, and its date and coordinate formats drifted over time, so
//! the parsers accept every convention observed in the historical data.

use chrono::NaiveDate;
use incident_map_incident_models::{Coordinates, GeoBounds};

/// Parses a raw coordinate cell into a validated [`Coordinates`] pair.
///
/// Accepts `"lat, lng"` and `"lat lng"`, tolerating surrounding whitespace
/// and stray quote characters. Returns `None` when the cell is not a string,
/// does not split into exactly two numeric parts, or the point falls outside
/// `bounds`.
#[must_use]
pub fn parse_coordinates(value: &serde_json::Value, bounds: &GeoBounds) -> Option<Coordinates> {
    parse_coordinates_str(value.as_str()?, bounds)
}

/// String-level variant of [`parse_coordinates`].
#[must_use]
pub fn parse_coordinates_str(raw: &str, bounds: &GeoBounds) -> Option<Coordinates> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '"' && *c != '\'').collect();
    if cleaned.is_empty() {
        return None;
    }

    let parts: Vec<&str> = if cleaned.contains(',') {
        cleaned.split(',').collect()
    } else if cleaned.contains(char::is_whitespace) {
        cleaned.split_whitespace().collect()
    } else {
        return None;
    };

    if parts.len() != 2 {
        return None;
    }

    let lat: f64 = parts[0].trim().parse().ok()?;
    let lng: f64 = parts[1].trim().parse().ok()?;
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    if !bounds.contains(lat, lng) {
        return None;
    }

    Some(Coordinates { lat, lng })
}

/// Parses an incident date cell.
///
/// Two textual conventions appear in the feed: day-first `D/M/Y` with
/// slashes and ISO-like `Y-M-D` with hyphens. A trailing space-separated
/// time component is ignored. Anything else returns `None`.
#[must_use]
pub fn parse_incident_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split(' ').next()?;
    if date_part.is_empty() {
        return None;
    }

    if date_part.contains('/') {
        let parts: Vec<&str> = date_part.split('/').collect();
        if parts.len() != 3 {
            return None;
        }
        let day: u32 = parts[0].trim().parse().ok()?;
        let month: u32 = parts[1].trim().parse().ok()?;
        let year: i32 = parts[2].trim().parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if date_part.contains('-') {
        return NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok();
    }

    None
}

/// Best-effort non-negative integer coercion for count fields.
///
/// Numbers are truncated and clamped to zero; numeric strings are parsed;
/// everything else (empty, missing, non-numeric) coerces to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(value: Option<&serde_json::Value>) -> u32 {
    let numeric = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(v) if v.is_finite() && v > 0.0 => v.trunc().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// Reads a cell as trimmed text. Numbers are rendered, everything else is
/// treated as absent.
#[must_use]
pub fn cell_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
