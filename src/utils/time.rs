//! Time parsing and formatting utilities

/// Parse a duration given as seconds, `MM:SS(.ms)` or `HH:MM:SS(.ms)`
///
/// Signature fits clap's `value_parser`.
pub fn parse_seconds(time_str: &str) -> Result<f64, String> {
    let time_str = time_str.trim();
    let invalid = || format!("invalid time '{}': expected seconds, MM:SS or HH:MM:SS", time_str);

    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() > 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(invalid());
    }

    let mut seconds = 0.0;
    for (index, part) in parts.iter().enumerate() {
        let value: f64 = part.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        // Only the last component may carry a fraction or exceed 59
        let is_last = index + 1 == parts.len();
        if !is_last && (value.fract() != 0.0 || (index > 0 && value >= 60.0)) {
            return Err(invalid());
        }
        if is_last && parts.len() > 1 && value >= 60.0 {
            return Err(invalid());
        }
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}

/// Format seconds as `MM:SS.mmm`, or `HH:MM:SS.mmm` past one hour
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let milliseconds = total_ms % 1000;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, milliseconds)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, secs, milliseconds)
    }
}
