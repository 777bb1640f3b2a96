//! Formatting helpers for report values.
//!
//! Byte counts and byte rates have separate, statically typed entry points
//! so every value reaching the report has a known unit.

use std::time::Duration;

/// SI magnitude suffixes, base 1000.
const SI_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Placeholder for a value that cannot be computed.
pub const NO_VALUE: &str = "-";

/// Format byte count as human-readable size.
///
/// `"5 B"`, `"40 kB"`, `"1.2 MB"`
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{} B", bytes);
    }
    scale_si(bytes as f64, "")
}

/// Format bytes-per-second rate as human-readable.
///
/// `"40 kB/s"`, `"1.5 MB/s"`. Negative or non-finite rates print as `"-"`.
pub fn format_bytes_rate(rate: f64) -> String {
    if !rate.is_finite() || rate < 0.0 {
        return NO_VALUE.to_string();
    }
    if rate < 10.0 {
        // Truncated like the byte count it was derived from.
        return format!("{} B/s", rate as u64);
    }
    scale_si(rate, "/s")
}

/// Format a plain per-second rate with two decimals.
pub fn format_rate(rate: f64) -> String {
    if !rate.is_finite() || rate < 0.0 {
        return NO_VALUE.to_string();
    }
    format!("{:.2}", rate)
}

/// Format `Option` with `f`, `"-"` for `None`.
pub fn format_opt<T>(v: Option<T>, f: impl FnOnce(T) -> String) -> String {
    v.map_or_else(|| NO_VALUE.to_string(), f)
}

/// Format a pause duration: `"850ns"`, `"12.5µs"`, `"2ms"`, `"1.5s"`.
pub fn format_pause(pause: Duration) -> String {
    format!("{:?}", pause)
}

/// Format a pause sequence as `"[5ms 3ms 9ms]"`.
pub fn format_pauses(pauses: &[Duration]) -> String {
    let items: Vec<String> = pauses.iter().copied().map(format_pause).collect();
    format!("[{}]", items.join(" "))
}

/// Scales `value` by powers of 1000 and rounds to one decimal.
///
/// One decimal is kept below 10 of the chosen unit, none above.
fn scale_si(value: f64, suffix: &str) -> String {
    let mut scaled = value;
    let mut unit = 0;
    while scaled >= 1000.0 && unit < SI_UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }
    let rounded = (scaled * 10.0 + 0.5).floor() / 10.0;
    if rounded < 10.0 {
        format!("{:.1} {}{}", rounded, SI_UNITS[unit], suffix)
    } else {
        format!("{:.0} {}{}", rounded, SI_UNITS[unit], suffix)
    }
}
