//! Human-readable sizes and durations for status lines.

use std::time::Duration;

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count in the largest unit that keeps the value at least 1.
///
/// ```
/// use wpack_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let exponent = (0..UNITS.len())
        .rev()
        .find(|exp| bytes >= 1u64 << (10 * exp))
        .unwrap_or(0);
    if exponent == 0 {
        return format!("{bytes} B");
    }
    let value = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{value:.2} {}", UNITS[exponent])
}

/// Format an elapsed time as `50ms`, `1.50s` or `1m 30s`.
pub fn format_duration(elapsed: Duration) -> String {
    match elapsed.as_millis() {
        ms @ 0..1_000 => format!("{ms}ms"),
        1_000..60_000 => format!("{:.2}s", elapsed.as_secs_f64()),
        _ => {
            let secs = elapsed.as_secs();
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}
