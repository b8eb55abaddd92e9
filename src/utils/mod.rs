//! Utility functions and types for the fetchpath crate.

use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Converts a Duration to milliseconds as f64
pub fn duration_to_millis(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1e3 + f64::from(duration.subsec_nanos()) * 1e-6
}

/// Formats a Duration as milliseconds with two fractional digits
pub fn format_millis(duration: Duration) -> String {
    format!("{:.2}", duration_to_millis(duration))
}

/// Formats a byte count as megabytes with two fractional digits
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_conversion() {
        let duration = Duration::new(1, 500_000_000);
        let millis = duration_to_millis(duration);
        assert!((millis - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_millis(Duration::from_micros(12_346)), "12.35");
        assert_eq!(format_millis(Duration::ZERO), "0.00");
        assert_eq!(format_megabytes(0), "0.00");
        assert_eq!(format_megabytes(3 * 1024 * 1024 / 2), "1.50");
    }
}
