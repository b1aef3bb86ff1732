//! Human-readable execution time formatting ("1hr25min30sec").

use thiserror::Error;

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_MINUTE: u64 = 60;

/// Returned when a duration cannot be formatted (negative or not a number).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid duration: {0} seconds")]
pub struct InvalidDurationError(pub f64);

/// Format an elapsed time in seconds as a compact compound string.
///
/// Only non-zero components are emitted, largest first, with no separator:
/// `3661.0` becomes `"1hr1min1sec"` and `3600.0` becomes `"1hr"`. Zero
/// formats as `"0sec"`. Fractional seconds are truncated. Hours are never
/// rolled into days, so 25 hours prints as `"25hr"`.
pub fn format_duration(seconds: f64) -> Result<String, InvalidDurationError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(InvalidDurationError(seconds));
    }
    Ok(format_whole_seconds(seconds.trunc() as u64))
}

/// Infallible variant of [`format_duration`] for whole seconds.
pub fn format_whole_seconds(total: u64) -> String {
    let hours = total / SECS_PER_HOUR;
    let mins = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = total % SECS_PER_MINUTE;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}hr", hours));
    }
    if mins > 0 {
        out.push_str(&format!("{}min", mins));
    }
    if secs > 0 || out.is_empty() {
        out.push_str(&format!("{}sec", secs));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(format_duration(3600.0).unwrap(), "1hr");
        assert_eq!(format_duration(3661.0).unwrap(), "1hr1min1sec");
        assert_eq!(format_duration(59.0).unwrap(), "59sec");
        assert_eq!(format_duration(0.0).unwrap(), "0sec");
    }

    #[test]
    fn test_skips_zero_components() {
        assert_eq!(format_duration(3601.0).unwrap(), "1hr1sec");
        assert_eq!(format_duration(7260.0).unwrap(), "2hr1min");
        assert_eq!(format_duration(60.0).unwrap(), "1min");
        assert_eq!(format_duration(5130.0).unwrap(), "1hr25min30sec");
    }

    #[test]
    fn test_fraction_truncated() {
        assert_eq!(format_duration(59.999).unwrap(), "59sec");
        assert_eq!(format_duration(0.4).unwrap(), "0sec");
        assert_eq!(format_duration(3661.9).unwrap(), "1hr1min1sec");
    }

    #[test]
    fn test_no_day_unit() {
        assert_eq!(format_duration(90_000.0).unwrap(), "25hr");
        assert_eq!(format_whole_seconds(3 * 86_400 + 5), "72hr5sec");
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(format_duration(-1.0), Err(InvalidDurationError(-1.0)));
        assert!(format_duration(-0.5).is_err());
        assert!(format_duration(f64::NAN).is_err());
        assert!(format_duration(f64::INFINITY).is_err());
    }

    #[test]
    fn test_no_zero_units_for_positive_inputs() {
        for s in 1..10_000u64 {
            let out = format_whole_seconds(s);
            let mut digits = String::new();
            for c in out.chars() {
                if c.is_ascii_digit() {
                    digits.push(c);
                } else if !digits.is_empty() {
                    assert_ne!(digits.parse::<u64>().unwrap(), 0, "{s} -> {out}");
                    digits.clear();
                }
            }
        }
    }
}
