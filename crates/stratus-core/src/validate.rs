//! Physical range validation for calibrated readings.
//!
//! A bound is checked only when the field is present; absent fields never
//! fail validation. Any violated bound marks the whole reading invalid, and
//! invalid readings are dropped without touching the state store.

use core::fmt;

use stratus_types::Reading;

const TEMPERATURE_MIN: f64 = -10.0;
const TEMPERATURE_MAX: f64 = 70.0;
const HUMIDITY_MIN: f64 = 0.0;
const HUMIDITY_MAX: f64 = 100.0;
const PRESSURE_MIN: f64 = 0.0;
// 1400 circulated in an earlier revision of the bounds; 1500 is canonical.
const PRESSURE_MAX: f64 = 1500.0;

/// A field value outside its physical range.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new checks
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RangeViolation {
    /// Temperature outside [-10, 70] °C.
    Temperature { value: f64 },
    /// Humidity outside [0, 100] %.
    Humidity { value: f64 },
    /// Pressure outside [0, 1500] hPa.
    Pressure { value: f64 },
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeViolation::Temperature { value } => write!(
                f,
                "temperature {value}°C outside [{TEMPERATURE_MIN}, {TEMPERATURE_MAX}]"
            ),
            RangeViolation::Humidity { value } => write!(
                f,
                "humidity {value}% outside [{HUMIDITY_MIN}, {HUMIDITY_MAX}]"
            ),
            RangeViolation::Pressure { value } => write!(
                f,
                "pressure {value} hPa outside [{PRESSURE_MIN}, {PRESSURE_MAX}]"
            ),
        }
    }
}

/// Check every present field against its physical range.
///
/// Bounds are inclusive: a temperature of exactly -10 or 70 passes.
/// Comparisons are written so that `NaN` fails rather than slipping
/// through.
///
/// # Errors
///
/// Returns the first [`RangeViolation`] found.
pub fn validate(reading: &Reading) -> Result<(), RangeViolation> {
    if let Some(value) = reading.temperature {
        if !in_range(value, TEMPERATURE_MIN, TEMPERATURE_MAX) {
            return Err(RangeViolation::Temperature { value });
        }
    }
    if let Some(value) = reading.humidity {
        if !in_range(value, HUMIDITY_MIN, HUMIDITY_MAX) {
            return Err(RangeViolation::Humidity { value });
        }
    }
    if let Some(value) = reading.pressure {
        if !in_range(value, PRESSURE_MIN, PRESSURE_MAX) {
            return Err(RangeViolation::Pressure { value });
        }
    }
    Ok(())
}

fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_types::Reading;

    fn with_temperature(value: f64) -> Reading {
        Reading::builder().device_id("d1").temperature(value).build()
    }

    #[test]
    fn test_empty_reading_is_valid() {
        assert!(validate(&Reading::builder().device_id("d1").build()).is_ok());
    }

    #[test]
    fn test_temperature_bounds_are_inclusive() {
        assert!(validate(&with_temperature(-10.0)).is_ok());
        assert!(validate(&with_temperature(70.0)).is_ok());
        assert!(validate(&with_temperature(-11.0)).is_err());
        assert!(validate(&with_temperature(71.0)).is_err());
    }

    #[test]
    fn test_humidity_bounds() {
        let ok = Reading::builder().device_id("d1").humidity(0.0).build();
        assert!(validate(&ok).is_ok());
        let ok = Reading::builder().device_id("d1").humidity(100.0).build();
        assert!(validate(&ok).is_ok());

        let low = Reading::builder().device_id("d1").humidity(-1.0).build();
        assert_eq!(
            validate(&low),
            Err(RangeViolation::Humidity { value: -1.0 })
        );
        let high = Reading::builder().device_id("d1").humidity(101.0).build();
        assert!(validate(&high).is_err());
    }

    #[test]
    fn test_pressure_upper_bound_is_1500() {
        let ok = Reading::builder().device_id("d1").pressure(1500.0).build();
        assert!(validate(&ok).is_ok());
        let high = Reading::builder().device_id("d1").pressure(1501.0).build();
        assert!(validate(&high).is_err());
    }

    #[test]
    fn test_one_bad_field_invalidates_the_whole_reading() {
        let reading = Reading::builder()
            .device_id("d1")
            .temperature(20.0)
            .humidity(150.0)
            .pressure(1000.0)
            .build();
        assert!(matches!(
            validate(&reading),
            Err(RangeViolation::Humidity { .. })
        ));
    }

    #[test]
    fn test_nan_fails_validation() {
        assert!(validate(&with_temperature(f64::NAN)).is_err());
    }
}
