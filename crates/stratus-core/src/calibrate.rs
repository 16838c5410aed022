//! Per-device linear calibration.
//!
//! Corrections are of the form `corrected = raw * slope + intercept`,
//! rounded to two decimal places with ties to even. Calibration applies to
//! temperature, humidity, and pressure; battery, light, and geo pass
//! through untouched.

use stratus_types::{CalibrationProfile, Reading};

/// Round to two decimal places, ties to even.
///
/// Half-to-even keeps results reproducible at the `.5` boundary regardless
/// of how many calibration passes a value has seen.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Apply one linear correction to an optional sensor value.
///
/// If the value, slope, or intercept is absent the value passes through
/// unchanged; missing calibration never fabricates data.
#[must_use]
pub fn scale(value: Option<f64>, slope: Option<f64>, intercept: Option<f64>) -> Option<f64> {
    match (value, slope, intercept) {
        (Some(v), Some(s), Some(i)) => Some(round2(v * s + i)),
        _ => value,
    }
}

/// Calibrate a reading in place against a device's profile.
///
/// Called once per reading, before validation, so an uncalibrated value is
/// never persisted when a profile exists for the device.
pub fn apply(reading: &mut Reading, profile: &CalibrationProfile) {
    reading.temperature = scale(
        reading.temperature,
        profile.temperature_slope,
        profile.temperature_intercept,
    );
    reading.humidity = scale(
        reading.humidity,
        profile.humidity_slope,
        profile.humidity_intercept,
    );
    reading.pressure = scale(
        reading.pressure,
        profile.pressure_slope,
        profile.pressure_intercept,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_types::Reading;

    #[test]
    fn test_scale_passes_through_when_anything_is_absent() {
        assert_eq!(scale(None, Some(2.0), Some(1.0)), None);
        assert_eq!(scale(Some(10.0), None, Some(1.0)), Some(10.0));
        assert_eq!(scale(Some(10.0), Some(2.0), None), Some(10.0));
    }

    #[test]
    fn test_scale_applies_linear_correction() {
        assert_eq!(scale(Some(10.0), Some(2.0), Some(1.5)), Some(21.5));
        assert_eq!(scale(Some(-4.0), Some(0.5), Some(0.0)), Some(-2.0));
    }

    #[test]
    fn test_identity_slope_only_rounds() {
        // slope=1, intercept=0 reduces scale to round-half-to-even at 2dp.
        assert_eq!(scale(Some(2.344), Some(1.0), Some(0.0)), Some(2.34));
        assert_eq!(scale(Some(2.346), Some(1.0), Some(0.0)), Some(2.35));
        assert_eq!(scale(Some(2.345), Some(1.0), Some(0.0)), Some(2.34));

        // Rounding is stable: a second identity pass changes nothing.
        let once = scale(Some(2.345), Some(1.0), Some(0.0));
        assert_eq!(scale(once, Some(1.0), Some(0.0)), once);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // 0.125 and 0.375 are exact in binary, so these are true midpoints:
        // one rounds down to the even digit, the other rounds up.
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn test_apply_calibrates_only_the_three_calibrated_fields() {
        let mut reading = Reading::builder()
            .device_id("d1")
            .temperature(20.0)
            .humidity(50.0)
            .pressure(1000.0)
            .battery(90.0)
            .light(123.456)
            .build();

        let profile = CalibrationProfile {
            temperature_slope: Some(1.1),
            temperature_intercept: Some(-0.5),
            humidity_slope: Some(0.9),
            humidity_intercept: Some(2.0),
            pressure_slope: Some(1.0),
            pressure_intercept: Some(3.0),
        };

        apply(&mut reading, &profile);

        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.humidity, Some(47.0));
        assert_eq!(reading.pressure, Some(1003.0));
        // Untouched, not even rounded.
        assert_eq!(reading.battery, Some(90.0));
        assert_eq!(reading.light, Some(123.456));
    }

    #[test]
    fn test_apply_with_partial_profile() {
        let mut reading = Reading::builder()
            .device_id("d1")
            .temperature(20.0)
            .humidity(50.0)
            .build();

        // Only temperature is calibrated; humidity has no slope.
        let profile = CalibrationProfile {
            temperature_slope: Some(2.0),
            temperature_intercept: Some(0.0),
            ..Default::default()
        };

        apply(&mut reading, &profile);
        assert_eq!(reading.temperature, Some(40.0));
        assert_eq!(reading.humidity, Some(50.0));
    }
}
