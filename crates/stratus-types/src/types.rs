//! Core types for Stratus telemetry data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ParseError;

/// A single telemetry sample as delivered by the ingest transport.
///
/// Every sensor field is optional; an absent field means the device did not
/// report it. The only structurally required field is the device identifier,
/// and even that is modelled as an `Option` because real payloads arrive
/// without one; the pipeline discards those before any other processing.
///
/// # Wire aliases
///
/// Field gateways disagree on spelling (`deviceId` vs `DeviceId`, `celsius`
/// vs `Temp`, `hPa` vs `pressure`). The serde derive accepts all spellings
/// seen in production and serializes with the canonical camelCase names.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Reading {
    /// Device identifier. Readings without one are dropped by the pipeline.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "DeviceId", alias = "deviceid")
    )]
    pub device_id: Option<String>,
    /// Temperature in degrees Celsius.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            alias = "Temperature",
            alias = "celsius",
            alias = "Celsius",
            alias = "temp",
            alias = "Temp"
        )
    )]
    pub temperature: Option<f64>,
    /// Relative humidity percentage.
    #[cfg_attr(feature = "serde", serde(default, alias = "Humidity"))]
    pub humidity: Option<f64>,
    /// Atmospheric pressure in hPa.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "Pressure", alias = "hPa")
    )]
    pub pressure: Option<f64>,
    /// Battery level percentage.
    #[cfg_attr(feature = "serde", serde(default, alias = "Battery"))]
    pub battery: Option<f64>,
    /// Ambient light level.
    #[cfg_attr(feature = "serde", serde(default, alias = "Light"))]
    pub light: Option<f64>,
    /// Geolocation hint, free-form.
    #[cfg_attr(feature = "serde", serde(default, alias = "Geo"))]
    pub geo: Option<String>,
    /// Payload schema version.
    #[cfg_attr(
        feature = "serde",
        serde(
            default = "default_schema_version",
            rename = "schema",
            alias = "Schema"
        )
    )]
    pub schema_version: u32,
    /// Source-assigned message counter.
    #[cfg_attr(
        feature = "serde",
        serde(default, alias = "Id", alias = "messageId")
    )]
    pub sequence_id: u64,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            device_id: None,
            temperature: None,
            humidity: None,
            pressure: None,
            battery: None,
            light: None,
            geo: None,
            schema_version: default_schema_version(),
            sequence_id: 0,
        }
    }
}

impl Reading {
    /// Create a builder for constructing a `Reading` with optional fields.
    pub fn builder() -> ReadingBuilder {
        ReadingBuilder::default()
    }
}

/// Builder for constructing a [`Reading`].
///
/// Use [`build`](Self::build) for unchecked construction, or
/// [`try_build`](Self::try_build) to reject non-finite sensor values.
#[derive(Debug, Default)]
#[must_use]
pub struct ReadingBuilder {
    reading: Reading,
}

impl ReadingBuilder {
    /// Set the device identifier.
    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.reading.device_id = Some(id.into());
        self
    }

    /// Set the temperature in degrees Celsius.
    pub fn temperature(mut self, celsius: f64) -> Self {
        self.reading.temperature = Some(celsius);
        self
    }

    /// Set the relative humidity percentage.
    pub fn humidity(mut self, humidity: f64) -> Self {
        self.reading.humidity = Some(humidity);
        self
    }

    /// Set the atmospheric pressure in hPa.
    pub fn pressure(mut self, pressure: f64) -> Self {
        self.reading.pressure = Some(pressure);
        self
    }

    /// Set the battery level percentage.
    pub fn battery(mut self, battery: f64) -> Self {
        self.reading.battery = Some(battery);
        self
    }

    /// Set the ambient light level.
    pub fn light(mut self, light: f64) -> Self {
        self.reading.light = Some(light);
        self
    }

    /// Set the geolocation hint.
    pub fn geo(mut self, geo: impl Into<String>) -> Self {
        self.reading.geo = Some(geo.into());
        self
    }

    /// Set the payload schema version.
    pub fn schema_version(mut self, version: u32) -> Self {
        self.reading.schema_version = version;
        self
    }

    /// Set the source-assigned message counter.
    pub fn sequence_id(mut self, id: u64) -> Self {
        self.reading.sequence_id = id;
        self
    }

    /// Build the `Reading` without validation.
    #[must_use]
    pub fn build(self) -> Reading {
        self.reading
    }

    /// Build the `Reading`, rejecting `NaN` and infinite sensor values.
    ///
    /// Range checks against physical bounds are the pipeline validator's
    /// job; this only guards against values that no comparison can ever
    /// classify.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidValue`] if any present numeric field is
    /// not finite.
    pub fn try_build(self) -> Result<Reading, ParseError> {
        for (name, value) in [
            ("temperature", self.reading.temperature),
            ("humidity", self.reading.humidity),
            ("pressure", self.reading.pressure),
            ("battery", self.reading.battery),
            ("light", self.reading.light),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ParseError::InvalidValue(format!(
                        "{name} {v} is not a finite number"
                    )));
                }
            }
        }
        Ok(self.reading)
    }
}

/// Per-device linear calibration: `corrected = raw * slope + intercept`.
///
/// Every pair is optional. A missing slope or intercept leaves the
/// corresponding field uncalibrated; missing calibration never fabricates
/// data. Profiles are read-only from the pipeline's perspective.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalibrationProfile {
    /// Temperature slope.
    pub temperature_slope: Option<f64>,
    /// Temperature intercept.
    pub temperature_intercept: Option<f64>,
    /// Humidity slope.
    pub humidity_slope: Option<f64>,
    /// Humidity intercept.
    pub humidity_intercept: Option<f64>,
    /// Pressure slope.
    pub pressure_slope: Option<f64>,
    /// Pressure intercept.
    pub pressure_intercept: Option<f64>,
}

impl CalibrationProfile {
    /// A profile that scales by 1 and offsets by 0 on all three fields.
    ///
    /// Useful for provisioning a device before its real calibration run:
    /// values pass through numerically unchanged apart from rounding.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            temperature_slope: Some(1.0),
            temperature_intercept: Some(0.0),
            humidity_slope: Some(1.0),
            humidity_intercept: Some(0.0),
            pressure_slope: Some(1.0),
            pressure_intercept: Some(0.0),
        }
    }
}

/// Opaque token identifying a [`DeviceState`] revision.
///
/// The state store assigns a fresh token on every successful write; a
/// conditional write succeeds only if the supplied token still matches.
/// Tokens support equality, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VersionToken(Uuid);

impl VersionToken {
    /// Draw a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VersionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The durable current record for one device.
///
/// At most one `DeviceState` exists per device identifier. It is created on
/// the first successfully validated reading for a device, replaced wholesale
/// by each subsequent merge, and never deleted by the pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DeviceState {
    /// Device identifier.
    pub device_id: String,
    /// Calibrated temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Calibrated relative humidity percentage.
    pub humidity: Option<f64>,
    /// Calibrated atmospheric pressure in hPa.
    pub pressure: Option<f64>,
    /// Battery level percentage, uncalibrated.
    pub battery: Option<f64>,
    /// Ambient light level, uncalibrated.
    pub light: Option<f64>,
    /// Geolocation hint.
    pub geo: Option<String>,
    /// Payload schema version of the most recent reading.
    pub schema_version: u32,
    /// Source-assigned counter of the most recent reading.
    pub sequence_id: u64,
    /// Number of successful merges, starting at 1 on creation and
    /// incremented by exactly 1 per merge.
    pub update_count: u64,
    /// Store-assigned revision token. The value held before a commit is the
    /// expected (prior) token; the store hands back the authoritative token
    /// on success.
    pub version_token: VersionToken,
    /// When the merge producing this state was performed.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub observed_at: OffsetDateTime,
}

impl DeviceState {
    /// The initial state for a device that has no durable record yet.
    ///
    /// `update_count` starts at 1. The version token is a placeholder until
    /// the store's unconditional create assigns the real one.
    #[must_use]
    pub fn first(device_id: &str, reading: &Reading, now: OffsetDateTime) -> Self {
        Self {
            device_id: device_id.to_string(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
            battery: reading.battery,
            light: reading.light,
            geo: reading.geo.clone(),
            schema_version: reading.schema_version,
            sequence_id: reading.sequence_id,
            update_count: 1,
            version_token: VersionToken::new(),
            observed_at: now,
        }
    }

    /// The successor state produced by merging `reading` over `prior`.
    ///
    /// Telemetry fields are taken wholesale from the reading (an absent
    /// field stays absent); only the update counter and the expected version
    /// token carry forward from the prior state.
    #[must_use]
    pub fn merged(prior: &DeviceState, reading: &Reading, now: OffsetDateTime) -> Self {
        Self {
            device_id: prior.device_id.clone(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
            battery: reading.battery,
            light: reading.light,
            geo: reading.geo.clone(),
            schema_version: reading.schema_version,
            sequence_id: reading.sequence_id,
            update_count: prior.update_count + 1,
            version_token: prior.version_token,
            observed_at: now,
        }
    }
}
