//! @ai:module:intent Measurement payload posted when a run or execution finishes
//! @ai:module:layer domain
//! @ai:module:public_api Measurement, MeasurementUnit, validate_measurements
//! @ai:module:stateless true

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// @ai:intent Physical unit of a measurement value
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementUnit {
    Milliseconds,
    Bytes,
    Percent,
    Count,
}

impl MeasurementUnit {
    /// @ai:intent Convert unit to its wire and storage representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementUnit::Milliseconds => "MILLISECONDS",
            MeasurementUnit::Bytes => "BYTES",
            MeasurementUnit::Percent => "PERCENT",
            MeasurementUnit::Count => "COUNT",
        }
    }
}

impl std::fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MeasurementUnit {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MILLISECONDS" => Ok(MeasurementUnit::Milliseconds),
            "BYTES" => Ok(MeasurementUnit::Bytes),
            "PERCENT" => Ok(MeasurementUnit::Percent),
            "COUNT" => Ok(MeasurementUnit::Count),
            other => Err(TrackerError::Validation(format!(
                "unknown measurement unit: {}",
                other
            ))),
        }
    }
}

/// @ai:intent A named numeric observation attached at finish time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
    pub unit: MeasurementUnit,
}

impl Measurement {
    /// @ai:intent Create a measurement
    /// @ai:effects pure
    pub fn new(name: impl Into<String>, value: f64, unit: MeasurementUnit) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
        }
    }
}

/// @ai:intent Check a finish payload before anything is written
/// @ai:post names are non-empty and unique, values are finite
/// @ai:effects pure
pub fn validate_measurements(measurements: &[Measurement]) -> Result<()> {
    let mut seen = HashSet::with_capacity(measurements.len());

    for measurement in measurements {
        if measurement.name.trim().is_empty() {
            return Err(TrackerError::Validation(
                "measurement name must not be empty".to_string(),
            ));
        }

        if !measurement.value.is_finite() {
            return Err(TrackerError::Validation(format!(
                "measurement {} has a non-finite value",
                measurement.name
            )));
        }

        if !seen.insert(measurement.name.as_str()) {
            return Err(TrackerError::Validation(format!(
                "duplicate measurement name: {}",
                measurement.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_measurement_json_shape() {
        let json = r#"{"name": "duration", "value": 12.34, "unit": "MILLISECONDS"}"#;
        let measurement: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(
            measurement,
            Measurement::new("duration", 12.34, MeasurementUnit::Milliseconds)
        );

        let encoded = serde_json::to_value(&measurement).unwrap();
        assert_eq!(encoded["unit"], "MILLISECONDS");
    }

    #[test]
    fn test_unknown_unit_is_rejected() {
        let json = r#"{"name": "duration", "value": 1.0, "unit": "FURLONGS"}"#;
        assert!(serde_json::from_str::<Measurement>(json).is_err());
        assert!(matches!(
            "FURLONGS".parse::<MeasurementUnit>(),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_unit_parse_matches_as_str() {
        for unit in [
            MeasurementUnit::Milliseconds,
            MeasurementUnit::Bytes,
            MeasurementUnit::Percent,
            MeasurementUnit::Count,
        ] {
            assert_eq!(unit.as_str().parse::<MeasurementUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let measurements = vec![
            Measurement::new("duration", 1.0, MeasurementUnit::Milliseconds),
            Measurement::new("duration", 2.0, MeasurementUnit::Milliseconds),
        ];
        assert!(matches!(
            validate_measurements(&measurements),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let nan = vec![Measurement::new("duration", f64::NAN, MeasurementUnit::Milliseconds)];
        let inf = vec![Measurement::new("bytes", f64::INFINITY, MeasurementUnit::Bytes)];
        assert!(validate_measurements(&nan).is_err());
        assert!(validate_measurements(&inf).is_err());
    }

    #[test]
    fn test_validate_accepts_negative_and_empty() {
        let negative = vec![Measurement::new("delta", -3.5, MeasurementUnit::Percent)];
        assert!(validate_measurements(&negative).is_ok());
        assert!(validate_measurements(&[]).is_ok());
    }
}
