//! Fixed table of the twelve sensors shown on the dashboard.
//!
//! Each entry ties a [`SensorKey`] to its gauge presentation (label, unit,
//! full-scale value) and to the OBD-II PID polled for it, plus a conversion
//! applied to the decoded magnitude before display. Table order is gauge order
//! on screen (4 columns, left to right, top to bottom).

use core::fmt;

use serde::Deserialize;

use crate::obd::Pid;

/// Number of sensors on the dashboard.
pub const SENSOR_COUNT: usize = 12;

/// Kilometres per hour to miles per hour.
pub const KMH_TO_MPH: f32 = 0.621_371;

/// Stable identifier for one queryable engine parameter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorKey {
    IntakeTemp,
    OilTemp,
    CoolantTemp,
    Rpm,
    Speed,
    EngineLoad,
    FuelLevel,
    #[serde(rename = "SHORT_FUEL_TRIM_1")]
    ShortFuelTrim1,
    ThrottlePos,
    Maf,
    BarometricPressure,
    #[serde(alias = "AMBIANT_AIR_TEMP")]
    AmbientAirTemp,
}

impl SensorKey {
    /// All keys in table order.
    pub const ALL: [Self; SENSOR_COUNT] = [
        Self::IntakeTemp,
        Self::OilTemp,
        Self::CoolantTemp,
        Self::Rpm,
        Self::Speed,
        Self::EngineLoad,
        Self::FuelLevel,
        Self::ShortFuelTrim1,
        Self::ThrottlePos,
        Self::Maf,
        Self::BarometricPressure,
        Self::AmbientAirTemp,
    ];

    /// Position in [`SENSORS`] and on the gauge grid.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Upper-case identifier used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Self::IntakeTemp => "INTAKE_TEMP",
            Self::OilTemp => "OIL_TEMP",
            Self::CoolantTemp => "COOLANT_TEMP",
            Self::Rpm => "RPM",
            Self::Speed => "SPEED",
            Self::EngineLoad => "ENGINE_LOAD",
            Self::FuelLevel => "FUEL_LEVEL",
            Self::ShortFuelTrim1 => "SHORT_FUEL_TRIM_1",
            Self::ThrottlePos => "THROTTLE_POS",
            Self::Maf => "MAF",
            Self::BarometricPressure => "BAROMETRIC_PRESSURE",
            Self::AmbientAirTemp => "AMBIENT_AIR_TEMP",
        }
    }

    /// Table entry for this key.
    #[inline]
    pub fn spec(self) -> &'static SensorSpec {
        &SENSORS[self.index()]
    }

    /// Key polling the given PID, if any.
    pub fn from_pid(pid: Pid) -> Option<Self> {
        SENSORS.iter().find(|s| s.pid == pid).map(|s| s.key)
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the sensor table.
#[derive(Debug)]
pub struct SensorSpec {
    pub key: SensorKey,
    /// Text above the gauge bar.
    pub label: &'static str,
    /// Suffix of the numeric readout.
    pub unit: &'static str,
    /// Full-scale value; readings are clamped to `[0, max_value]`.
    pub max_value: f32,
    /// Mode 01 PID queried for this sensor.
    pub pid: Pid,
    /// Applied to the decoded magnitude before it reaches the gauge.
    pub convert: fn(f32) -> f32,
}

impl SensorSpec {
    /// Convert a decoded adapter magnitude into display units.
    #[inline]
    pub fn to_display(&self, raw: f32) -> f32 {
        (self.convert)(raw)
    }
}

fn identity(value: f32) -> f32 {
    value
}

fn kmh_to_mph(value: f32) -> f32 {
    value * KMH_TO_MPH
}

/// The dashboard's sensors, in gauge order.
pub static SENSORS: [SensorSpec; SENSOR_COUNT] = [
    SensorSpec {
        key: SensorKey::IntakeTemp,
        label: "Intake Temp",
        unit: "°C",
        max_value: 100.0,
        pid: Pid::INTAKE_TEMP,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::OilTemp,
        label: "Oil Temp",
        unit: "°C",
        max_value: 150.0,
        pid: Pid::OIL_TEMP,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::CoolantTemp,
        label: "Coolant Temp",
        unit: "°C",
        max_value: 120.0,
        pid: Pid::COOLANT_TEMP,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::Rpm,
        label: "RPM",
        unit: "rpm",
        max_value: 8000.0,
        pid: Pid::RPM,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::Speed,
        label: "Speed",
        unit: "mph",
        max_value: 200.0,
        pid: Pid::SPEED,
        convert: kmh_to_mph,
    },
    SensorSpec {
        key: SensorKey::EngineLoad,
        label: "Engine Load",
        unit: "%",
        max_value: 100.0,
        pid: Pid::ENGINE_LOAD,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::FuelLevel,
        label: "Fuel Level",
        unit: "%",
        max_value: 100.0,
        pid: Pid::FUEL_LEVEL,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::ShortFuelTrim1,
        label: "Short Fuel Trim",
        unit: "%",
        max_value: 100.0,
        pid: Pid::SHORT_FUEL_TRIM_1,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::ThrottlePos,
        label: "Throttle Pos",
        unit: "%",
        max_value: 100.0,
        pid: Pid::THROTTLE_POS,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::Maf,
        label: "MAF",
        unit: "g/s",
        max_value: 300.0,
        pid: Pid::MAF,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::BarometricPressure,
        label: "Baro Pressure",
        unit: "kPa",
        max_value: 200.0,
        pid: Pid::BAROMETRIC_PRESSURE,
        convert: identity,
    },
    SensorSpec {
        key: SensorKey::AmbientAirTemp,
        label: "Ambient Temp",
        unit: "°C",
        max_value: 50.0,
        pid: Pid::AMBIENT_AIR_TEMP,
        convert: identity,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_keys() {
        for (i, key) in SensorKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
            assert_eq!(SENSORS[i].key, *key);
            assert_eq!(key.spec().key, *key);
        }
    }

    #[test]
    fn test_maxima_positive() {
        assert!(SENSORS.iter().all(|s| s.max_value > 0.0));
    }

    #[test]
    fn test_pids_unique() {
        for (i, a) in SENSORS.iter().enumerate() {
            for b in &SENSORS[i + 1..] {
                assert_ne!(a.pid, b.pid, "{} and {} share a PID", a.key, b.key);
            }
        }
    }

    #[test]
    fn test_speed_converted_to_mph() {
        let speed = SensorKey::Speed.spec();
        assert!((speed.to_display(100.0) - 62.1371).abs() < 0.001);
        assert_eq!(SensorKey::Rpm.spec().to_display(4000.0), 4000.0);
    }

    #[test]
    fn test_from_pid() {
        assert_eq!(SensorKey::from_pid(Pid::RPM), Some(SensorKey::Rpm));
        assert_eq!(SensorKey::from_pid(Pid(0x00)), None);
    }

    #[test]
    fn test_deserialize_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            keys: Vec<SensorKey>,
        }
        let parsed: Wrapper =
            toml::from_str(r#"keys = ["OIL_TEMP", "SHORT_FUEL_TRIM_1", "AMBIANT_AIR_TEMP", "AMBIENT_AIR_TEMP"]"#)
                .unwrap();
        assert_eq!(
            parsed.keys,
            vec![
                SensorKey::OilTemp,
                SensorKey::ShortFuelTrim1,
                SensorKey::AmbientAirTemp,
                SensorKey::AmbientAirTemp
            ]
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(SensorKey::OilTemp.to_string(), "OIL_TEMP");
    }
}
