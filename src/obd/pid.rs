//! Mode 01 parameter identifiers and their SAE J1979 decodings.
//!
//! `A` and `B` below are the first and second data bytes following the
//! `41 XX` response header.

use core::fmt::Write;

use heapless::String;

/// OBD-II mode 01 parameter identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Pid(pub u8);

impl Pid {
    /// Supported PIDs 01-20 bitmask; used to wake the vehicle bus.
    pub const SUPPORTED_01_20: Self = Self(0x00);
    /// Calculated engine load, `A * 100 / 255` %.
    pub const ENGINE_LOAD: Self = Self(0x04);
    /// Coolant temperature, `A - 40` °C.
    pub const COOLANT_TEMP: Self = Self(0x05);
    /// Short term fuel trim bank 1, `(A - 128) * 100 / 128` %.
    pub const SHORT_FUEL_TRIM_1: Self = Self(0x06);
    /// Engine speed, `(256A + B) / 4` rpm.
    pub const RPM: Self = Self(0x0C);
    /// Vehicle speed, `A` km/h.
    pub const SPEED: Self = Self(0x0D);
    /// Intake air temperature, `A - 40` °C.
    pub const INTAKE_TEMP: Self = Self(0x0F);
    /// Mass air flow, `(256A + B) / 100` g/s.
    pub const MAF: Self = Self(0x10);
    /// Throttle position, `A * 100 / 255` %.
    pub const THROTTLE_POS: Self = Self(0x11);
    /// Fuel tank level, `A * 100 / 255` %.
    pub const FUEL_LEVEL: Self = Self(0x2F);
    /// Absolute barometric pressure, `A` kPa.
    pub const BAROMETRIC_PRESSURE: Self = Self(0x33);
    /// Ambient air temperature, `A - 40` °C.
    pub const AMBIENT_AIR_TEMP: Self = Self(0x46);
    /// Engine oil temperature, `A - 40` °C.
    pub const OIL_TEMP: Self = Self(0x5C);

    /// Data bytes carried by a response for this PID.
    pub const fn data_len(self) -> usize {
        match self {
            Self::RPM | Self::MAF => 2,
            Self::SUPPORTED_01_20 => 4,
            _ => 1,
        }
    }

    /// ELM327 request string, e.g. `010C`.
    pub fn command(self) -> String<4> {
        let mut cmd = String::new();
        let _ = write!(cmd, "01{:02X}", self.0);
        cmd
    }

    /// Decode the data bytes of a `41 XX` response into a magnitude.
    ///
    /// Returns `None` when fewer bytes than [`Self::data_len`] are present or
    /// the PID has no scalar decoding.
    pub fn decode(self, data: &[u8]) -> Option<f32> {
        if data.len() < self.data_len() {
            return None;
        }
        let a = f32::from(data[0]);
        let b = data.get(1).copied().map_or(0.0, f32::from);
        let value = match self {
            Self::ENGINE_LOAD | Self::THROTTLE_POS | Self::FUEL_LEVEL => a * 100.0 / 255.0,
            Self::COOLANT_TEMP | Self::INTAKE_TEMP | Self::AMBIENT_AIR_TEMP | Self::OIL_TEMP => a - 40.0,
            Self::SHORT_FUEL_TRIM_1 => (a - 128.0) * 100.0 / 128.0,
            Self::RPM => a.mul_add(256.0, b) / 4.0,
            Self::SPEED | Self::BAROMETRIC_PRESSURE => a,
            Self::MAF => a.mul_add(256.0, b) / 100.0,
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_command_string() {
        assert_eq!(Pid::RPM.command().as_str(), "010C");
        assert_eq!(Pid::OIL_TEMP.command().as_str(), "015C");
        assert_eq!(Pid::SUPPORTED_01_20.command().as_str(), "0100");
    }

    #[test]
    fn test_decode_rpm() {
        // 0x1AF8 / 4 = 1726
        assert_eq!(Pid::RPM.decode(&[0x1A, 0xF8]), Some(1726.0));
        assert_eq!(Pid::RPM.decode(&[0x3E, 0x80]), Some(4000.0));
    }

    #[test]
    fn test_decode_temperatures() {
        assert_eq!(Pid::COOLANT_TEMP.decode(&[0x7B]), Some(83.0));
        assert_eq!(Pid::INTAKE_TEMP.decode(&[0x00]), Some(-40.0));
        assert_eq!(Pid::OIL_TEMP.decode(&[0x82]), Some(90.0));
        assert_eq!(Pid::AMBIENT_AIR_TEMP.decode(&[0x3C]), Some(20.0));
    }

    #[test]
    fn test_decode_percentages() {
        assert!(approx(Pid::ENGINE_LOAD.decode(&[0xFF]).unwrap(), 100.0));
        assert!(approx(Pid::THROTTLE_POS.decode(&[0x33]).unwrap(), 20.0));
        assert!(approx(Pid::FUEL_LEVEL.decode(&[0x80]).unwrap(), 50.196));
        assert!(approx(Pid::SHORT_FUEL_TRIM_1.decode(&[0x80]).unwrap(), 0.0));
        assert!(approx(Pid::SHORT_FUEL_TRIM_1.decode(&[0x70]).unwrap(), -12.5));
    }

    #[test]
    fn test_decode_speed_maf_baro() {
        assert_eq!(Pid::SPEED.decode(&[0x64]), Some(100.0));
        assert_eq!(Pid::MAF.decode(&[0x01, 0xF4]), Some(5.0));
        assert_eq!(Pid::BAROMETRIC_PRESSURE.decode(&[0x65]), Some(101.0));
    }

    #[test]
    fn test_decode_short_payload() {
        assert_eq!(Pid::RPM.decode(&[0x1A]), None);
        assert_eq!(Pid::SPEED.decode(&[]), None);
    }

    #[test]
    fn test_decode_unknown_pid() {
        assert_eq!(Pid(0x7F).decode(&[0x01]), None);
    }
}
