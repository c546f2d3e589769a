//! Diagnostic trouble codes: decoding and descriptions.
//!
//! A stored DTC arrives as two bytes. The top two bits pick the system letter
//! (P powertrain, C chassis, B body, U network), the next two bits the first
//! digit, and the remaining twelve bits the last three hex digits:
//!
//! ```text
//! 0x01 0x71  ->  00 00 0001 0111 0001  ->  P 0 1 7 1  ->  P0171
//! ```

use core::fmt;

/// One diagnostic trouble code with its human-readable description.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Dtc {
    pub code: String,
    pub description: String,
}

impl Dtc {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self { code: code.into(), description: description.into() }
    }

    /// Build from a code string, looking up its description.
    pub fn from_code(code: impl Into<String>) -> Self {
        let code = code.into();
        let description = describe(&code).to_owned();
        Self { code, description }
    }

    /// Decode the two-byte wire form. `00 00` is padding and yields `None`.
    pub fn from_bytes(a: u8, b: u8) -> Option<Self> {
        if a == 0 && b == 0 {
            return None;
        }
        let letter = ['P', 'C', 'B', 'U'][usize::from(a >> 6)];
        let code = format!("{letter}{}{:01X}{:02X}", (a >> 4) & 0x03, a & 0x0F, b);
        Some(Self::from_code(code))
    }
}

impl fmt::Display for Dtc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            f.write_str(&self.code)
        } else {
            write!(f, "{}: {}", self.code, self.description)
        }
    }
}

/// Decode the payload of one mode 03 response message (starting at `0x43`).
///
/// CAN adapters prefix the code pairs with a count byte, which leaves an odd
/// number of bytes after the mode byte; legacy protocols send bare pairs.
pub fn decode_mode03(message: &[u8]) -> Vec<Dtc> {
    let Some((&0x43, rest)) = message.split_first() else {
        return Vec::new();
    };
    let pairs = if rest.len() % 2 == 1 { &rest[1..] } else { rest };
    pairs
        .chunks_exact(2)
        .filter_map(|pair| Dtc::from_bytes(pair[0], pair[1]))
        .collect()
}

/// Decode a reassembled multi-frame CAN message, trusting its count byte.
///
/// Multi-frame payloads are padded to the frame size, so the parity rule of
/// [`decode_mode03`] does not apply.
pub fn decode_mode03_counted(message: &[u8]) -> Vec<Dtc> {
    let Some((&0x43, rest)) = message.split_first() else {
        return Vec::new();
    };
    let Some((&count, pairs)) = rest.split_first() else {
        return Vec::new();
    };
    pairs
        .chunks_exact(2)
        .take(usize::from(count))
        .filter_map(|pair| Dtc::from_bytes(pair[0], pair[1]))
        .collect()
}

/// Description of a generic code, or `""` when the code is not in the table.
pub fn describe(code: &str) -> &'static str {
    DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map_or("", |(_, d)| *d)
}

/// Common generic (SAE-defined) powertrain codes.
static DESCRIPTIONS: &[(&str, &str)] = &[
    ("P0100", "Mass or Volume Air Flow Circuit Malfunction"),
    ("P0101", "Mass or Volume Air Flow Circuit Range/Performance Problem"),
    ("P0102", "Mass or Volume Air Flow Circuit Low Input"),
    ("P0103", "Mass or Volume Air Flow Circuit High Input"),
    ("P0106", "Manifold Absolute Pressure/Barometric Pressure Circuit Range/Performance Problem"),
    ("P0110", "Intake Air Temperature Circuit Malfunction"),
    ("P0113", "Intake Air Temperature Circuit High Input"),
    ("P0115", "Engine Coolant Temperature Circuit Malfunction"),
    ("P0117", "Engine Coolant Temperature Circuit Low Input"),
    ("P0118", "Engine Coolant Temperature Circuit High Input"),
    ("P0120", "Throttle Pedal Position Sensor/Switch A Circuit Malfunction"),
    ("P0121", "Throttle/Pedal Position Sensor/Switch A Circuit Range/Performance Problem"),
    ("P0125", "Insufficient Coolant Temperature for Closed Loop Fuel Control"),
    ("P0128", "Coolant Thermostat (Coolant Temperature Below Thermostat Regulating Temperature)"),
    ("P0130", "O2 Sensor Circuit Malfunction (Bank 1 Sensor 1)"),
    ("P0133", "O2 Sensor Circuit Slow Response (Bank 1 Sensor 1)"),
    ("P0135", "O2 Sensor Heater Circuit Malfunction (Bank 1 Sensor 1)"),
    ("P0141", "O2 Sensor Heater Circuit Malfunction (Bank 1 Sensor 2)"),
    ("P0171", "System Too Lean (Bank 1)"),
    ("P0172", "System Too Rich (Bank 1)"),
    ("P0174", "System Too Lean (Bank 2)"),
    ("P0175", "System Too Rich (Bank 2)"),
    ("P0196", "Engine Oil Temperature Sensor Range/Performance"),
    ("P0197", "Engine Oil Temperature Sensor Low"),
    ("P0198", "Engine Oil Temperature Sensor High"),
    ("P0217", "Engine Coolant Over Temperature Condition"),
    ("P0300", "Random/Multiple Cylinder Misfire Detected"),
    ("P0301", "Cylinder 1 Misfire Detected"),
    ("P0302", "Cylinder 2 Misfire Detected"),
    ("P0303", "Cylinder 3 Misfire Detected"),
    ("P0304", "Cylinder 4 Misfire Detected"),
    ("P0305", "Cylinder 5 Misfire Detected"),
    ("P0306", "Cylinder 6 Misfire Detected"),
    ("P0325", "Knock Sensor 1 Circuit Malfunction (Bank 1 or Single Sensor)"),
    ("P0335", "Crankshaft Position Sensor A Circuit Malfunction"),
    ("P0340", "Camshaft Position Sensor Circuit Malfunction"),
    ("P0401", "Exhaust Gas Recirculation Flow Insufficient Detected"),
    ("P0402", "Exhaust Gas Recirculation Flow Excessive Detected"),
    ("P0420", "Catalyst System Efficiency Below Threshold (Bank 1)"),
    ("P0430", "Catalyst System Efficiency Below Threshold (Bank 2)"),
    ("P0440", "Evaporative Emission Control System Malfunction"),
    ("P0442", "Evaporative Emission Control System Leak Detected (small leak)"),
    ("P0455", "Evaporative Emission Control System Leak Detected (gross leak)"),
    ("P0456", "Evaporative Emission Control System Leak Detected (very small leak)"),
    ("P0461", "Fuel Level Sensor Circuit Range/Performance"),
    ("P0500", "Vehicle Speed Sensor Malfunction"),
    ("P0505", "Idle Control System Malfunction"),
    ("P0506", "Idle Control System RPM Lower Than Expected"),
    ("P0507", "Idle Control System RPM Higher Than Expected"),
    ("P0562", "System Voltage Low"),
    ("P0563", "System Voltage High"),
    ("P0600", "Serial Communication Link Malfunction"),
    ("P0700", "Transmission Control System Malfunction"),
];
