//! Synthetic adapter for running the dashboard without a car.
//!
//! Every supported PID follows a slow sine between a plausible minimum and
//! maximum, each at its own frequency so the gauges do not move in lockstep:
//!
//! ```text
//! value = min + (sin(t * freq) * 0.5 + 0.5) * (max - min)
//! ```
//!
//! Values are produced in adapter units (speed in km/h), exactly as a real
//! ELM327 would decode them. Settings can mark sensors as unsupported (null
//! readings), seed stored trouble codes, and make the first few connection
//! attempts fail to exercise the reconnect path.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use tracing::debug;

use super::{Connector, Dtc, ObdConnection, Pid};
use crate::error::ObdError;
use crate::sensors::SensorKey;

/// `(min, max, freq)` of the generated signal, in adapter units.
const fn signal_shape(key: SensorKey) -> (f32, f32, f32) {
    match key {
        SensorKey::IntakeTemp => (-10.0, 60.0, 0.05),
        SensorKey::OilTemp => (60.0, 130.0, 0.08),
        SensorKey::CoolantTemp => (70.0, 105.0, 0.10),
        SensorKey::Rpm => (800.0, 6500.0, 0.35),
        SensorKey::Speed => (0.0, 160.0, 0.12),
        SensorKey::EngineLoad => (10.0, 90.0, 0.30),
        SensorKey::FuelLevel => (20.0, 80.0, 0.01),
        SensorKey::ShortFuelTrim1 => (-10.0, 10.0, 0.45),
        SensorKey::ThrottlePos => (5.0, 90.0, 0.40),
        SensorKey::Maf => (2.0, 150.0, 0.33),
        SensorKey::BarometricPressure => (95.0, 103.0, 0.02),
        SensorKey::AmbientAirTemp => (5.0, 30.0, 0.03),
    }
}

fn fake_signal(t: f32, min: f32, max: f32, freq: f32) -> f32 {
    let normalized = (t * freq).sin().mul_add(0.5, 0.5);
    min + normalized * (max - min)
}

// =============================================================================
// Connector
// =============================================================================

/// Hands out [`SimulatedConnection`]s.
pub struct SimulatedConnector {
    unsupported: Vec<SensorKey>,
    stored_dtcs: Vec<String>,
    /// Connection attempts still to refuse.
    failures_left: AtomicU32,
}

impl SimulatedConnector {
    pub const fn new(unsupported: Vec<SensorKey>, stored_dtcs: Vec<String>, failed_connects: u32) -> Self {
        Self { unsupported, stored_dtcs, failures_left: AtomicU32::new(failed_connects) }
    }
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), 0)
    }
}

impl Connector for SimulatedConnector {
    fn connect(&self) -> Result<Box<dyn ObdConnection>, ObdError> {
        let refused = self
            .failures_left
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ObdError::Adapter("UNABLE TO CONNECT".into()));
        }
        debug!(unsupported = self.unsupported.len(), dtcs = self.stored_dtcs.len(), "simulated adapter connected");
        Ok(Box::new(SimulatedConnection::new(
            self.unsupported.clone(),
            self.stored_dtcs.iter().map(Dtc::from_code).collect(),
        )))
    }

    fn describe(&self) -> String {
        "simulated".into()
    }
}

// =============================================================================
// Connection
// =============================================================================

/// A live simulated session. Time starts at connect.
pub struct SimulatedConnection {
    started: Instant,
    unsupported: Vec<SensorKey>,
    stored_dtcs: Vec<Dtc>,
    open: bool,
}

impl SimulatedConnection {
    pub fn new(unsupported: Vec<SensorKey>, stored_dtcs: Vec<Dtc>) -> Self {
        Self { started: Instant::now(), unsupported, stored_dtcs, open: true }
    }

    /// Reading for `key` at `t` seconds after connect.
    pub fn sample(key: SensorKey, t: f32) -> f32 {
        let (min, max, freq) = signal_shape(key);
        fake_signal(t, min, max, freq)
    }
}

impl ObdConnection for SimulatedConnection {
    fn query(&mut self, pid: Pid) -> Result<Option<f32>, ObdError> {
        if !self.open {
            return Err(ObdError::Closed);
        }
        let Some(key) = SensorKey::from_pid(pid) else {
            return Ok(None);
        };
        if self.unsupported.contains(&key) {
            return Ok(None);
        }
        Ok(Some(Self::sample(key, self.started.elapsed().as_secs_f32())))
    }

    fn query_dtc(&mut self) -> Result<Vec<Dtc>, ObdError> {
        if !self.open {
            return Err(ObdError::Closed);
        }
        Ok(self.stored_dtcs.clone())
    }

    fn close(&mut self) {
        self.open = false;
    }
}
