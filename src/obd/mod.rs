//! Diagnostics adapter interface and implementations.
//!
//! The polling loop only sees two traits:
//!
//! - [`Connector`]: opens a connection (blocking; may take seconds while an
//!   ELM327 resets and searches for the vehicle bus).
//! - [`ObdConnection`]: a live handle answering mode 01 PID queries and the
//!   mode 03 stored-DTC query (each call blocking).
//!
//! Implementations:
//!
//! - [`elm327`]: ELM327 text protocol over TCP or a serial device node
//! - [`simulated`]: synthetic signals for running without a car
//!
//! All calls are blocking by contract; the poller moves them onto tokio's
//! blocking pool so the async loop never stalls on adapter I/O.

pub mod dtc;
pub mod elm327;
pub mod pid;
pub mod simulated;

use std::sync::Arc;
use std::time::Duration;

pub use dtc::Dtc;
pub use elm327::{Elm327, Elm327Connector, Transport};
pub use pid::Pid;
pub use simulated::{SimulatedConnection, SimulatedConnector};

use crate::error::{ConfigError, ObdError};
use crate::settings::{AdapterKind, AdapterSettings};

/// A live adapter connection.
pub trait ObdConnection: Send {
    /// Query one mode 01 PID.
    ///
    /// `Ok(None)` is a null reading: the adapter answered but the vehicle did
    /// not report the parameter (`NO DATA`).
    fn query(&mut self, pid: Pid) -> Result<Option<f32>, ObdError>;

    /// Query stored diagnostic trouble codes (mode 03). Empty when none.
    fn query_dtc(&mut self) -> Result<Vec<Dtc>, ObdError>;

    /// Release the underlying transport. Further queries fail.
    fn close(&mut self);
}

/// Opens adapter connections. Shared with the blocking pool, hence `Sync`.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn ObdConnection>, ObdError>;

    /// Short description for logs, e.g. `elm327 tcp://192.168.0.10:35000`.
    fn describe(&self) -> String;
}

/// Build the connector selected by `settings.kind`.
pub fn connector_from_settings(settings: &AdapterSettings) -> Result<Arc<dyn Connector>, ConfigError> {
    match settings.kind {
        AdapterKind::Simulated => Ok(Arc::new(SimulatedConnector::new(
            settings.unsupported.clone(),
            settings.stored_dtcs.clone(),
            settings.failed_connects,
        ))),
        AdapterKind::Elm327 => {
            let transport = match (&settings.address, &settings.device) {
                (Some(address), None) => Transport::Tcp(address.clone()),
                (None, Some(device)) => Transport::Device(device.clone()),
                (Some(_), Some(_)) => {
                    return Err(ConfigError::Invalid(
                        "adapter.address and adapter.device are mutually exclusive".into(),
                    ));
                }
                (None, None) => {
                    return Err(ConfigError::Invalid(
                        "elm327 adapter needs adapter.address or adapter.device".into(),
                    ));
                }
            };
            Ok(Arc::new(Elm327Connector::new(
                transport,
                Duration::from_millis(settings.connect_timeout_ms),
                Duration::from_millis(settings.read_timeout_ms),
            )))
        }
    }
}
