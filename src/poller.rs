//! Polling loop: connect, query every sensor, report, repeat.
//!
//! # State Machine
//!
//! ```text
//!                connect ok
//!  DISCONNECTED ───────────► CONNECTED ──┐ poll cycle
//!     ▲    │                     │  ▲    │ (12 PIDs + DTCs)
//!     │    │ connect failed      │  └────┘
//!     │    ▼                     │
//!     │  wait backoff            │ N fully failed cycles,
//!     └──────────────────────────┘ or worker panic
//! ```
//!
//! Every adapter call is blocking, so each one runs on tokio's blocking pool
//! with the connection moved in and handed back. A panic inside the adapter
//! surfaces as a join error and the connection is treated as lost.
//!
//! Results never touch presentation state; they are pushed onto the update
//! channel. Cancellation is observed between cycles and during every sleep;
//! an in-flight query always runs to completion.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::channel::{ConnectionStatus, UpdateEvent, UpdateSender};
use crate::error::ObdError;
use crate::obd::{Connector, Dtc, ObdConnection};
use crate::sensors::{SENSOR_COUNT, SENSORS};
use crate::settings::PollingSettings;

/// Timing and demotion policy of the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    /// Pause after each cycle while connected.
    pub cycle_interval: Duration,
    /// Pause after a failed connection attempt.
    pub reconnect_backoff: Duration,
    /// Consecutive cycles with every query failing before the connection is
    /// dropped. `0` keeps the connection forever.
    pub max_failed_cycles: u32,
}

impl From<&PollingSettings> for PollerConfig {
    fn from(settings: &PollingSettings) -> Self {
        Self {
            cycle_interval: settings.cycle_interval(),
            reconnect_backoff: settings.reconnect_backoff(),
            max_failed_cycles: settings.max_failed_cycles,
        }
    }
}

/// Outcome of one poll cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// Adapter calls made (sensors plus the DTC query).
    pub queries: usize,
    /// Calls that returned an error. Null readings are not failures.
    pub failures: usize,
}

impl CycleReport {
    pub const fn all_failed(&self) -> bool {
        self.queries > 0 && self.failures == self.queries
    }
}

/// The polling loop. Consumed by [`Poller::run`].
pub struct Poller {
    connector: Arc<dyn Connector>,
    updates: UpdateSender,
    config: PollerConfig,
    cancel: CancellationToken,
    /// Codes from the previous DTC answer, to log only changes.
    last_dtcs: Vec<Dtc>,
}

impl Poller {
    pub fn new(
        connector: Arc<dyn Connector>,
        updates: UpdateSender,
        config: PollerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self { connector, updates, config, cancel, last_dtcs: Vec::new() }
    }

    /// Run until cancelled or until the UI drops its receiver.
    pub async fn run(mut self) {
        info!(adapter = %self.connector.describe(), "polling loop started");

        let mut link: Option<Box<dyn ObdConnection>> = None;
        let mut failed_cycles = 0u32;

        while !self.cancel.is_cancelled() && !self.updates.is_closed() {
            let Some(conn) = link.take() else {
                match self.connect().await {
                    Ok(conn) => {
                        info!(adapter = %self.connector.describe(), "adapter connected");
                        self.updates.send(UpdateEvent::Status(ConnectionStatus::Connected));
                        failed_cycles = 0;
                        link = Some(conn);
                    }
                    Err(e) => {
                        error!(error = %e, "failed to connect to adapter");
                        self.updates.send(UpdateEvent::Status(ConnectionStatus::Failed));
                        if !self.pause(self.config.reconnect_backoff).await {
                            break;
                        }
                    }
                }
                continue;
            };

            match self.poll_cycle(conn).await {
                Ok((mut conn, report)) => {
                    failed_cycles = if report.all_failed() { failed_cycles + 1 } else { 0 };
                    if self.config.max_failed_cycles > 0 && failed_cycles >= self.config.max_failed_cycles {
                        warn!(cycles = failed_cycles, "every query failing, dropping adapter connection");
                        conn.close();
                        self.updates.send(UpdateEvent::Status(ConnectionStatus::Lost));
                        failed_cycles = 0;
                    } else {
                        link = Some(conn);
                    }
                }
                Err(e) => {
                    error!(error = %e, "adapter connection lost");
                    self.updates.send(UpdateEvent::Status(ConnectionStatus::Lost));
                }
            }

            if !self.pause(self.config.cycle_interval).await {
                break;
            }
        }

        if let Some(mut conn) = link {
            conn.close();
        }
        info!("polling loop stopped");
    }

    /// One pass over every sensor, then the DTC query.
    ///
    /// Each sensor is isolated: a failure or null reading marks only that
    /// sensor inactive. `Err` means the connection itself is gone.
    pub async fn poll_cycle(
        &mut self,
        mut conn: Box<dyn ObdConnection>,
    ) -> Result<(Box<dyn ObdConnection>, CycleReport), ObdError> {
        let mut failures = 0;

        for sensor in &SENSORS {
            let pid = sensor.pid;
            let (returned, result) = blocking(conn, move |c| c.query(pid)).await?;
            conn = returned;

            let event = match result {
                Ok(Some(raw)) => {
                    let value = sensor.to_display(raw);
                    debug!(sensor = %sensor.key, value, "reading");
                    UpdateEvent::reading(sensor.key, value)
                }
                Ok(None) => {
                    debug!(sensor = %sensor.key, "no data");
                    UpdateEvent::inactive(sensor.key)
                }
                Err(e) => {
                    failures += 1;
                    error!(sensor = %sensor.key, error = %e, "sensor query failed");
                    UpdateEvent::inactive(sensor.key)
                }
            };
            self.updates.send(event);
        }

        let (returned, result) = blocking(conn, |c| c.query_dtc()).await?;
        conn = returned;
        match result {
            Ok(codes) => {
                if codes != self.last_dtcs {
                    info!(count = codes.len(), "stored trouble codes changed");
                    self.last_dtcs.clone_from(&codes);
                }
                let event = if codes.is_empty() { UpdateEvent::Dtc(None) } else { UpdateEvent::Dtc(Some(codes)) };
                self.updates.send(event);
            }
            Err(e) => {
                failures += 1;
                error!(error = %e, "DTC query failed");
            }
        }

        Ok((conn, CycleReport { queries: SENSOR_COUNT + 1, failures }))
    }

    async fn connect(&self) -> Result<Box<dyn ObdConnection>, ObdError> {
        let connector = Arc::clone(&self.connector);
        tokio::task::spawn_blocking(move || connector.connect())
            .await
            .map_err(|e| ObdError::Worker(e.to_string()))?
    }

    /// Sleep unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}

/// Run `f` against the connection on the blocking pool and hand it back.
async fn blocking<R, F>(conn: Box<dyn ObdConnection>, f: F) -> Result<(Box<dyn ObdConnection>, R), ObdError>
where
    R: Send + 'static,
    F: FnOnce(&mut dyn ObdConnection) -> R + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = conn;
        let result = f(conn.as_mut());
        (conn, result)
    })
    .await
    .map_err(|e| ObdError::Worker(e.to_string()))
}
