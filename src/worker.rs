//! Dedicated thread hosting the polling loop.
//!
//! The poller runs on a single-threaded tokio runtime owned by its own OS
//! thread, so the UI thread never enters async code. Shutdown cancels the
//! loop and detaches the thread: the caller never waits for an in-flight
//! adapter query. The loop closes its connection on the way out and the
//! runtime is shut down in the background.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::channel::UpdateSender;
use crate::error::DashError;
use crate::obd::Connector;
use crate::poller::{Poller, PollerConfig};

/// Thread name shown in debuggers and panic messages.
const THREAD_NAME: &str = "obd-poller";

/// Lifecycle handle of the polling thread. Stops the loop when dropped.
pub struct PollerHandle {
    thread: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl PollerHandle {
    /// Build the runtime and start the polling loop on a new thread.
    pub fn spawn(connector: Arc<dyn Connector>, updates: UpdateSender, config: PollerConfig) -> Result<Self, DashError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .thread_name(THREAD_NAME)
            .build()
            .map_err(DashError::WorkerSpawn)?;

        let cancel = CancellationToken::new();
        let poller = Poller::new(connector, updates, config, cancel.clone());

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(poller.run());
                runtime.shutdown_background();
                debug!("polling runtime shut down");
            })
            .map_err(DashError::WorkerSpawn)?;

        info!(?config, "polling worker started");
        Ok(Self { thread: Some(thread), cancel })
    }

    /// Whether the polling thread has exited or been detached.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the loop and detach the thread. Does not block.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if self.thread.take().is_some() {
            info!("polling worker stopping");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::channel::{ConnectionStatus, UpdateEvent, update_channel};
    use crate::obd::SimulatedConnector;

    const FAST: PollerConfig = PollerConfig {
        cycle_interval: Duration::from_millis(1),
        reconnect_backoff: Duration::from_millis(1),
        max_failed_cycles: 3,
    };

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(2) {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_worker_delivers_events() {
        let (tx, mut rx) = update_channel();
        let handle = PollerHandle::spawn(Arc::new(SimulatedConnector::default()), tx, FAST).unwrap();

        let mut events = Vec::new();
        assert!(wait_for(|| {
            events.extend(rx.drain());
            events.iter().any(|e| matches!(e, UpdateEvent::Gauge { .. }))
        }));
        assert_eq!(events[0], UpdateEvent::Status(ConnectionStatus::Connected));
        drop(handle);
    }

    #[test]
    fn test_stop_cancels_without_blocking() {
        let (tx, rx) = update_channel();
        let mut handle = PollerHandle::spawn(Arc::new(SimulatedConnector::default()), tx, FAST).unwrap();
        let cancel = handle.cancel.clone();

        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(cancel.is_cancelled());
        // The detached loop still exits and drops its sender
        assert!(wait_for(|| rx.is_closed()));
    }

    #[test]
    fn test_thread_exits_when_receiver_dropped() {
        let (tx, rx) = update_channel();
        let handle = PollerHandle::spawn(Arc::new(SimulatedConnector::default()), tx, FAST).unwrap();
        drop(rx);
        assert!(wait_for(|| handle.is_finished()));
    }
}
