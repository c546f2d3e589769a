//! Dashboard controller: owns the widgets, applies updates, manages the poller.
//!
//! The UI thread calls [`Dashboard::process_updates`] and
//! [`Dashboard::draw`] once per tick. Updates are applied in the order the
//! poller sent them; only widgets whose state changed are repainted.

use std::sync::Arc;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use tracing::debug;

use crate::channel::{ConnectionStatus, UpdateEvent, UpdateReceiver, update_channel};
use crate::colors::{BLACK, Theme, YELLOW};
use crate::config::{GAUGE_COLUMNS, GAUGE_PITCH_X, STATUS_LINE_HEIGHT, gauge_origin, gauge_rows, status_top};
use crate::error::DashError;
use crate::obd::{Connector, Dtc};
use crate::poller::PollerConfig;
use crate::sensors::{SENSOR_COUNT, SENSORS, SensorKey};
use crate::settings::Settings;
use crate::styles::{DTC_FONT, STATUS_FONT};
use crate::widgets::{Gauge, TextLine};
use crate::worker::PollerHandle;

/// Separator between codes on the DTC line.
const DTC_SEPARATOR: &str = " | ";

/// Width of the status and DTC lines.
const LINE_WIDTH: u32 = GAUGE_COLUMNS as u32 * GAUGE_PITCH_X;

/// Top of the connection status line.
const STATUS_POS: Point = Point::new(5, status_top(gauge_rows(SENSOR_COUNT)));

/// Top of the DTC line, directly below the status line.
const DTC_POS: Point = Point::new(5, STATUS_POS.y + STATUS_LINE_HEIGHT as i32);

/// Join codes as `CODE: description | CODE: description`.
pub fn format_dtcs(codes: &[Dtc]) -> String {
    codes.iter().map(ToString::to_string).collect::<Vec<_>>().join(DTC_SEPARATOR)
}

pub struct Dashboard {
    /// Indexed by [`SensorKey::index`].
    gauges: Vec<Gauge>,
    theme: Theme,
    status: TextLine,
    dtc: TextLine,
    updates: UpdateReceiver,
    poller: Option<PollerHandle>,
    /// Whole screen must be cleared before the next paint.
    needs_clear: bool,
}

impl Dashboard {
    /// Build the widgets around an existing receiver. No poller is attached.
    pub fn new(updates: UpdateReceiver) -> Self {
        let theme = Theme::default();
        let gauges = SENSORS
            .iter()
            .map(|sensor| Gauge::for_sensor(sensor, gauge_origin(sensor.key.index()), theme.color()))
            .collect();
        let line_size = Size::new(LINE_WIDTH - 5, STATUS_LINE_HEIGHT);

        Self {
            gauges,
            theme,
            status: TextLine::new(STATUS_POS, line_size, STATUS_FONT, theme.color(), ConnectionStatus::default().label()),
            dtc: TextLine::new(DTC_POS, line_size, DTC_FONT, YELLOW, ""),
            updates,
            poller: None,
            needs_clear: true,
        }
    }

    /// Build the dashboard and start polling `connector` on a worker thread.
    pub fn start(settings: &Settings, connector: Arc<dyn Connector>) -> Result<Self, DashError> {
        let (tx, rx) = update_channel();
        let mut dashboard = Self::new(rx);
        dashboard.poller = Some(PollerHandle::spawn(connector, tx, PollerConfig::from(&settings.polling))?);
        Ok(dashboard)
    }

    /// Apply every queued update. Returns how many were applied.
    pub fn process_updates(&mut self) -> usize {
        let events = self.updates.drain();
        let count = events.len();
        for event in events {
            self.apply(event);
        }
        count
    }

    /// Apply one update to the matching widget.
    pub fn apply(&mut self, event: UpdateEvent) {
        match event {
            UpdateEvent::Gauge { key, value, active: true } => self.gauges[key.index()].set_value(value),
            UpdateEvent::Gauge { key, active: false, .. } => self.gauges[key.index()].set_inactive(),
            UpdateEvent::Dtc(Some(codes)) if !codes.is_empty() => self.dtc.set_text(&format_dtcs(&codes)),
            UpdateEvent::Dtc(_) => self.dtc.clear(),
            UpdateEvent::Status(status) => self.status.set_text(status.label()),
        }
    }

    /// Flip the theme and recolor every gauge and the status line.
    /// The DTC line keeps its fixed color.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        let color = self.theme.color();
        for gauge in &mut self.gauges {
            gauge.set_color(color);
        }
        self.status.set_color(color);
        debug!(theme = ?self.theme, "theme toggled");
    }

    pub const fn theme(&self) -> Theme {
        self.theme
    }

    pub fn gauge(&self, key: SensorKey) -> &Gauge {
        &self.gauges[key.index()]
    }

    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }

    pub fn status_text(&self) -> &str {
        self.status.text()
    }

    pub fn dtc_text(&self) -> &str {
        self.dtc.text()
    }

    pub const fn dtc_color(&self) -> Rgb565 {
        self.dtc.color()
    }

    pub const fn status_color(&self) -> Rgb565 {
        self.status.color()
    }

    /// Clear the screen and repaint everything on the next draw.
    pub fn invalidate(&mut self) {
        self.needs_clear = true;
    }

    /// Paint changed widgets. Returns how many were repainted.
    pub fn draw<D>(&mut self, display: &mut D) -> usize
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.needs_clear {
            display.clear(BLACK).ok();
            for gauge in &mut self.gauges {
                gauge.invalidate();
            }
            self.status.invalidate();
            self.dtc.invalidate();
            self.needs_clear = false;
        }

        let mut painted = 0;
        for gauge in &mut self.gauges {
            painted += usize::from(gauge.redraw_if_dirty(display));
        }
        painted += usize::from(self.status.redraw_if_dirty(display));
        painted += usize::from(self.dtc.redraw_if_dirty(display));
        painted
    }

    /// Whether a polling worker is attached and running.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Stop the poller without waiting for it.
    pub fn stop(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.stop();
    }
}
