//! Layout and timing constants.
//!
//! Layout values are computed at compile time as `const`, so the gauge grid,
//! segment geometry and label positions cost nothing per frame. Timing values
//! are the defaults for the runtime [`Settings`](crate::settings::Settings).
//!
//! # Layout
//!
//! ```text
//! ┌────────────┬────────────┬────────────┬────────────┐
//! │ Intake     │ Oil        │ Coolant    │ RPM        │
//! ├────────────┼────────────┼────────────┼────────────┤  120px rows
//! │ Speed      │ Load       │ Fuel       │ Fuel Trim  │  (110px gauge
//! ├────────────┼────────────┼────────────┼────────────┤   + padding)
//! │ Throttle   │ MAF        │ Baro       │ Ambient    │
//! └────────────┴────────────┴────────────┴────────────┘
//!  CONNECTED                                             status line
//!  P0171: System Too Lean (Bank 1)                       DTC line
//! ```

use std::time::Duration;

use embedded_graphics::prelude::Point;

// =============================================================================
// Display Configuration
// =============================================================================

/// Default window width in pixels.
pub const SCREEN_WIDTH: u32 = 1280;

/// Default window height in pixels.
pub const SCREEN_HEIGHT: u32 = 400;

/// Default window title.
pub const WINDOW_TITLE: &str = "Async OBD Monitor";

// =============================================================================
// Gauge Grid
// =============================================================================

/// Width of a single gauge.
pub const GAUGE_WIDTH: u32 = 310;

/// Height of a single gauge.
pub const GAUGE_HEIGHT: u32 = 110;

/// Padding around each gauge (applied on every side).
pub const GAUGE_PADDING: u32 = 5;

/// Gauges per row.
pub const GAUGE_COLUMNS: usize = 4;

/// Horizontal distance between gauge origins.
pub const GAUGE_PITCH_X: u32 = GAUGE_WIDTH + 2 * GAUGE_PADDING;

/// Vertical distance between gauge origins.
pub const GAUGE_PITCH_Y: u32 = GAUGE_HEIGHT + 2 * GAUGE_PADDING;

/// Top-left corner of the gauge at `index` in table order.
pub const fn gauge_origin(index: usize) -> Point {
    let row = (index / GAUGE_COLUMNS) as u32;
    let col = (index % GAUGE_COLUMNS) as u32;
    Point::new(
        (col * GAUGE_PITCH_X + GAUGE_PADDING) as i32,
        (row * GAUGE_PITCH_Y + GAUGE_PADDING) as i32,
    )
}

/// Rows needed for `count` gauges.
pub const fn gauge_rows(count: usize) -> usize {
    count.div_ceil(GAUGE_COLUMNS)
}

// =============================================================================
// Segment Geometry (Pre-computed)
// =============================================================================

/// Number of bar-graph segments per gauge.
pub const SEGMENT_COUNT: usize = 20;

/// Width of one segment slot, leaving two slots of slack on the right.
pub const SEGMENT_WIDTH: u32 = GAUGE_WIDTH / (SEGMENT_COUNT as u32 + 2);

/// Top of the segment bar, below the label.
pub const SEGMENT_TOP: i32 = 25;

/// Height of the segment bar; the remaining 40px hold label and readout.
pub const SEGMENT_HEIGHT: u32 = GAUGE_HEIGHT - 40;

/// Number of segments between tick marks (bar divided into quarters).
pub const TICK_SPACING: usize = SEGMENT_COUNT / 4;

// =============================================================================
// Status Lines
// =============================================================================

/// Height of each status line.
pub const STATUS_LINE_HEIGHT: u32 = 18;

/// Top of the status area for a grid of `rows` rows.
pub const fn status_top(rows: usize) -> i32 {
    (rows as u32 * GAUGE_PITCH_Y) as i32
}

// =============================================================================
// Timing Defaults
// =============================================================================

/// UI tick: drain the update channel and present a frame.
pub const DEFAULT_UI_TICK: Duration = Duration::from_millis(10);

/// Pause between poll cycles while connected.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(100);

/// Pause before retrying a failed connection.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Consecutive fully failed cycles before a connection is dropped (0 = never).
pub const DEFAULT_MAX_FAILED_CYCLES: u32 = 3;
