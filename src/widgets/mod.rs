//! Widget components for the dashboard display.
//!
//! - [`gauge`]: segmented bar-graph gauge, one per sensor
//! - [`label`]: single text line for connection status and trouble codes
//! - [`primitives`]: shared low-level drawing helpers
//!
//! # Redraw Model
//!
//! Widgets keep their own state and a dirty flag. Setters only update state;
//! the dashboard calls `redraw_if_dirty` once per UI tick, and each widget
//! repaints its whole rectangle (background first) so no stale pixels remain.
//! Nothing is drawn for widgets that did not change.

pub mod gauge;
pub mod label;
mod primitives;

pub use gauge::Gauge;
pub use label::TextLine;
