// Crate-level lints: Allow common graphics patterns that pedantic lints flag
#![allow(clippy::cast_possible_truncation)] // Intentional f32->usize, u32->i32 casts for pixel math
#![allow(clippy::cast_precision_loss)] // usize->f32 in segment calculations
#![allow(clippy::cast_possible_wrap)] // u32->i32 wrapping is acceptable for our value ranges
#![allow(clippy::cast_sign_loss)] // f32->usize where the value is clamped non-negative
#![allow(clippy::module_name_repetitions)]

//! Retro OBD-II dashboard.
//!
//! Twelve segmented bar-graph gauges, a connection status line and a
//! diagnostic trouble code line, fed by a polling loop that talks to an
//! ELM327 adapter (or a simulated one) on its own thread.
//!
//! # Architecture
//!
//! ```text
//!  UI thread                                 obd-poller thread
//! ┌──────────────────────────┐              ┌─────────────────────────┐
//! │ Window events            │              │ current_thread runtime  │
//! │ Dashboard::process_updates ◄── mpsc ────┤ Poller::run             │
//! │ Dashboard::draw          │  UpdateEvent │   spawn_blocking ──► adapter
//! └──────────────────────────┘              └─────────────────────────┘
//! ```
//!
//! - [`obd`]: adapter traits, ELM327 and simulated implementations, PID and
//!   DTC decoding
//! - [`sensors`]: the fixed sensor table (label, unit, maximum, PID, conversion)
//! - [`poller`] / [`worker`]: the polling state machine and its thread
//! - [`channel`]: update events between the two threads
//! - [`dashboard`] / [`widgets`]: presentation state and drawing
//! - [`settings`] / [`logging`] / [`error`]: ambient plumbing

pub mod channel;
pub mod colors;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod obd;
pub mod poller;
pub mod sensors;
pub mod settings;
pub mod styles;
pub mod widgets;
pub mod worker;
