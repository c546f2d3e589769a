//! Pre-computed text styles to avoid per-frame object construction.
//!
//! Alignment and baseline combinations are `const`, computed once at compile
//! time. Text colors follow the theme, so callers build
//! `MonoTextStyle::new(FONT, color)` on demand; only the font reference is
//! shared.

use embedded_graphics::{
    mono_font::MonoFont,
    text::{Alignment, Baseline, TextStyle, TextStyleBuilder},
};
use profont::{PROFONT_10_POINT, PROFONT_12_POINT, PROFONT_14_POINT};

// =============================================================================
// Text Anchors (const - zero runtime cost)
// =============================================================================

/// Horizontally centered, hanging from the top. Gauge labels.
pub const CENTERED_TOP: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Top)
    .build();

/// Horizontally centered, sitting on the bottom. Gauge readouts.
pub const CENTERED_BOTTOM: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Bottom)
    .build();

/// Left-aligned, hanging from the top. Status and DTC lines.
pub const LEFT_TOP: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Left)
    .baseline(Baseline::Top)
    .build();

// =============================================================================
// Font References (for themed styles)
// =============================================================================

/// Gauge label font.
pub const LABEL_FONT: &MonoFont = &PROFONT_12_POINT;

/// Gauge numeric readout font.
pub const VALUE_FONT: &MonoFont = &PROFONT_14_POINT;

/// Connection status line font.
pub const STATUS_FONT: &MonoFont = &PROFONT_10_POINT;

/// DTC line font.
pub const DTC_FONT: &MonoFont = &PROFONT_12_POINT;
