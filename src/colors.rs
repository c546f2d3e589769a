//! Color constants and the two-valued dashboard theme.
//!
//! ## Rgb565 Color Format
//!
//! Rgb565 uses 16 bits per pixel: 5 bits red, 6 bits green, 5 bits blue.
//! - Red: 0-31 (5 bits)
//! - Green: 0-63 (6 bits)
//! - Blue: 0-31 (5 bits)
//!
//! # Theme
//!
//! The whole dashboard shares one foreground color. A click anywhere in the
//! window flips it between the primary red and the alternate white; gauges and
//! the connection status label follow it, the DTC label stays [`YELLOW`].

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

// =============================================================================
// Standard Colors (from RgbColor trait - guaranteed optimal values)
// =============================================================================

/// Pure black (0, 0, 0). Window and gauge background.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Pure white (31, 63, 31). Alternate theme color.
pub const WHITE: Rgb565 = Rgb565::WHITE;

/// Pure red (31, 0, 0). Primary theme color.
pub const RED: Rgb565 = Rgb565::RED;

/// Pure yellow (31, 63, 0). Fixed color of the DTC label.
pub const YELLOW: Rgb565 = Rgb565::YELLOW;

// =============================================================================
// Dimmed Segment Colors
// =============================================================================

/// Unlit segment color for the red theme (#300000).
pub const DIM_RED: Rgb565 = Rgb565::new(6, 0, 0);

/// Unlit segment color for any other theme color (#303030).
pub const DIM_GRAY: Rgb565 = Rgb565::new(6, 12, 6);

/// Low-luminance variant of an active color, used for unlit segments.
#[inline]
pub fn dim_color(color: Rgb565) -> Rgb565 {
    if color == RED { DIM_RED } else { DIM_GRAY }
}

// =============================================================================
// Theme
// =============================================================================

/// Process-wide foreground color, toggled by a click.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum Theme {
    /// Red gauges on black.
    #[default]
    Primary,

    /// White gauges on black.
    Alternate,
}

impl Theme {
    /// Flip between primary and alternate.
    #[inline]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Primary => Self::Alternate,
            Self::Alternate => Self::Primary,
        }
    }

    /// Foreground color for gauges and the status label.
    #[inline]
    pub const fn color(self) -> Rgb565 {
        match self {
            Self::Primary => RED,
            Self::Alternate => WHITE,
        }
    }
}
