//! Retro bar-graph gauge.
//!
//! # Layout (310x110)
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │               Oil Temp                │  label, centered, y=5
//! │ ▐█▐█▐█▐█▐█│▐█▐█▐░▐░▐░│▐░▐░ ...        │  20 segments, y=25..95
//! │           │          │                │  ticks every 5 segments
//! │               90.0 °C                 │  readout, bottom y=105
//! └───────────────────────────────────────┘
//! ```
//!
//! Lit segments use the theme color, unlit ones its dimmed variant
//! ([`dim_color`]). Lit count is `floor(value * 20 / max)`; an inactive gauge
//! lights nothing and reads `N/A`.
//!
//! Setters only record state and mark the gauge dirty; [`Gauge::redraw_if_dirty`]
//! repaints it on the next UI tick.

use core::fmt::Write;

use embedded_graphics::{
    mono_font::MonoTextStyle,
    pixelcolor::Rgb565,
    prelude::*,
    text::Text,
};
use heapless::String;

use super::primitives::{draw_vline, fill_rect};
use crate::colors::{BLACK, dim_color};
use crate::config::{GAUGE_HEIGHT, GAUGE_WIDTH, SEGMENT_COUNT, SEGMENT_HEIGHT, SEGMENT_TOP, SEGMENT_WIDTH, TICK_SPACING};
use crate::sensors::SensorSpec;
use crate::styles::{CENTERED_BOTTOM, CENTERED_TOP, LABEL_FONT, VALUE_FONT};

/// Readout capacity; fits `8000.0 rpm` and UTF-8 units like `°C`.
pub type ValueText = String<24>;

/// Label anchor relative to the gauge origin.
const LABEL_OFFSET: Point = Point::new((GAUGE_WIDTH / 2) as i32, 5);

/// Readout anchor relative to the gauge origin.
const VALUE_OFFSET: Point = Point::new((GAUGE_WIDTH / 2) as i32, GAUGE_HEIGHT as i32 - 5);

/// Visible segment size (1px gap to the next slot).
const SEGMENT_SIZE: Size = Size::new(SEGMENT_WIDTH - 1, SEGMENT_HEIGHT);

/// Text shown for an inactive gauge.
pub const NOT_AVAILABLE: &str = "N/A";

/// One sensor's gauge.
#[derive(Debug)]
pub struct Gauge {
    label: &'static str,
    unit: &'static str,
    max_value: f32,
    origin: Point,
    value: f32,
    active: bool,
    color: Rgb565,
    dirty: bool,
}

impl Gauge {
    /// Create a gauge at `origin`, active and reading zero.
    pub fn new(label: &'static str, unit: &'static str, max_value: f32, origin: Point, color: Rgb565) -> Self {
        Self { label, unit, max_value, origin, value: 0.0, active: true, color, dirty: true }
    }

    /// Create the gauge for one sensor table entry.
    pub fn for_sensor(spec: &'static SensorSpec, origin: Point, color: Rgb565) -> Self {
        Self::new(spec.label, spec.unit, spec.max_value, origin, color)
    }

    /// Show `value`, clamped to `[0, max]`. Non-finite values show as 0.
    pub fn set_value(&mut self, value: f32) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.value = value.clamp(0.0, self.max_value);
        self.active = true;
        self.dirty = true;
    }

    /// Show `N/A` with no segments lit.
    pub fn set_inactive(&mut self) {
        self.active = false;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: Rgb565) {
        self.color = color;
        self.dirty = true;
    }

    /// Force a repaint on the next tick (e.g. after the screen was cleared).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub const fn value(&self) -> f32 {
        self.value
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn color(&self) -> Rgb565 {
        self.color
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Segments drawn in the lit color.
    pub fn lit_segments(&self) -> usize {
        if !self.active {
            return 0;
        }
        let lit = (self.value * SEGMENT_COUNT as f32 / self.max_value).floor() as usize;
        lit.min(SEGMENT_COUNT)
    }

    /// Readout text: one decimal place and the unit, or `N/A`.
    pub fn value_text(&self) -> ValueText {
        let mut text = ValueText::new();
        if self.active {
            let _ = write!(text, "{:.1} {}", self.value, self.unit);
        } else {
            let _ = text.push_str(NOT_AVAILABLE);
        }
        text
    }

    /// Paint the whole gauge over its previous frame.
    pub fn draw<D>(&self, display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_rect(display, self.origin, Size::new(GAUGE_WIDTH, GAUGE_HEIGHT), BLACK);

        let style = MonoTextStyle::new(LABEL_FONT, self.color);
        Text::with_text_style(self.label, self.origin + LABEL_OFFSET, style, CENTERED_TOP)
            .draw(display)
            .ok();

        let lit = self.lit_segments();
        let dim = dim_color(self.color);
        for i in 0..SEGMENT_COUNT {
            let color = if i < lit { self.color } else { dim };
            fill_rect(display, self.segment_origin(i), SEGMENT_SIZE, color);
        }

        // Tick marks at 0, 1/4, 1/2, 3/4 and full scale
        for i in (0..=SEGMENT_COUNT).step_by(TICK_SPACING) {
            draw_vline(display, self.segment_origin(i), SEGMENT_HEIGHT + 1, self.color);
        }

        let style = MonoTextStyle::new(VALUE_FONT, self.color);
        Text::with_text_style(&self.value_text(), self.origin + VALUE_OFFSET, style, CENTERED_BOTTOM)
            .draw(display)
            .ok();
    }

    /// Paint the gauge if anything changed since the last paint.
    ///
    /// Returns whether it was painted.
    pub fn redraw_if_dirty<D>(&mut self, display: &mut D) -> bool
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if !self.dirty {
            return false;
        }
        self.draw(display);
        self.dirty = false;
        true
    }

    fn segment_origin(&self, index: usize) -> Point {
        self.origin + Point::new((index as u32 * SEGMENT_WIDTH) as i32, SEGMENT_TOP)
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics_simulator::SimulatorDisplay;

    use super::*;
    use crate::colors::{DIM_GRAY, DIM_RED, RED, WHITE};
    use crate::sensors::SensorKey;

    const ORIGIN: Point = Point::new(5, 5);

    fn rpm_gauge() -> Gauge {
        Gauge::for_sensor(SensorKey::Rpm.spec(), ORIGIN, RED)
    }

    fn display() -> SimulatorDisplay<Rgb565> {
        SimulatorDisplay::new(Size::new(320, 120))
    }

    /// A pixel inside segment `i`, clear of tick columns.
    fn segment_pixel(i: usize) -> Point {
        ORIGIN + Point::new((i as u32 * SEGMENT_WIDTH) as i32 + 6, SEGMENT_TOP + 30)
    }

    #[test]
    fn test_half_scale_reading() {
        let mut gauge = rpm_gauge();
        gauge.set_value(4000.0);
        assert_eq!(gauge.value_text().as_str(), "4000.0 rpm");
        assert_eq!(gauge.lit_segments(), 10);
    }

    #[test]
    fn test_value_clamped_to_range() {
        let mut gauge = rpm_gauge();
        gauge.set_value(9500.0);
        assert_eq!(gauge.value(), 8000.0);
        assert_eq!(gauge.lit_segments(), 20);
        assert_eq!(gauge.value_text().as_str(), "8000.0 rpm");

        gauge.set_value(-12.5);
        assert_eq!(gauge.value(), 0.0);
        assert_eq!(gauge.lit_segments(), 0);
    }

    #[test]
    fn test_non_finite_reads_zero() {
        let mut gauge = rpm_gauge();
        gauge.set_value(f32::NAN);
        assert_eq!(gauge.value(), 0.0);
        gauge.set_value(f32::INFINITY);
        assert_eq!(gauge.value(), 0.0);
    }

    #[test]
    fn test_lit_segments_floor() {
        let mut gauge = rpm_gauge();
        // 399 rpm is just under one segment (400)
        gauge.set_value(399.0);
        assert_eq!(gauge.lit_segments(), 0);
        gauge.set_value(400.0);
        assert_eq!(gauge.lit_segments(), 1);
        gauge.set_value(7999.0);
        assert_eq!(gauge.lit_segments(), 19);
    }

    #[test]
    fn test_inactive_shows_na() {
        let mut gauge = rpm_gauge();
        gauge.set_value(6000.0);
        gauge.set_inactive();
        assert!(!gauge.is_active());
        assert_eq!(gauge.value_text().as_str(), "N/A");
        assert_eq!(gauge.lit_segments(), 0);

        gauge.set_value(1000.0);
        assert!(gauge.is_active());
        assert_eq!(gauge.value_text().as_str(), "1000.0 rpm");
    }

    #[test]
    fn test_unit_suffix() {
        let mut gauge = Gauge::for_sensor(SensorKey::OilTemp.spec(), ORIGIN, RED);
        gauge.set_value(90.0);
        assert_eq!(gauge.value_text().as_str(), "90.0 °C");
    }

    #[test]
    fn test_setters_mark_dirty() {
        let mut display = display();
        let mut gauge = rpm_gauge();
        assert!(gauge.redraw_if_dirty(&mut display));
        assert!(!gauge.is_dirty());
        assert!(!gauge.redraw_if_dirty(&mut display));

        gauge.set_value(100.0);
        assert!(gauge.is_dirty());
        gauge.redraw_if_dirty(&mut display);
        gauge.set_inactive();
        assert!(gauge.is_dirty());
        gauge.redraw_if_dirty(&mut display);
        gauge.set_color(WHITE);
        assert!(gauge.is_dirty());
    }

    #[test]
    fn test_draw_lit_and_dim_segments() {
        let mut display = display();
        let mut gauge = rpm_gauge();
        gauge.set_value(4000.0);
        gauge.draw(&mut display);

        assert_eq!(display.get_pixel(segment_pixel(0)), RED);
        assert_eq!(display.get_pixel(segment_pixel(9)), RED);
        assert_eq!(display.get_pixel(segment_pixel(10)), DIM_RED);
        assert_eq!(display.get_pixel(segment_pixel(19)), DIM_RED);
    }

    #[test]
    fn test_draw_inactive_all_dim() {
        let mut display = display();
        let mut gauge = rpm_gauge();
        gauge.set_value(8000.0);
        gauge.set_inactive();
        gauge.draw(&mut display);

        for i in 0..SEGMENT_COUNT {
            assert_eq!(display.get_pixel(segment_pixel(i)), DIM_RED);
        }
    }

    #[test]
    fn test_draw_white_theme_dims_gray() {
        let mut display = display();
        let mut gauge = rpm_gauge();
        gauge.set_color(WHITE);
        gauge.set_value(400.0);
        gauge.draw(&mut display);

        assert_eq!(display.get_pixel(segment_pixel(0)), WHITE);
        assert_eq!(display.get_pixel(segment_pixel(1)), DIM_GRAY);
    }

    #[test]
    fn test_draw_tick_marks() {
        let mut display = display();
        let gauge = rpm_gauge();
        gauge.draw(&mut display);

        for segment in [0, 5, 10, 15, 20] {
            let x = ORIGIN.x + (segment as u32 * SEGMENT_WIDTH) as i32;
            assert_eq!(display.get_pixel(Point::new(x, ORIGIN.y + SEGMENT_TOP + 10)), RED, "tick at segment {segment}");
        }
    }

    #[test]
    fn test_redraw_clears_previous_frame() {
        let mut display = display();
        let mut gauge = rpm_gauge();
        gauge.set_value(8000.0);
        gauge.draw(&mut display);
        gauge.set_value(0.0);
        gauge.draw(&mut display);

        assert_eq!(display.get_pixel(segment_pixel(19)), DIM_RED);
    }
}
