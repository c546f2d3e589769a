//! Single-line text widget used for the connection status and DTC lines.

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::Rgb565,
    prelude::*,
    text::Text,
};

use super::primitives::fill_rect;
use crate::colors::BLACK;
use crate::styles::LEFT_TOP;

/// Left-aligned text line that repaints its full width when changed.
pub struct TextLine {
    origin: Point,
    size: Size,
    font: &'static MonoFont<'static>,
    color: Rgb565,
    text: String,
    dirty: bool,
}

impl TextLine {
    pub fn new(origin: Point, size: Size, font: &'static MonoFont<'static>, color: Rgb565, text: impl Into<String>) -> Self {
        Self { origin, size, font, color, text: text.into(), dirty: true }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn color(&self) -> Rgb565 {
        self.color
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the text. Unchanged text does not trigger a repaint.
    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text.clear();
            self.text.push_str(text);
            self.dirty = true;
        }
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    pub fn set_color(&mut self, color: Rgb565) {
        if self.color != color {
            self.color = color;
            self.dirty = true;
        }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Paint the line over its previous frame. Text past the right edge is cut
    /// by the display.
    pub fn draw<D>(&self, display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill_rect(display, self.origin, self.size, BLACK);
        if !self.text.is_empty() {
            Text::with_text_style(&self.text, self.origin, MonoTextStyle::new(self.font, self.color), LEFT_TOP)
                .draw(display)
                .ok();
        }
    }

    /// Paint the line if it changed since the last paint.
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
}

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::PointsIter;
    use embedded_graphics_simulator::SimulatorDisplay;

    use super::*;
    use crate::colors::{RED, YELLOW};
    use crate::styles::STATUS_FONT;

    fn line() -> TextLine {
        TextLine::new(Point::new(0, 2), Size::new(200, 18), STATUS_FONT, RED, "INITIALIZING...")
    }

    fn count_color(display: &SimulatorDisplay<Rgb565>, color: Rgb565) -> usize {
        display.bounding_box().points().filter(|p| display.get_pixel(*p) == color).count()
    }

    #[test]
    fn test_set_text_marks_dirty_only_on_change() {
        let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(200, 24));
        let mut line = line();
        assert!(line.redraw_if_dirty(&mut display));

        line.set_text("INITIALIZING...");
        assert!(!line.is_dirty());
        line.set_text("CONNECTED");
        assert!(line.is_dirty());
        assert_eq!(line.text(), "CONNECTED");
    }

    #[test]
    fn test_draw_renders_in_color() {
        let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(200, 24));
        let mut line = line();
        line.set_color(YELLOW);
        line.draw(&mut display);
        assert!(count_color(&display, YELLOW) > 0);
        assert_eq!(count_color(&display, RED), 0);
    }

    #[test]
    fn test_clear_erases_previous_text() {
        let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(200, 24));
        let mut line = line();
        line.redraw_if_dirty(&mut display);
        assert!(count_color(&display, RED) > 0);

        line.clear();
        assert!(line.redraw_if_dirty(&mut display));
        assert_eq!(count_color(&display, RED), 0);
    }
}
