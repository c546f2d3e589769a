//! Low-level drawing primitives shared across widgets.
//!
//! Widgets redraw in place over their previous frame, so every redraw starts
//! by filling the widget's rectangle with the background color. All helpers
//! are generic over the draw target and discard draw errors with `.ok()`.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};

/// Fill a rectangle with a solid color.
///
/// Zero-sized rectangles draw nothing.
pub fn fill_rect<D>(display: &mut D, top_left: Point, size: Size, color: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    if size.width == 0 || size.height == 0 {
        return;
    }
    Rectangle::new(top_left, size)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(display)
        .ok();
}

/// Draw a 1px vertical line `height` pixels tall, starting at `top`.
pub fn draw_vline<D>(display: &mut D, top: Point, height: u32, color: Rgb565)
where
    D: DrawTarget<Color = Rgb565>,
{
    if height == 0 {
        return;
    }
    Line::new(top, top + Point::new(0, height as i32 - 1))
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(display)
        .ok();
}

#[cfg(test)]
mod tests {
    use embedded_graphics_simulator::SimulatorDisplay;

    use super::*;
    use crate::colors::{BLACK, RED, WHITE};

    #[test]
    fn test_fill_rect_bounds() {
        let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(20, 20));
        fill_rect(&mut display, Point::new(2, 3), Size::new(4, 5), RED);
        assert_eq!(display.get_pixel(Point::new(2, 3)), RED);
        assert_eq!(display.get_pixel(Point::new(5, 7)), RED);
        assert_eq!(display.get_pixel(Point::new(6, 7)), BLACK);
        assert_eq!(display.get_pixel(Point::new(5, 8)), BLACK);
    }

    #[test]
    fn test_fill_rect_zero_size() {
        let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(4, 4));
        fill_rect(&mut display, Point::zero(), Size::new(0, 4), RED);
        assert_eq!(display.get_pixel(Point::zero()), BLACK);
    }

    #[test]
    fn test_draw_vline_height() {
        let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(10, 10));
        draw_vline(&mut display, Point::new(4, 1), 5, WHITE);
        assert_eq!(display.get_pixel(Point::new(4, 1)), WHITE);
        assert_eq!(display.get_pixel(Point::new(4, 5)), WHITE);
        assert_eq!(display.get_pixel(Point::new(4, 6)), BLACK);
        assert_eq!(display.get_pixel(Point::new(5, 3)), BLACK);
    }
}
