use std::io::{self, Write};

use nonogram_core::{Cell, MarkState};

const VDU_GCOL: u8 = 18;
const VDU_CLG: u8 = 16;
const VDU_PLOT: u8 = 25;
const PLOT_MOVE: u8 = 4;
const PLOT_RECTANGLE: u8 = 97;

/// Logical colours used for each kind of block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: u8,
    pub blank: u8,
    pub solid: u8,
    pub dot: u8,
    pub active: u8,
    pub in_progress: u8,
    pub done: u8,
    pub unknown: u8,
    pub guides: u8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: 0,
            blank: 0,
            solid: 4,
            dot: 7,
            active: 1,
            in_progress: 2,
            done: 6,
            unknown: 5,
            guides: 5,
        }
    }
}

/// Maps grid cells to graphics coordinates.
///
/// A negative `y_scale` grows the grid downwards from `y_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotterGeometry {
    pub x_scale: i32,
    pub y_scale: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub x_margin: i32,
    pub y_margin: i32,
    pub palette: Palette,
}

impl Default for PlotterGeometry {
    fn default() -> Self {
        Self {
            x_scale: 16,
            y_scale: -16,
            x_offset: 4,
            y_offset: 1019,
            x_margin: 4,
            y_margin: 4,
            palette: Palette::default(),
        }
    }
}

impl PlotterGeometry {
    fn x_sign(&self) -> i32 {
        self.x_scale.signum()
    }

    fn y_sign(&self) -> i32 {
        self.y_scale.signum()
    }
}

/// Emits BBC VDU byte sequences: one filled block per cell, focus or mark
pub struct PlotterDisplay {
    out: Box<dyn Write>,
    width: usize,
    height: usize,
    geometry: PlotterGeometry,
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl PlotterDisplay {
    pub fn new(
        out: Box<dyn Write>,
        width: usize,
        height: usize,
        geometry: PlotterGeometry,
    ) -> Self {
        Self {
            out,
            width,
            height,
            geometry,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Clear the graphics window and draw a guide line every fifth cell
    pub fn clear(&mut self) -> io::Result<()> {
        let background = self.geometry.palette.background;
        self.out.write_all(&[VDU_GCOL, 0, 128 + background, VDU_CLG])?;
        self.draw_guides()?;
        self.out.flush()
    }

    pub fn move_cursor(&mut self, x: usize, y: usize) -> io::Result<()> {
        let g = self.geometry;
        self.plot(
            PLOT_MOVE,
            to_i32(x) * g.x_scale + g.x_offset,
            to_i32(y) * g.y_scale + g.y_offset,
        )
    }

    pub fn paint_cell(&mut self, x: usize, y: usize, cell: Cell) -> io::Result<()> {
        let p = self.geometry.palette;
        let colour = match cell {
            Cell::Blank => p.blank,
            Cell::Dot => p.dot,
            Cell::Solid => p.solid,
            Cell::Unknown => p.unknown,
        };
        self.block(x, y, colour)
    }

    pub fn focus_row(&mut self, row: usize, active: bool) -> io::Result<()> {
        let colour = self.focus_colour(active);
        self.block(self.width + 1, row, colour)
    }

    pub fn focus_column(&mut self, column: usize, active: bool) -> io::Result<()> {
        let colour = self.focus_colour(active);
        self.block(column, self.height + 1, colour)
    }

    pub fn mark_row(&mut self, row: usize, mark: MarkState) -> io::Result<()> {
        let colour = self.mark_colour(mark);
        self.block(self.width + 2, row, colour)
    }

    pub fn mark_column(&mut self, column: usize, mark: MarkState) -> io::Result<()> {
        let colour = self.mark_colour(mark);
        self.block(column, self.height + 2, colour)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn focus_colour(&self, active: bool) -> u8 {
        let p = self.geometry.palette;
        if active {
            p.active
        } else {
            p.background
        }
    }

    fn mark_colour(&self, mark: MarkState) -> u8 {
        let p = self.geometry.palette;
        match mark {
            MarkState::Off => p.background,
            MarkState::InProgress => p.in_progress,
            MarkState::Done => p.done,
        }
    }

    fn plot(&mut self, kind: u8, x: i32, y: i32) -> io::Result<()> {
        let [x0, x1, ..] = x.to_le_bytes();
        let [y0, y1, ..] = y.to_le_bytes();
        self.out.write_all(&[VDU_PLOT, kind, x0, x1, y0, y1])
    }

    fn set_colour(&mut self, colour: u8) -> io::Result<()> {
        self.out.write_all(&[VDU_GCOL, 0, colour])
    }

    fn block(&mut self, x: usize, y: usize, colour: u8) -> io::Result<()> {
        let g = self.geometry;
        self.move_cursor(x, y)?;
        self.set_colour(colour)?;
        self.plot(
            PLOT_RECTANGLE,
            g.x_scale - (g.x_margin + 1) * g.x_sign(),
            g.y_scale - (g.y_margin + 1) * g.y_sign(),
        )
    }

    fn draw_guides(&mut self) -> io::Result<()> {
        let g = self.geometry;
        let (width, height) = (to_i32(self.width), to_i32(self.height));
        self.set_colour(g.palette.guides)?;
        for line in (0..=height).step_by(5) {
            self.plot(PLOT_MOVE, g.x_offset, g.y_offset + line * g.y_scale - g.y_sign())?;
            self.plot(
                PLOT_RECTANGLE,
                g.x_scale * width - g.x_sign(),
                (1 - g.y_margin) * g.y_sign(),
            )?;
        }
        for line in (0..=width).step_by(5) {
            self.plot(PLOT_MOVE, g.x_offset + line * g.x_scale - g.x_sign(), g.y_offset)?;
            self.plot(
                PLOT_RECTANGLE,
                (1 - g.x_margin) * g.x_sign(),
                g.y_scale * height - g.y_sign(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonogram_core::testing::SharedBuffer;

    fn display(width: usize, height: usize) -> (PlotterDisplay, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let out = Box::new(buffer.clone());
        let display = PlotterDisplay::new(out, width, height, PlotterGeometry::default());
        (display, buffer)
    }

    #[test]
    fn test_solid_cell_block() {
        let (mut display, buffer) = display(5, 5);
        display.paint_cell(1, 2, Cell::Solid).unwrap();
        // move to (20, 987), colour 4, block of (11, -11)
        let x = 20i32.to_le_bytes();
        let y = 987i32.to_le_bytes();
        let w = 11i32.to_le_bytes();
        let h = (-11i32).to_le_bytes();
        assert_eq!(
            buffer.bytes(),
            vec![25, 4, x[0], x[1], y[0], y[1], 18, 0, 4, 25, 97, w[0], w[1], h[0], h[1]]
        );
    }

    #[test]
    fn test_mark_colours() {
        let (mut display, buffer) = display(2, 2);
        display.mark_row(0, MarkState::Done).unwrap();
        display.mark_column(0, MarkState::InProgress).unwrap();
        let bytes = buffer.bytes();
        let colours: Vec<u8> = bytes
            .windows(3)
            .filter(|w| w[0] == VDU_GCOL && w[1] == 0)
            .map(|w| w[2])
            .collect();
        assert_eq!(colours, vec![6, 2]);
    }

    #[test]
    fn test_clear_draws_guides() {
        let (mut display, buffer) = display(10, 5);
        display.clear().unwrap();
        let bytes = buffer.bytes();
        assert_eq!(&bytes[..4], &[18, 0, 128, 16]);
        assert_eq!(&bytes[4..7], &[18, 0, 5]);
        // two horizontal and three vertical guides, a move and a block each
        assert_eq!(bytes.len(), 7 + 5 * 2 * 6);
    }
}
