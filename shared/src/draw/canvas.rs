//! Sub-pixel canvas with 2x vertical resolution and diff-based rendering.
//!
//! The canvas backs a `term_width x term_height` terminal with a flat
//! boolean pixel bitmap of `term_height * 2` sub-pixel rows. Each terminal
//! cell composites its two vertical pixels into one of four glyphs:
//!
//! | top | bottom | glyph |
//! |-----|--------|-------|
//! |  0  |   0    | space |
//! |  1  |   0    | `▀`   |
//! |  0  |   1    | `▄`   |
//! |  1  |   1    | `█`   |
//!
//! A parallel cell array remembers the state last emitted to the terminal,
//! so [`Canvas::render`] transmits only cells that actually changed. Text
//! overlays drawn outside the canvas mark their cells dirty via
//! [`Canvas::mark_text_dirty`] and are restored to the canvas glyph on the
//! next render.

use super::chunk::ChunkWriter;
use super::{
    BLOCK_EMPTY, BLOCK_FULL, BLOCK_LOWER_HALF, BLOCK_UPPER_HALF, BOX_BOTTOM_LEFT,
    BOX_BOTTOM_RIGHT, BOX_HORIZONTAL, BOX_TOP_LEFT, BOX_TOP_RIGHT, BOX_VERTICAL,
};
use crate::geometry::Point;

const CELL_EMPTY: u8 = 0;
const CELL_UPPER: u8 = 1;
const CELL_LOWER: u8 = 2;
const CELL_FULL: u8 = 3;
const STATE_MASK: u8 = 0b011;
const DIRTY_BIT: u8 = 0b100;

fn cell_glyph(state: u8) -> char {
    match state {
        CELL_UPPER => BLOCK_UPPER_HALF,
        CELL_LOWER => BLOCK_LOWER_HALF,
        CELL_FULL => BLOCK_FULL,
        _ => BLOCK_EMPTY,
    }
}

/// Drawing buffer with half-block sub-pixels, logical-coordinate scaling,
/// a centering offset for oversized terminals, and double-buffered cell
/// state for diff rendering.
#[derive(Debug)]
pub struct Canvas {
    term_width: usize,
    term_height: usize,
    sub_height: usize,
    pixels: Vec<bool>,
    /// Per terminal cell: last emitted state in the low bits plus the
    /// text-overlay dirty bit.
    cells: Vec<u8>,

    logical_width: f64,
    logical_height: f64,
    scale_x: f64,
    scale_y: f64,

    offset_col: usize,
    offset_row: usize,
    force_redraw: bool,

    // Reusable buffers for polygon filling.
    scaled_buf: Vec<Point>,
    intersection_buf: Vec<f64>,
}

impl Canvas {
    /// Creates a canvas that scales from logical coordinates to terminal
    /// pixels. `logical_width`/`logical_height` define the coordinate
    /// space used by game objects (height in sub-pixels).
    pub fn new(term_width: usize, term_height: usize, logical_width: f64, logical_height: f64) -> Self {
        let sub_height = term_height * 2;
        Self {
            term_width,
            term_height,
            sub_height,
            pixels: vec![false; sub_height * term_width],
            cells: vec![CELL_EMPTY; term_height * term_width],
            logical_width,
            logical_height,
            scale_x: term_width as f64 / logical_width,
            scale_y: sub_height as f64 / logical_height,
            offset_col: 0,
            offset_row: 0,
            force_redraw: false,
            scaled_buf: Vec::new(),
            intersection_buf: Vec::new(),
        }
    }

    /// Updates the canvas for new terminal dimensions, keeping the logical
    /// size. Reallocates only when the size actually changed.
    pub fn resize(&mut self, term_width: usize, term_height: usize) {
        let sub_height = term_height * 2;
        if term_width != self.term_width || term_height != self.term_height {
            self.term_width = term_width;
            self.term_height = term_height;
            self.sub_height = sub_height;
            self.pixels = vec![false; sub_height * term_width];
            self.cells = vec![CELL_EMPTY; term_height * term_width];
        }
        self.scale_x = term_width as f64 / self.logical_width;
        self.scale_y = sub_height as f64 / self.logical_height;
    }

    /// Sets the centering offset: the canvas occupies terminal positions
    /// starting at `(offset_col + 1, offset_row + 1)`.
    pub fn set_offset(&mut self, col: usize, row: usize) {
        self.offset_col = col;
        self.offset_row = row;
    }

    pub fn offset_col(&self) -> usize {
        self.offset_col
    }

    pub fn offset_row(&self) -> usize {
        self.offset_row
    }

    pub fn term_width(&self) -> usize {
        self.term_width
    }

    pub fn term_height(&self) -> usize {
        self.term_height
    }

    /// Resets the pixel bitmap. Cell state is left alone; the next render
    /// diffs against what is actually on screen.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Forces the next [`Canvas::render`] to emit every cell, after a
    /// resize or a full screen clear.
    pub fn force_redraw(&mut self) {
        self.force_redraw = true;
    }

    fn set_pixel(&mut self, x: i64, y: i64) {
        if x >= 0 && (x as usize) < self.term_width && y >= 0 && (y as usize) < self.sub_height {
            self.pixels[y as usize * self.term_width + x as usize] = true;
        }
    }

    /// Sets a pixel at logical coordinates (scaling applied).
    pub fn set_float(&mut self, x: f64, y: f64) {
        let px = (x * self.scale_x).round() as i64;
        let py = (y * self.scale_y).round() as i64;
        self.set_pixel(px, py);
    }

    /// Draws a line in logical coordinates using Bresenham's algorithm.
    pub fn draw_line(&mut self, p1: Point, p2: Point) {
        let mut x1 = (p1.x * self.scale_x).round() as i64;
        let mut y1 = (p1.y * self.scale_y).round() as i64;
        let x2 = (p2.x * self.scale_x).round() as i64;
        let y2 = (p2.y * self.scale_y).round() as i64;

        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        let sx = if x1 > x2 { -1 } else { 1 };
        let sy = if y1 > y2 { -1 } else { 1 };
        let mut err = dx - dy;

        loop {
            self.set_pixel(x1, y1);
            if x1 == x2 && y1 == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x1 += sx;
            }
            if e2 < dx {
                err += dx;
                y1 += sy;
            }
        }
    }

    /// Draws a polygon in logical coordinates; when `filled`, the interior
    /// is filled with a scanline pass before the outline.
    pub fn draw_polygon(&mut self, points: &[Point], filled: bool) {
        if points.len() < 3 {
            return;
        }

        if filled {
            self.fill_polygon(points);
        }

        for i in 0..points.len() {
            self.draw_line(points[i], points[(i + 1) % points.len()]);
        }
    }

    fn fill_polygon(&mut self, points: &[Point]) {
        let mut scaled = std::mem::take(&mut self.scaled_buf);
        scaled.clear();
        scaled.extend(points.iter().map(|p| Point {
            x: p.x * self.scale_x,
            y: p.y * self.scale_y,
        }));

        let mut min_y = scaled[0].y;
        let mut max_y = scaled[0].y;
        for p in &scaled {
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let mut intersections = std::mem::take(&mut self.intersection_buf);
        let n = scaled.len();

        for y in (min_y.floor() as i64)..=(max_y.ceil() as i64) {
            let scan_y = y as f64 + 0.5; // sample at pixel center
            intersections.clear();

            for i in 0..n {
                let p1 = scaled[i];
                let p2 = scaled[(i + 1) % n];
                if (p1.y <= scan_y && p2.y > scan_y) || (p2.y <= scan_y && p1.y > scan_y) {
                    let t = (scan_y - p1.y) / (p2.y - p1.y);
                    intersections.push(p1.x + t * (p2.x - p1.x));
                }
            }

            intersections.sort_by(f64::total_cmp);

            for pair in intersections.chunks_exact(2) {
                let x_start = pair[0].ceil() as i64;
                let x_end = pair[1].floor() as i64;
                for x in x_start..=x_end {
                    self.set_pixel(x, y);
                }
            }
        }

        self.scaled_buf = scaled;
        self.intersection_buf = intersections;
    }

    /// Marks `len` cells starting at the 1-based canvas position as
    /// overwritten by a text overlay. The next render re-emits them with
    /// their canonical canvas glyph.
    pub fn mark_text_dirty(&mut self, col: usize, row: usize, len: usize) {
        if row < 1 || row > self.term_height || col < 1 {
            return;
        }
        let row_offset = (row - 1) * self.term_width;
        let end = (col - 1 + len).min(self.term_width);
        for c in (col - 1)..end {
            self.cells[row_offset + c] |= DIRTY_BIT;
        }
    }

    /// Diff-renders the canvas into the chunk writer: for every cell whose
    /// composited state differs from what the terminal last received (or
    /// whose dirty bit is set, or unconditionally after
    /// [`Canvas::force_redraw`]) emit a cursor move plus the glyph.
    pub fn render(&mut self, out: &mut ChunkWriter) {
        for row in 0..self.term_height {
            let top_offset = row * 2 * self.term_width;
            let bottom_offset = top_offset + self.term_width;
            let cell_offset = row * self.term_width;

            for col in 0..self.term_width {
                let top = self.pixels[top_offset + col];
                let bottom = self.pixels[bottom_offset + col];
                let state = match (top, bottom) {
                    (false, false) => CELL_EMPTY,
                    (true, false) => CELL_UPPER,
                    (false, true) => CELL_LOWER,
                    (true, true) => CELL_FULL,
                };

                let prev = self.cells[cell_offset + col];
                if !self.force_redraw && prev & STATE_MASK == state && prev & DIRTY_BIT == 0 {
                    continue;
                }

                out.move_cursor(col + 1, row + 1);
                out.push_char(cell_glyph(state));
                self.cells[cell_offset + col] = state;
            }
        }
        self.force_redraw = false;
    }

    /// Paints a box around the render area when the terminal exceeds the
    /// max render resolution: horizontal bars where there is a vertical
    /// offset, vertical bars where there is a horizontal offset, corners
    /// when both.
    pub fn render_border(&mut self, out: &mut ChunkWriter) {
        let has_h = self.offset_col >= 1;
        let has_v = self.offset_row >= 1;
        if !has_h && !has_v {
            return;
        }

        let left = self.offset_col;
        let right = self.offset_col + self.term_width + 1;
        let top = self.offset_row;
        let bottom = self.offset_row + self.term_height + 1;

        if has_v {
            out.move_cursor_abs(if has_h { left } else { self.offset_col + 1 }, top);
            if has_h {
                out.push_char(BOX_TOP_LEFT);
            }
            for _ in 0..self.term_width {
                out.push_char(BOX_HORIZONTAL);
            }
            if has_h {
                out.push_char(BOX_TOP_RIGHT);
            }

            out.move_cursor_abs(if has_h { left } else { self.offset_col + 1 }, bottom);
            if has_h {
                out.push_char(BOX_BOTTOM_LEFT);
            }
            for _ in 0..self.term_width {
                out.push_char(BOX_HORIZONTAL);
            }
            if has_h {
                out.push_char(BOX_BOTTOM_RIGHT);
            }
        }

        if has_h {
            let (start_row, end_row) = if has_v {
                (top + 1, bottom)
            } else {
                (self.offset_row + 1, self.offset_row + self.term_height + 1)
            };
            for row in start_row..end_row {
                out.move_cursor_abs(left, row);
                out.push_char(BOX_VERTICAL);
                out.move_cursor_abs(right, row);
                out.push_char(BOX_VERTICAL);
            }
        }
    }

    /// Converts logical coordinates to a 1-based terminal position, for
    /// placing text overlays next to canvas-drawn objects. May return
    /// out-of-range values for off-screen positions; callers clamp.
    pub fn logical_to_terminal(&self, x: f64, y: f64) -> (i64, i64) {
        let px = (x * self.scale_x).round() as i64;
        let py = (y * self.scale_y).round() as i64;
        (px + 1, py.div_euclid(2) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(canvas: &mut Canvas) -> String {
        let mut cw = ChunkWriter::new(canvas.offset_col(), canvas.offset_row());
        canvas.render(&mut cw);
        cw.contents().to_string()
    }

    #[test]
    fn test_half_block_composition() {
        let mut canvas = Canvas::new(4, 2, 4.0, 4.0); // 1:1 scaling

        canvas.set_float(0.0, 0.0); // top pixel only
        canvas.set_float(1.0, 1.0); // bottom pixel only
        canvas.set_float(2.0, 0.0); // both pixels
        canvas.set_float(2.0, 1.0);

        let out = rendered(&mut canvas);
        assert_eq!(out, "\x1b[1;1H▀\x1b[1;2H▄\x1b[1;3H█");
    }

    #[test]
    fn test_render_is_differential() {
        let mut canvas = Canvas::new(4, 2, 4.0, 4.0);
        canvas.set_float(0.0, 0.0);
        assert!(!rendered(&mut canvas).is_empty());

        // Same frame content again: nothing to transmit.
        canvas.clear();
        canvas.set_float(0.0, 0.0);
        assert_eq!(rendered(&mut canvas), "");

        // Pixel gone: the cell is erased with a space.
        canvas.clear();
        assert_eq!(rendered(&mut canvas), "\x1b[1;1H ");
    }

    #[test]
    fn test_force_redraw_emits_every_cell() {
        let mut canvas = Canvas::new(3, 2, 3.0, 4.0);
        rendered(&mut canvas);

        canvas.force_redraw();
        let out = rendered(&mut canvas);
        assert_eq!(out.matches('\x1b').count(), 6);

        // One-shot: the next render diffs again.
        assert_eq!(rendered(&mut canvas), "");
    }

    #[test]
    fn test_dirty_cells_are_restored() {
        let mut canvas = Canvas::new(4, 2, 4.0, 4.0);
        canvas.set_float(1.0, 0.0);
        rendered(&mut canvas);

        // A text overlay stomped on cells 1..=2 of row 1.
        canvas.mark_text_dirty(1, 1, 2);
        canvas.clear();
        canvas.set_float(1.0, 0.0);
        let out = rendered(&mut canvas);
        assert_eq!(out, "\x1b[1;1H \x1b[1;2H▀");
    }

    #[test]
    fn test_scaling_maps_logical_to_pixels() {
        // 120x80 logical view on a 60x20 cell terminal: scale 0.5 both ways.
        let mut canvas = Canvas::new(60, 20, 120.0, 80.0);
        canvas.set_float(119.0, 79.0);

        let out = rendered(&mut canvas);
        // Pixel (60, 40) is clipped (just out of range); (59.5 -> 60) rounds
        // off the right edge, so use an in-range point instead.
        assert_eq!(out, "");

        canvas.set_float(118.0, 78.0); // pixel (59, 39): col 60, row 20, lower half
        let out = rendered(&mut canvas);
        assert_eq!(out, "\x1b[20;60H▄");
    }

    #[test]
    fn test_draw_line_horizontal() {
        let mut canvas = Canvas::new(5, 1, 5.0, 2.0);
        canvas.draw_line(Point { x: 0.0, y: 0.0 }, Point { x: 4.0, y: 0.0 });

        let out = rendered(&mut canvas);
        assert_eq!(out.matches('▀').count(), 5);
    }

    #[test]
    fn test_draw_polygon_fills_interior() {
        let mut canvas = Canvas::new(8, 4, 8.0, 8.0);
        let square = [
            Point { x: 1.0, y: 1.0 },
            Point { x: 6.0, y: 1.0 },
            Point { x: 6.0, y: 6.0 },
            Point { x: 1.0, y: 6.0 },
        ];
        canvas.draw_polygon(&square, true);

        // An interior pixel well away from the outline must be set.
        assert!(canvas.pixels[3 * 8 + 3]);
    }

    #[test]
    fn test_degenerate_polygon_is_ignored() {
        let mut canvas = Canvas::new(4, 2, 4.0, 4.0);
        canvas.draw_polygon(&[Point { x: 0.0, y: 0.0 }, Point { x: 3.0, y: 3.0 }], true);
        assert_eq!(rendered(&mut canvas), "");
    }

    #[test]
    fn test_zero_size_terminal_is_noop() {
        let mut canvas = Canvas::new(0, 0, 120.0, 80.0);
        canvas.set_float(10.0, 10.0);
        canvas.draw_line(Point { x: 0.0, y: 0.0 }, Point { x: 5.0, y: 5.0 });
        assert_eq!(rendered(&mut canvas), "");

        let mut cw = ChunkWriter::new(0, 0);
        canvas.render_border(&mut cw);
        assert!(cw.is_empty());
    }

    #[test]
    fn test_resize_changes_dimensions() {
        let mut canvas = Canvas::new(10, 5, 120.0, 80.0);
        canvas.resize(20, 10);
        assert_eq!(canvas.term_width(), 20);
        assert_eq!(canvas.term_height(), 10);
        assert_eq!(canvas.pixels.len(), 20 * 20);
    }

    #[test]
    fn test_border_drawn_only_with_offset() {
        let mut canvas = Canvas::new(4, 2, 4.0, 4.0);
        let mut cw = ChunkWriter::new(0, 0);
        canvas.render_border(&mut cw);
        assert!(cw.is_empty());

        canvas.set_offset(2, 1);
        let mut cw = ChunkWriter::new(2, 1);
        canvas.render_border(&mut cw);
        let out = cw.contents();
        assert!(out.contains('┌'));
        assert!(out.contains('┘'));
        assert!(out.contains('│'));
        // Top border sits just above/left of the canvas area.
        assert!(out.contains("\x1b[1;2H┌"));
    }

    #[test]
    fn test_logical_to_terminal() {
        let canvas = Canvas::new(60, 20, 120.0, 80.0);
        let (col, row) = canvas.logical_to_terminal(60.0, 40.0);
        assert_eq!((col, row), (31, 11));

        let (col, _) = canvas.logical_to_terminal(-20.0, 0.0);
        assert!(col < 1);
    }
}
