//! Terminal drawing: half-block canvas, chunked ANSI output, glyphs.

mod canvas;
mod chunk;

pub use canvas::Canvas;
pub use chunk::{ChunkWriter, MAX_CHUNK_SIZE};

// Block characters for half-block rendering.
pub const BLOCK_FULL: char = '█';
pub const BLOCK_UPPER_HALF: char = '▀';
pub const BLOCK_LOWER_HALF: char = '▄';
pub const BLOCK_EMPTY: char = ' ';

// Box-drawing characters for the render-area border.
pub const BOX_TOP_LEFT: char = '┌';
pub const BOX_TOP_RIGHT: char = '┐';
pub const BOX_BOTTOM_LEFT: char = '└';
pub const BOX_BOTTOM_RIGHT: char = '┘';
pub const BOX_HORIZONTAL: char = '─';
pub const BOX_VERTICAL: char = '│';

// ANSI control sequences.
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";

// SGR colors used by the minimap.
pub const COLOR_BRIGHT_CYAN: &str = "\x1b[96m";
pub const COLOR_RESET: &str = "\x1b[0m";
