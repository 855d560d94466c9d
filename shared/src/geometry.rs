//! 2D geometry primitives: points, wrapping world bounds, circle tests and
//! the camera transform that handles the toroidal world edge.

/// A 2D coordinate in logical space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Rectangular dimensions of a coordinate space (world or viewport).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }

    /// Wraps x and y around the bounds (Asteroids-style torus). The result
    /// always lies in `[0, width) x [0, height)` for positive bounds.
    pub fn wrap_position(&self, x: &mut f64, y: &mut f64) {
        if self.width > 0.0 {
            *x %= self.width;
            if *x < 0.0 {
                *x += self.width;
            }
        }
        if self.height > 0.0 {
            *y %= self.height;
            if *y < 0.0 {
                *y += self.height;
            }
        }
    }
}

/// Euclidean distance between two points.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    distance_squared(x1, y1, x2, y2).sqrt()
}

/// Squared distance; use when comparing distances to avoid the sqrt cost.
pub fn distance_squared(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

/// Checks whether a point lies within `radius` of a center position.
pub fn point_in_circle(px: f64, py: f64, cx: f64, cy: f64, radius: f64) -> bool {
    distance_squared(px, py, cx, cy) <= radius * radius
}

/// Checks whether two circles overlap.
pub fn circles_overlap(x1: f64, y1: f64, r1: f64, x2: f64, y2: f64, r2: f64) -> bool {
    let min_dist = r1 + r2;
    distance_squared(x1, y1, x2, y2) < min_dist * min_dist
}

/// The viewport position in world space. The camera position is the center
/// of the view.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
}

/// Up to 4 screen positions for a world-wrapped object. A fixed array keeps
/// the hot rendering path allocation-free.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenPositions {
    positions: [Point; 4],
    count: usize,
}

impl ScreenPositions {
    fn push(&mut self, p: Point) {
        if self.count < 4 {
            self.positions[self.count] = p;
            self.count += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.positions[..self.count].iter().copied()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Margin (in view units) within which off-screen wrapped copies are still
/// emitted, so large objects straddling the edge draw on both sides.
const WRAP_MARGIN: f64 = 10.0;

/// Converts world coordinates to screen coordinates relative to the camera.
/// Emits every wrapped copy of the position that falls inside the view
/// (plus margin), so objects straddling the toroidal edge appear on both
/// sides.
pub fn world_to_screen(
    world_x: f64,
    world_y: f64,
    cam: Camera,
    view: Bounds,
    world: Bounds,
) -> ScreenPositions {
    let mut result = ScreenPositions::default();

    let cam_left = cam.x - view.width / 2.0;
    let cam_top = cam.y - view.height / 2.0;

    let screen_x = world_x - cam_left;
    let screen_y = world_y - cam_top;

    for dx in -1..=1 {
        for dy in -1..=1 {
            let sx = screen_x + f64::from(dx) * world.width;
            let sy = screen_y + f64::from(dy) * world.height;

            if sx >= -WRAP_MARGIN
                && sx <= view.width + WRAP_MARGIN
                && sy >= -WRAP_MARGIN
                && sy <= view.height + WRAP_MARGIN
            {
                result.push(Point { x: sx, y: sy });
            }
        }
    }

    result
}

/// Returns whether an object with remaining protection time should render
/// this frame (blinking effect). Always true once the timer has expired.
pub fn should_render_blink(remaining: f64, frequency: f64) -> bool {
    if remaining <= 0.0 {
        return true;
    }
    let phase = (remaining * frequency) as i64;
    phase % 2 != 0
}
