/// Camera: a viewport into the server grid.
///
/// `(x, y)` is the world coordinate of the top-left visible cell,
/// `(view_w, view_h)` how many cells fit; both are recomputed every frame
/// from the terminal size, so the camera carries no state between frames
/// beyond what the caller feeds in.
///
/// The camera centers on the player by subtracting the viewport half
/// extents and clamps so it never shows area outside the grid:
/// `0 ≤ x ≤ max(0, cols − 2·half_w − 1)` and likewise for y.

#[derive(Clone, Debug)]
pub struct Camera {
    pub x: usize,
    pub y: usize,
    pub view_w: usize,
    pub view_h: usize,
}

/// Clamped offset along one axis. Pure; the whole camera is derived data.
pub fn axis_offset(center: Option<usize>, half: usize, dim: usize) -> usize {
    let max = dim.saturating_sub(2 * half + 1);
    match center {
        Some(c) => c.saturating_sub(half).min(max),
        None => 0,
    }
}

impl Camera {
    pub fn new() -> Self {
        Camera { x: 0, y: 0, view_w: 0, view_h: 0 }
    }

    /// Re-center on the player (or the origin when absent) within a
    /// `cols × rows` grid. Call once per frame after view_w/view_h are set.
    pub fn center_on(&mut self, player: Option<(usize, usize)>, cols: usize, rows: usize) {
        let half_w = self.view_w / 2;
        let half_h = self.view_h / 2;
        self.x = axis_offset(player.map(|p| p.0), half_w, cols);
        self.y = axis_offset(player.map(|p| p.1), half_h, rows);
    }

    /// World → viewport coordinate, or None outside the visible rectangle.
    pub fn world_to_view(&self, wx: usize, wy: usize) -> Option<(usize, usize)> {
        if wx >= self.x && wx < self.x + self.view_w && wy >= self.y && wy < self.y + self.view_h
        {
            Some((wx - self.x, wy - self.y))
        } else {
            None
        }
    }

    /// Enumerate visible world cells, clipped to the grid. O(visible tiles).
    pub fn visible_cells(&self, cols: usize, rows: usize) -> impl Iterator<Item = (usize, usize)> {
        let x0 = self.x;
        let y0 = self.y;
        let x1 = (self.x + self.view_w).min(cols);
        let y1 = (self.y + self.view_h).min(rows);
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }
}
