/// Vision overlay: a darkening mask with a cutout around the player.
///
/// The mask is computed in viewport cell coordinates each frame (camera and
/// player move every frame) into a persistent buffer, so no per-frame
/// allocation once the viewport size settles. The renderer then dims every
/// cell the mask does not light — the terminal equivalent of painting a dim
/// layer and erasing a wedge out of it.

use crate::domain::state::Facing;

pub struct VisionMask {
    w: usize,
    h: usize,
    lit: Vec<bool>,
}

impl VisionMask {
    pub fn new() -> Self {
        VisionMask { w: 0, h: 0, lit: Vec::new() }
    }

    /// Recompute for a `view_w × view_h` viewport.
    ///
    /// `player` is the player's viewport cell. `radius` is in cells,
    /// `span` the full wedge angle in radians (≥ 2π means a full circle).
    /// With no player the whole viewport stays dim.
    pub fn recompute(
        &mut self,
        view_w: usize,
        view_h: usize,
        player: Option<(usize, usize)>,
        radius: f32,
        span: f32,
        facing: Facing,
    ) {
        if self.w != view_w || self.h != view_h {
            self.w = view_w;
            self.h = view_h;
            self.lit.resize(view_w * view_h, false);
        }
        self.lit.fill(false);

        let (px, py) = match player {
            Some(p) => p,
            None => return, // uniform dim
        };
        let full_circle = span >= std::f32::consts::TAU;
        let heading = facing.angle();

        for y in 0..view_h {
            for x in 0..view_w {
                let dx = x as f32 - px as f32;
                let dy = y as f32 - py as f32;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                // Own cell is always lit; atan2(0,0) is meaningless there.
                if !full_circle && (dx != 0.0 || dy != 0.0) {
                    let mut delta = dy.atan2(dx) - heading;
                    while delta > std::f32::consts::PI {
                        delta -= std::f32::consts::TAU;
                    }
                    while delta < -std::f32::consts::PI {
                        delta += std::f32::consts::TAU;
                    }
                    if delta.abs() > span / 2.0 {
                        continue;
                    }
                }
                self.lit[y * view_w + x] = true;
            }
        }
    }

    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        x < self.w && y < self.h && self.lit[y * self.w + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAU: f32 = std::f32::consts::TAU;

    #[test]
    fn no_player_means_all_dim() {
        let mut m = VisionMask::new();
        m.recompute(8, 6, None, 4.0, TAU, Facing::Up);
        for y in 0..6 {
            for x in 0..8 {
                assert!(!m.is_lit(x, y));
            }
        }
    }

    #[test]
    fn full_circle_lights_disk() {
        let mut m = VisionMask::new();
        m.recompute(11, 11, Some((5, 5)), 3.0, TAU, Facing::Up);
        assert!(m.is_lit(5, 5));
        assert!(m.is_lit(8, 5)); // distance 3, on the rim
        assert!(!m.is_lit(9, 5)); // distance 4
        assert!(!m.is_lit(0, 0));
    }

    #[test]
    fn wedge_respects_facing() {
        let mut m = VisionMask::new();
        // 90° cone facing right: cells straight right lit, straight left not.
        m.recompute(11, 11, Some((5, 5)), 4.0, std::f32::consts::FRAC_PI_2, Facing::Right);
        assert!(m.is_lit(5, 5)); // own cell always lit
        assert!(m.is_lit(8, 5));
        assert!(!m.is_lit(2, 5));
        assert!(!m.is_lit(5, 2)); // straight up is outside a right-facing cone
    }

    #[test]
    fn wedge_wraps_across_pi() {
        let mut m = VisionMask::new();
        // Facing left: heading π; cells at angle −π must still fall inside.
        m.recompute(11, 11, Some((5, 5)), 4.0, std::f32::consts::FRAC_PI_2, Facing::Left);
        assert!(m.is_lit(2, 5));
        assert!(!m.is_lit(8, 5));
    }

    #[test]
    fn resize_reuses_buffer() {
        let mut m = VisionMask::new();
        m.recompute(4, 4, Some((1, 1)), 1.0, TAU, Facing::Up);
        m.recompute(6, 3, Some((0, 0)), 1.0, TAU, Facing::Up);
        assert!(m.is_lit(0, 0));
        assert!(!m.is_lit(5, 2));
        // Out-of-range queries are just dim, never a panic.
        assert!(!m.is_lit(40, 40));
    }
}
