use crate::geom::{wrap_angle, Point3};
use crate::model::{InputState, Rules};
use crate::terrain::Terrain;

/// First-person camera. The height is always derived from the terrain
/// under the player, never integrated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Player {
    position: Point3,
    azimuth: f64,
}

impl Player {
    /// Facing +y, standing on the terrain at (x, y).
    pub(crate) fn spawn(x: f64, y: f64, terrain: &Terrain) -> Self {
        let mut p = Self {
            position: Point3::new(x, y, 0.0),
            azimuth: 0.0,
        };
        p.settle(terrain);
        p
    }

    pub(crate) fn position(&self) -> Point3 {
        self.position
    }

    /// Facing angle in (-π, π]; 0 looks along +y, π/2 along +x.
    pub(crate) fn azimuth(&self) -> f64 {
        self.azimuth
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, x: f64, y: f64, terrain: &Terrain) {
        self.position.x = x;
        self.position.y = y;
        self.settle(terrain);
    }

    pub(crate) fn face(&mut self, azimuth: f64) {
        self.azimuth = wrap_angle(azimuth);
    }

    /// Applies one frame of held controls. Turning is `turn_rate` rad/s,
    /// walking follows the current facing; both directions may be held.
    pub(crate) fn advance(&mut self, input: &InputState, dt: f64, rules: &Rules, terrain: &Terrain) {
        if input.rotate_right {
            self.face(self.azimuth + rules.turn_rate * dt);
        }
        if input.rotate_left {
            self.face(self.azimuth - rules.turn_rate * dt);
        }
        if input.forward {
            self.walk(rules.forward_rate * dt, terrain);
        }
        if input.backward {
            self.walk(-rules.backward_rate * dt, terrain);
        }
    }

    fn walk(&mut self, step: f64, terrain: &Terrain) {
        self.position.x += step * self.azimuth.sin();
        self.position.y += step * self.azimuth.cos();
        self.settle(terrain);
    }

    fn settle(&mut self, terrain: &Terrain) {
        self.position.z = terrain.height_at(self.position.x, self.position.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Mountain, TerrainParams};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn single_peak() -> Terrain {
        Terrain::from_mountains(
            vec![Mountain {
                apex: Point3::new(0.0, 5.0, 4.0),
                flower: None,
            }],
            15.0,
        )
    }

    fn held(f: impl FnOnce(&mut InputState)) -> InputState {
        let mut input = InputState::default();
        f(&mut input);
        input
    }

    #[test]
    fn spawn_sits_on_surface() {
        let t = single_peak();
        let p = Player::spawn(0.0, 0.0, &t);
        assert_eq!(p.position().z, t.height_at(0.0, 0.0));
        assert_eq!(p.azimuth(), 0.0);
    }

    #[test]
    fn forward_is_faster_than_backward() {
        let t = single_peak();
        let rules = Rules::default();
        let mut p = Player::spawn(0.0, 0.0, &t);
        p.advance(&held(|i| i.forward = true), 1.0, &rules, &t);
        assert!((p.position().y - 1.25).abs() < 1e-12);
        assert!(p.position().x.abs() < 1e-12);
        p.advance(&held(|i| i.backward = true), 1.0, &rules, &t);
        assert!((p.position().y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn azimuth_zero_walks_north_and_half_pi_walks_east() {
        let t = single_peak();
        let rules = Rules::default();
        let mut p = Player::spawn(0.0, 0.0, &t);
        p.face(PI / 2.0);
        p.advance(&held(|i| i.forward = true), 0.8, &rules, &t);
        assert!((p.position().x - 1.0).abs() < 1e-12);
        assert!(p.position().y.abs() < 1e-12);
    }

    #[test]
    fn inputs_combine_within_one_frame() {
        let t = single_peak();
        let rules = Rules::default();
        let mut p = Player::spawn(0.0, 0.0, &t);
        let all = held(|i| {
            i.rotate_left = true;
            i.rotate_right = true;
            i.forward = true;
            i.backward = true;
        });
        p.advance(&all, 0.5, &rules, &t);
        assert!(p.azimuth().abs() < 1e-12);
        assert!((p.position().y - 0.125).abs() < 1e-12);
    }

    #[test]
    fn azimuth_wraps_under_random_rotation() {
        let t = single_peak();
        let rules = Rules::default();
        let mut p = Player::spawn(0.0, 0.0, &t);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5000 {
            let input = InputState {
                rotate_left: rng.gen_bool(0.5),
                rotate_right: rng.gen_bool(0.3),
                ..InputState::default()
            };
            p.advance(&input, rng.gen_range(0.0..0.5), &rules, &t);
            assert!(p.azimuth() > -PI && p.azimuth() <= PI, "{}", p.azimuth());
        }
    }

    #[test]
    fn height_tracks_terrain_after_every_move() {
        let mut rng = StdRng::seed_from_u64(5);
        let t = Terrain::generate(&TerrainParams::default(), &mut rng).unwrap();
        let rules = Rules::default();
        let mut p = Player::spawn(0.0, 0.0, &t);
        for _ in 0..2000 {
            let input = InputState {
                rotate_left: rng.gen_bool(0.2),
                rotate_right: rng.gen_bool(0.2),
                forward: rng.gen_bool(0.6),
                backward: rng.gen_bool(0.2),
                pick: false,
            };
            p.advance(&input, 0.02, &rules, &t);
            let pos = p.position();
            assert_eq!(pos.z, t.height_at(pos.x, pos.y));
        }
    }
}
