use crate::flower::Species;
use crate::geom::Point3;
use crate::model::{GameState, InputState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PickOutcome {
    /// The flower paired with one already carried; both are spent.
    Matched { mountain: usize, species: Species },
    /// The flower went into an empty inventory slot.
    Banked {
        mountain: usize,
        slot: usize,
        species: Species,
    },
    Nothing,
}

/// Horizontal distance and bearing (atan2(dx, dy), 0 = +y) from `from` to `to`.
/// The bearing falls back to `facing` when the points coincide.
pub(crate) fn range_and_bearing(from: Point3, to: Point3, facing: f64) -> (f64, f64) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let d = dx.hypot(dy);
    let bearing = if d > 0.0 { dx.atan2(dy) } else { facing };
    (d, bearing)
}

impl GameState {
    /// Whether the flower on mountain `idx` can be picked this frame.
    pub(crate) fn is_pickable(&self, idx: usize) -> bool {
        let Some(m) = self.terrain.mountains.get(idx) else {
            return false;
        };
        let Some(species) = m.flower else {
            return false;
        };

        // no free slot and nothing to pair it with
        if self.inventory.iter().all(|s| s.is_some_and(|held| held != species)) {
            return false;
        }

        let az = self.player.azimuth();
        let (d, bearing) = range_and_bearing(self.player.position(), m.apex, az);
        d <= self.rules.reach && (bearing - az).cos() >= self.rules.facing_cos
    }

    /// First pickable mountain in generation order.
    pub(crate) fn pick_target(&self) -> Option<usize> {
        (0..self.terrain.mountains.len()).find(|&i| self.is_pickable(i))
    }

    pub(crate) fn try_pick(&mut self) -> PickOutcome {
        let Some(mountain) = self.pick_target() else {
            return PickOutcome::Nothing;
        };
        let Some(species) = self.terrain.mountains[mountain].flower else {
            return PickOutcome::Nothing;
        };

        let outcome = if let Some(slot) = self.inventory.iter().position(|s| *s == Some(species)) {
            self.inventory[slot] = None;
            self.score += 1;
            PickOutcome::Matched { mountain, species }
        } else if let Some(slot) = self.inventory.iter().position(Option::is_none) {
            self.inventory[slot] = Some(species);
            PickOutcome::Banked {
                mountain,
                slot,
                species,
            }
        } else {
            return PickOutcome::Nothing;
        };

        self.terrain.mountains[mountain].flower = None;
        outcome
    }

    /// One frame: a pending pick is resolved first, then the player moves.
    pub(crate) fn tick(&mut self, dt: f64, input: &InputState) -> PickOutcome {
        let outcome = if input.pick {
            self.try_pick()
        } else {
            PickOutcome::Nothing
        };
        self.player.advance(input, dt, &self.rules, &self.terrain);
        outcome
    }
}
