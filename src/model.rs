use crate::flower::Species;
use crate::player::Player;
use crate::terrain::Terrain;

/// Snapshot of the controls for one tick. Movement flags are level-triggered;
/// `pick` is set only on the tick that follows a fresh key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct InputState {
    pub(crate) rotate_left: bool,
    pub(crate) rotate_right: bool,
    pub(crate) forward: bool,
    pub(crate) backward: bool,
    pub(crate) pick: bool,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Rules {
    pub(crate) forward_rate: f64, // units/s
    pub(crate) backward_rate: f64,
    pub(crate) turn_rate: f64, // rad/s
    pub(crate) reach: f64,     // max horizontal pickup distance
    pub(crate) facing_cos: f64, // min cos(bearing - azimuth) to pick
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            forward_rate: 1.25,
            backward_rate: 1.0,
            turn_rate: 1.0,
            reach: 0.85,
            facing_cos: 0.75,
        }
    }
}

impl Rules {
    /// Terrain-only walk: both directions at the same pace.
    pub(crate) fn demo() -> Self {
        Self {
            forward_rate: 1.0,
            ..Self::default()
        }
    }
}

pub(crate) const INVENTORY_SLOTS: usize = 2;

pub(crate) type Inventory = [Option<Species>; INVENTORY_SLOTS];

pub(crate) struct GameState {
    pub(crate) terrain: Terrain,
    pub(crate) player: Player,
    pub(crate) inventory: Inventory,
    pub(crate) score: u32,
    pub(crate) rules: Rules,
}

impl GameState {
    /// Starts at the map origin facing +y with an empty inventory.
    pub(crate) fn new(terrain: Terrain, rules: Rules) -> Self {
        let player = Player::spawn(0.0, 0.0, &terrain);
        Self {
            terrain,
            player,
            inventory: [None; INVENTORY_SLOTS],
            score: 0,
            rules,
        }
    }

    /// One star per pair that can possibly be matched.
    pub(crate) fn max_score(&self) -> u32 {
        (self.terrain.mountains.len() / 2) as u32
    }
}
