use crate::flower::Species;
use crate::geom::{Affine, PathBuilder, Shape};
use crate::model::GameState;
use crate::scene::{Rgb, Scene};
use crate::view::Viewport;
use std::f64::consts::PI;
use std::sync::OnceLock;

/// Five-pointed star, outer radius 1 and inner radius 0.5, tip up.
pub(crate) fn star() -> &'static Shape {
    static STAR: OnceLock<Shape> = OnceLock::new();
    STAR.get_or_init(|| {
        let mut path = PathBuilder::new();
        path.move_to(0.0, 1.0);
        for i in 0..5 {
            let mid = 2.0 * PI * (i as f64 + 0.5) / 5.0;
            let to = 2.0 * PI * (i as f64 + 1.0) / 5.0;
            path.line_to(0.5 * mid.sin(), 0.5 * mid.cos());
            path.line_to(to.sin(), to.cos());
        }
        path.close().build()
    })
}

/// Square of half-side 1 with quadratic corners through the edge midpoints.
pub(crate) fn slot_frame() -> &'static Shape {
    static FRAME: OnceLock<Shape> = OnceLock::new();
    FRAME.get_or_init(|| {
        let mut path = PathBuilder::new();
        path.move_to(0.0, 1.0)
            .quad_to(1.0, 1.0, 1.0, 0.0)
            .quad_to(1.0, -1.0, 0.0, -1.0)
            .quad_to(-1.0, -1.0, -1.0, 0.0)
            .quad_to(-1.0, 1.0, 0.0, 1.0);
        path.close().build()
    })
}

pub(crate) fn draw_hud(scene: &mut Scene, state: &GameState, vp: &Viewport) {
    draw_score(scene, state.score, state.max_score(), vp);
    draw_inventory(scene, &state.inventory, vp);
}

/// Row of stars along the top-left; earned ones are filled, and all of them
/// take species colours once every pair has been matched.
fn draw_score(scene: &mut Scene, score: u32, max_score: u32, vp: &Viewport) {
    let unit = 0.05 * vp.yscale as f64;
    let mut at = Affine::scaling(unit, -unit).translated(1.5, -1.5);
    for i in 0..max_score {
        let shape = star().transformed(at);
        if score > i {
            let color = if score == max_score {
                Species::cyclic(i as usize).color()
            } else {
                Rgb::WHITE
            };
            scene.fill(shape.clone(), color);
        }
        scene.stroke(shape, Rgb::WHITE);
        at = at.translated(3.0, 0.0);
    }
}

/// Slot frames in the top-right corner with the carried glyph inside.
fn draw_inventory(scene: &mut Scene, inventory: &[Option<Species>], vp: &Viewport) {
    let unit = 0.1 * vp.yscale as f64;
    let right = 22.0 * vp.xscale as f64 / vp.yscale as f64 - 4.0;
    let mut at = Affine::scaling(unit, -unit).translated(right, -1.25);
    for slot in inventory {
        let frame = slot_frame().transformed(at);
        scene.stroke(frame.clone(), Rgb::GRAY);
        scene.fill(frame, Rgb::GRAY);
        if let Some(species) = slot {
            scene.fill(species.glyph().transformed(at), species.color());
        }
        at = at.translated(2.5, 0.0);
    }
}
