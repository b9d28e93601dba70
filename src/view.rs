use crate::geom::{wrap_angle, Affine, Point3};
use crate::hud;
use crate::model::GameState;
use crate::scene::{Rgb, Scene};
use crate::silhouette::mountain_silhouette;
use crate::sim::range_and_bearing;

/// Fog falls off as exp(-FOG_DENSITY · d / map_radius).
const FOG_DENSITY: f64 = 0.8;

/// Flowers closer than this are drawn as if they were this far away.
const FLOWER_NEAR_CLAMP: f64 = 0.75;
const FLOWER_SCALE: f64 = 0.5;
/// Glyph lift above the crest, in glyph radii.
const FLOWER_LIFT: f64 = 1.25;

/// Logical screen geometry. View space is (relative azimuth, elevation) with
/// up positive; the screen has y growing downward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) x0: i32,
    pub(crate) y0: i32,
    pub(crate) xscale: i32,
    pub(crate) yscale: i32,
}

impl Viewport {
    /// Horizon slightly below centre; ±1 radian and ±1 elevation fill 90%
    /// of the half-width and of the space above the horizon.
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let x0 = (width / 2) as i32;
        let y0 = (height as f64 * 0.55) as i32;
        Self {
            width,
            height,
            x0,
            y0,
            xscale: (x0 as f64 * 0.9) as i32,
            yscale: (y0 as f64 * 0.9) as i32,
        }
    }

    pub(crate) fn full() -> Self {
        Self::new(1280, 720)
    }

    pub(crate) fn demo() -> Self {
        Self::new(640, 360)
    }

    pub(crate) fn transform(&self) -> Affine {
        Affine::new(
            self.xscale as f64,
            0.0,
            0.0,
            -self.yscale as f64,
            self.x0 as f64,
            self.y0 as f64,
        )
    }

    pub(crate) fn aspect(&self) -> f64 {
        self.yscale as f64 / self.xscale as f64
    }
}

/// A mountain apex as seen from the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MountainView {
    pub(crate) distance: f64,
    /// Bearing relative to the facing, in (-π, π].
    pub(crate) relative_azimuth: f64,
    /// Slope dz/d clamped to [-1, 1]; -1 straight underfoot.
    pub(crate) elevation: f64,
    /// Gray level for the fill, 1 at the camera.
    pub(crate) fog: f64,
}

pub(crate) fn view_of(eye: Point3, azimuth: f64, apex: Point3, map_radius: f64) -> MountainView {
    let (distance, bearing) = range_and_bearing(eye, apex, azimuth);
    let elevation = if distance > 0.0 {
        ((apex.z - eye.z) / distance).clamp(-1.0, 1.0)
    } else {
        -1.0
    };
    MountainView {
        distance,
        relative_azimuth: wrap_angle(bearing - azimuth),
        elevation,
        fog: (-distance * FOG_DENSITY / map_radius).exp(),
    }
}

/// Mountain indices, farthest first.
pub(crate) fn draw_order(state: &GameState) -> Vec<usize> {
    let eye = state.player.position();
    let mountains = &state.terrain.mountains;
    let mut order: Vec<usize> = (0..mountains.len()).collect();
    order.sort_by(|&a, &b| {
        let da = mountains[a].apex.horizontal_distance_sq(eye);
        let db = mountains[b].apex.horizontal_distance_sq(eye);
        db.total_cmp(&da)
    });
    order
}

pub(crate) fn render_scene(state: &GameState, vp: &Viewport, with_hud: bool) -> Scene {
    let mut scene = Scene::new(vp.width, vp.height, Rgb::BLACK);
    draw_world(&mut scene, state, vp);
    if with_hud {
        hud::draw_hud(&mut scene, state, vp);
    }
    scene
}

fn draw_world(scene: &mut Scene, state: &GameState, vp: &Viewport) {
    let eye = state.player.position();
    let azimuth = state.player.azimuth();
    let radius = state.terrain.map_radius();
    let view = vp.transform();

    for idx in draw_order(state) {
        let m = &state.terrain.mountains[idx];
        let mv = view_of(eye, azimuth, m.apex, radius);

        let placed = view.translated(mv.relative_azimuth, 0.0);
        let outline = mountain_silhouette(mv.elevation.acos()).to_shape();
        scene.fill(outline.transformed(placed), Rgb::gray(mv.fog));

        let Some(species) = m.flower else {
            continue;
        };
        let d = mv.distance.max(FLOWER_NEAR_CLAMP);
        let at_crest = placed
            .translated(0.0, mv.elevation)
            .scaled(FLOWER_SCALE * vp.aspect() / d, FLOWER_SCALE / d)
            .translated(0.0, FLOWER_LIFT);
        let glyph = species.glyph().transformed(at_crest);
        scene.fill(glyph.clone(), species.color());
        if state.is_pickable(idx) {
            scene.stroke(glyph, Rgb::WHITE);
        }
    }
}
