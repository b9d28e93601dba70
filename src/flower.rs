use crate::geom::{PathBuilder, Shape};
use crate::scene::Rgb;
use std::f64::consts::PI;
use std::sync::OnceLock;

/// Flower species, one per petal count from 3 to 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Species {
    Green,
    Yellow,
    Orange,
    Cyan,
    Magenta,
}

impl Species {
    pub(crate) const ALL: [Species; 5] = [
        Species::Green,
        Species::Yellow,
        Species::Orange,
        Species::Cyan,
        Species::Magenta,
    ];

    /// Species assigned to the `i`-th placed mountain (and the `i`-th star).
    pub(crate) fn cyclic(i: usize) -> Species {
        Self::ALL[i % Self::ALL.len()]
    }

    fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn petals(self) -> u32 {
        3 + self.index() as u32
    }

    pub(crate) fn color(self) -> Rgb {
        match self {
            Species::Green => Rgb::new(0, 255, 0),
            Species::Yellow => Rgb::new(255, 255, 0),
            Species::Orange => Rgb::new(255, 200, 0),
            Species::Cyan => Rgb::new(0, 255, 255),
            Species::Magenta => Rgb::new(255, 0, 255),
        }
    }

    /// Unit-radius petal glyph, built once per process.
    pub(crate) fn glyph(self) -> &'static Shape {
        static GLYPHS: OnceLock<Vec<Shape>> = OnceLock::new();
        let glyphs =
            GLYPHS.get_or_init(|| Self::ALL.iter().map(|s| petal_glyph(s.petals())).collect());
        &glyphs[self.index()]
    }
}

/// Rosette of `petals` lobes: each lobe leaves the rim, dips to the centre
/// and returns along a quadratic curve bent toward the lobe's mid-angle.
pub(crate) fn petal_glyph(petals: u32) -> Shape {
    let n = petals.max(1) as f64;
    let mut path = PathBuilder::new();
    path.move_to(0.0, 1.0);
    for j in 0..petals {
        let mid = 2.0 * PI * (j as f64 + 0.5) / n;
        let to = 2.0 * PI * (j as f64 + 1.0) / n;
        let (cx, cy) = (0.7 * mid.sin(), 0.7 * mid.cos());
        path.quad_to(cx, cy, 0.0, 0.0);
        path.quad_to(cx, cy, to.sin(), to.cos());
    }
    path.close();
    path.build()
}
