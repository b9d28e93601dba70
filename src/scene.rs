use crate::geom::Shape;

/// Stroke width used for outlines, in logical pixels.
pub(crate) const OUTLINE_WIDTH: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub(crate) const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub(crate) const GRAY: Rgb = Rgb::new(128, 128, 128);

    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Neutral gray from a 0..1 level.
    pub(crate) fn gray(level: f64) -> Rgb {
        let v = (level.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        Rgb::new(v, v, v)
    }

    pub(crate) fn luma(self) -> f64 {
        (0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64) / 255.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Paint {
    Fill(Rgb),
    Stroke { color: Rgb, width: f64 },
}

#[derive(Clone, Debug)]
pub(crate) struct Item {
    pub(crate) shape: Shape,
    pub(crate) paint: Paint,
}

/// Ordered 2D vector scene in logical screen pixels (y grows downward).
/// Items are painted in order, later items on top.
#[derive(Clone, Debug)]
pub(crate) struct Scene {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) background: Rgb,
    pub(crate) items: Vec<Item>,
}

impl Scene {
    pub(crate) fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            items: Vec::new(),
        }
    }

    pub(crate) fn fill(&mut self, shape: Shape, color: Rgb) {
        self.items.push(Item {
            shape,
            paint: Paint::Fill(color),
        });
    }

    pub(crate) fn stroke(&mut self, shape: Shape, color: Rgb) {
        self.items.push(Item {
            shape,
            paint: Paint::Stroke {
                color,
                width: OUTLINE_WIDTH,
            },
        });
    }
}
