use std::f64::consts::PI;

/// Segments used to flatten each quadratic/cubic curve.
const CURVE_STEPS: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point3 {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) z: f64,
}

impl Point3 {
    pub(crate) fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub(crate) fn horizontal_distance_sq(self, o: Point3) -> f64 {
        let dx = self.x - o.x;
        let dy = self.y - o.y;
        dx * dx + dy * dy
    }

    #[cfg(test)]
    pub(crate) fn horizontal_distance(self, o: Point3) -> f64 {
        self.horizontal_distance_sq(o).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec2 {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Vec2 {
    pub(crate) fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Wraps an angle into (-π, π].
pub(crate) fn wrap_angle(a: f64) -> f64 {
    let r = (a + PI).rem_euclid(2.0 * PI) - PI;
    if r <= -PI {
        r + 2.0 * PI
    } else {
        r
    }
}

/* -----------------------------
   Affine transforms
------------------------------ */

/// 2×3 affine matrix:
/// `x' = m00·x + m01·y + m02`, `y' = m10·x + m11·y + m12`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Affine {
    m00: f64,
    m10: f64,
    m01: f64,
    m11: f64,
    m02: f64,
    m12: f64,
}

impl Affine {
    pub(crate) const fn new(m00: f64, m10: f64, m01: f64, m11: f64, m02: f64, m12: f64) -> Self {
        Self {
            m00,
            m10,
            m01,
            m11,
            m02,
            m12,
        }
    }

    pub(crate) fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub(crate) fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// `self · other`: the result applies `other` first.
    pub(crate) fn concat(self, o: Affine) -> Affine {
        Affine {
            m00: self.m00 * o.m00 + self.m01 * o.m10,
            m10: self.m10 * o.m00 + self.m11 * o.m10,
            m01: self.m00 * o.m01 + self.m01 * o.m11,
            m11: self.m10 * o.m01 + self.m11 * o.m11,
            m02: self.m00 * o.m02 + self.m01 * o.m12 + self.m02,
            m12: self.m10 * o.m02 + self.m11 * o.m12 + self.m12,
        }
    }

    pub(crate) fn translated(self, tx: f64, ty: f64) -> Affine {
        self.concat(Affine::translation(tx, ty))
    }

    pub(crate) fn scaled(self, sx: f64, sy: f64) -> Affine {
        self.concat(Affine::scaling(sx, sy))
    }

    pub(crate) fn apply(self, p: Vec2) -> Vec2 {
        Vec2 {
            x: self.m00 * p.x + self.m01 * p.y + self.m02,
            y: self.m10 * p.x + self.m11 * p.y + self.m12,
        }
    }
}

/* -----------------------------
   Shapes and path flattening
------------------------------ */

pub(crate) type Polygon = Vec<Vec2>;

/// A set of closed rings, filled with the nonzero winding rule.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Shape {
    pub(crate) rings: Vec<Polygon>,
}

impl Shape {
    pub(crate) fn from_polygon(poly: Polygon) -> Self {
        Self { rings: vec![poly] }
    }

    pub(crate) fn transformed(&self, t: Affine) -> Shape {
        Shape {
            rings: self
                .rings
                .iter()
                .map(|ring| ring.iter().map(|&p| t.apply(p)).collect())
                .collect(),
        }
    }

    /// (min, max) corners, or None for an empty shape.
    pub(crate) fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut pts = self.rings.iter().flatten();
        let first = *pts.next()?;
        let (mut lo, mut hi) = (first, first);
        for p in pts {
            lo.x = lo.x.min(p.x);
            lo.y = lo.y.min(p.y);
            hi.x = hi.x.max(p.x);
            hi.y = hi.y.max(p.y);
        }
        Some((lo, hi))
    }
}

#[derive(Default)]
pub(crate) struct PathBuilder {
    rings: Vec<Polygon>,
    current: Polygon,
}

impl PathBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn last(&self) -> Vec2 {
        self.current.last().copied().unwrap_or_default()
    }

    fn flush(&mut self) {
        let ring = std::mem::take(&mut self.current);
        if ring.len() > 2 {
            self.rings.push(ring);
        }
    }

    pub(crate) fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.flush();
        self.current.push(Vec2::new(x, y));
        self
    }

    pub(crate) fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.current.push(Vec2::new(x, y));
        self
    }

    pub(crate) fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        let p0 = self.last();
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let u = 1.0 - t;
            self.current.push(Vec2::new(
                u * u * p0.x + 2.0 * u * t * cx + t * t * x,
                u * u * p0.y + 2.0 * u * t * cy + t * t * y,
            ));
        }
        self
    }

    pub(crate) fn cubic_to(
        &mut self,
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        x: f64,
        y: f64,
    ) -> &mut Self {
        let p0 = self.last();
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let u = 1.0 - t;
            let (b0, b1, b2, b3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            self.current.push(Vec2::new(
                b0 * p0.x + b1 * c1x + b2 * c2x + b3 * x,
                b0 * p0.y + b1 * c1y + b2 * c2y + b3 * y,
            ));
        }
        self
    }

    pub(crate) fn close(&mut self) -> &mut Self {
        self.flush();
        self
    }

    /// Flattened outline of the open ring, without closing it.
    pub(crate) fn outline(&self) -> &[Vec2] {
        &self.current
    }

    pub(crate) fn build(&mut self) -> Shape {
        self.flush();
        Shape {
            rings: std::mem::take(&mut self.rings),
        }
    }
}
