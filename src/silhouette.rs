//! Mountain outlines from a cosine template, with no 3D projection.
//!
//! A cone seen from the player spans a lens of view-space angle whose shape
//! depends only on `cone_angle = acos(elevation)`. The lens is the overlap of
//! two copies of a periodic cosine band shifted by `±cone_angle`, trimmed by a
//! mask that cuts the band at `±π` so neighbouring periods do not merge.
//!
//! Every region involved lies between a flat floor and an upper profile, so
//! area intersection reduces to the lower envelope of the profiles.

use crate::geom::{PathBuilder, Shape, Vec2};
use std::f64::consts::PI;
use std::sync::OnceLock;

/// Bottom edge of the template band, in view units.
pub(crate) const TEMPLATE_FLOOR: f64 = -2.0;

/// Pulls the Bézier handles outward so a half-period tracks cos(x) closely.
const COS_CORRECTION: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Seg {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Seg {
    fn at(&self, x: f64) -> f64 {
        if self.x1 == self.x0 {
            return self.y0;
        }
        self.y0 + (self.y1 - self.y0) * (x - self.x0) / (self.x1 - self.x0)
    }
}

/// Region between a constant floor and a piecewise-linear upper profile.
/// Segments are sorted and contiguous in x; the profile may step vertically
/// where one segment ends and the next begins.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Skyline {
    floor: f64,
    segs: Vec<Seg>,
}

impl Skyline {
    /// From an outline whose x never decreases; repeated x values are steps.
    pub(crate) fn from_outline(floor: f64, pts: &[Vec2]) -> Self {
        let segs = pts
            .windows(2)
            .filter(|w| w[1].x > w[0].x)
            .map(|w| Seg {
                x0: w[0].x,
                y0: w[0].y,
                x1: w[1].x,
                y1: w[1].y,
            })
            .collect();
        Self { floor, segs }
    }

    /// From flat pieces `(x_start, x_end, top)`; empty pieces are skipped.
    pub(crate) fn from_steps(floor: f64, steps: &[(f64, f64, f64)]) -> Self {
        let segs = steps
            .iter()
            .filter(|(x0, x1, _)| x1 > x0)
            .map(|&(x0, x1, y)| Seg {
                x0,
                y0: y,
                x1,
                y1: y,
            })
            .collect();
        Self { floor, segs }
    }

    pub(crate) fn shifted(&self, dx: f64) -> Skyline {
        Skyline {
            floor: self.floor,
            segs: self
                .segs
                .iter()
                .map(|s| Seg {
                    x0: s.x0 + dx,
                    x1: s.x1 + dx,
                    ..*s
                })
                .collect(),
        }
    }

    pub(crate) fn span(&self) -> Option<(f64, f64)> {
        Some((self.segs.first()?.x0, self.segs.last()?.x1))
    }

    /// Upper edge at `x`, clamped to the floor. At a step the right-hand
    /// piece wins.
    #[cfg(test)]
    pub(crate) fn top_at(&self, x: f64) -> Option<f64> {
        let (lo, hi) = self.span()?;
        if x < lo || x > hi {
            return None;
        }
        let seg = self
            .segs
            .iter()
            .find(|s| x < s.x1)
            .or(self.segs.last())?;
        Some(seg.at(x).max(self.floor))
    }

    /// Area intersection: common x range, higher floor, lower envelope of the
    /// two profiles (with exact crossing points).
    pub(crate) fn intersect(&self, other: &Skyline) -> Skyline {
        let floor = self.floor.max(other.floor);
        let empty = Skyline {
            floor,
            segs: Vec::new(),
        };
        let (Some((a0, a1)), Some((b0, b1))) = (self.span(), other.span()) else {
            return empty;
        };
        let (lo, hi) = (a0.max(b0), a1.min(b1));
        if hi <= lo {
            return empty;
        }

        let mut xs: Vec<f64> = self
            .segs
            .iter()
            .chain(&other.segs)
            .flat_map(|s| [s.x0, s.x1])
            .filter(|&x| x > lo && x < hi)
            .collect();
        xs.push(lo);
        xs.push(hi);
        xs.sort_by(f64::total_cmp);
        xs.dedup();

        let mut segs = Vec::with_capacity(xs.len() + 8);
        let (mut ia, mut ib) = (0, 0);
        for w in xs.windows(2) {
            let (u, v) = (w[0], w[1]);
            let mid = 0.5 * (u + v);
            while ia + 1 < self.segs.len() && self.segs[ia].x1 <= mid {
                ia += 1;
            }
            while ib + 1 < other.segs.len() && other.segs[ib].x1 <= mid {
                ib += 1;
            }
            let (sa, sb) = (self.segs[ia], other.segs[ib]);
            let (au, av) = (sa.at(u), sa.at(v));
            let (bu, bv) = (sb.at(u), sb.at(v));
            let (du, dv) = (au - bu, av - bv);

            if (du < 0.0 && dv > 0.0) || (du > 0.0 && dv < 0.0) {
                let t = du / (du - dv);
                let xc = u + (v - u) * t;
                let yc = au + (av - au) * t;
                segs.push(Seg {
                    x0: u,
                    y0: au.min(bu),
                    x1: xc,
                    y1: yc,
                });
                segs.push(Seg {
                    x0: xc,
                    y0: yc,
                    x1: v,
                    y1: av.min(bv),
                });
            } else {
                segs.push(Seg {
                    x0: u,
                    y0: au.min(bu),
                    x1: v,
                    y1: av.min(bv),
                });
            }
        }

        Skyline { floor, segs }
    }

    /// Closed outline: down the left edge, along the floor, up the right edge
    /// and back over the profile.
    pub(crate) fn to_shape(&self) -> Shape {
        let Some((lo, hi)) = self.span() else {
            return Shape::default();
        };
        let mut ring: Vec<Vec2> = Vec::with_capacity(self.segs.len() * 2 + 2);
        let mut push = |p: Vec2| {
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        };
        push(Vec2::new(lo, self.floor));
        for s in &self.segs {
            push(Vec2::new(s.x0, s.y0.max(self.floor)));
            push(Vec2::new(s.x1, s.y1.max(self.floor)));
        }
        push(Vec2::new(hi, self.floor));
        Shape::from_polygon(ring)
    }
}

/// Band under a cosine over [-3π, 3π], one cubic Bézier per half period.
///
/// The band starts high at -3π, so its first half period is an S-shaped
/// wiggle from 1 back up to 1 rather than a cosine. From -2π on it tracks
/// cos(x). Only the far side lobes ever reach the wiggle.
pub(crate) fn cosine_template() -> &'static Skyline {
    static TEMPLATE: OnceLock<Skyline> = OnceLock::new();
    TEMPLATE.get_or_init(|| {
        // cos(iπ)
        let crest = |i: i32| if i % 2 == 0 { 1.0 } else { -1.0 };
        let mut path = PathBuilder::new();
        path.move_to(-3.0 * PI, 1.0);
        for i in -3..=2 {
            let x0 = i as f64 * PI;
            let x1 = x0 + PI;
            let y1 = crest(i + 1);
            path.cubic_to(
                x0 + PI / 3.0 + COS_CORRECTION,
                -y1,
                x1 - PI / 3.0 - COS_CORRECTION,
                y1,
                x1,
                y1,
            );
        }
        Skyline::from_outline(TEMPLATE_FLOOR, path.outline())
    })
}

/// Full-height box over [-2π, 2π] with notches of top -1 around ±π, each
/// `cone_angle` wide on either side.
pub(crate) fn side_lobe_mask(cone_angle: f64) -> Skyline {
    let a = cone_angle;
    Skyline::from_steps(
        TEMPLATE_FLOOR,
        &[
            (-2.0 * PI, -PI - a, 1.0),
            (-PI - a, -PI + a, -1.0),
            (-PI + a, PI - a, 1.0),
            (PI - a, PI + a, -1.0),
            (PI + a, 2.0 * PI, 1.0),
        ],
    )
}

/// View-space outline of a mountain centred on x = 0. Its crest sits at
/// `cos(cone_angle)`, i.e. at the apex elevation.
pub(crate) fn mountain_silhouette(cone_angle: f64) -> Skyline {
    let a = cone_angle.clamp(0.0, PI);
    let template = cosine_template();
    template
        .shifted(a)
        .intersect(&template.shifted(-a))
        .intersect(&side_lobe_mask(a))
}
