use crate::flower::Species;
use crate::geom::Point3;
use anyhow::{bail, Result};
use rand::Rng;

pub(crate) const NUM_MOUNTAINS: usize = 30;
pub(crate) const MAP_RADIUS: f64 = 15.0;
pub(crate) const MIN_CLEARANCE: f64 = 2.0;

/// Height of the walking surface above the cone it rests on.
pub(crate) const SURFACE_OFFSET: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Mountain {
    pub(crate) apex: Point3,
    pub(crate) flower: Option<Species>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TerrainParams {
    pub(crate) count: usize,
    pub(crate) map_radius: f64,
    pub(crate) min_clearance: f64,
    /// Candidate samples allowed per mountain before giving up.
    pub(crate) max_attempts: u32,
    pub(crate) flowers: bool,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            count: NUM_MOUNTAINS,
            map_radius: MAP_RADIUS,
            min_clearance: MIN_CLEARANCE,
            max_attempts: 100_000,
            flowers: true,
        }
    }
}

/// The mountain field. Apexes never move once generated; only flowers change.
#[derive(Clone, Debug)]
pub(crate) struct Terrain {
    pub(crate) mountains: Vec<Mountain>,
    map_radius: f64,
}

impl Terrain {
    pub(crate) fn from_mountains(mountains: Vec<Mountain>, map_radius: f64) -> Self {
        Self {
            mountains,
            map_radius,
        }
    }

    /// Rejection-samples `params.count` mountains inside the map disk.
    ///
    /// Each candidate must keep `min_clearance` from every placed apex, and its
    /// height is drawn from the interval where its cone neither swallows nor
    /// is swallowed by any neighbour's cone (with the same clearance).
    pub(crate) fn generate<R: Rng + ?Sized>(params: &TerrainParams, rng: &mut R) -> Result<Self> {
        let r = params.map_radius;
        let mut mountains: Vec<Mountain> = Vec::with_capacity(params.count);
        let mut total_attempts: u64 = 0;

        for i in 0..params.count {
            let mut placed = None;
            for _ in 0..params.max_attempts {
                total_attempts += 1;
                let x = rng.gen::<f64>() * r * 2.0 - r;
                let y = rng.gen::<f64>() * r * 2.0 - r;
                if let Some((min, max)) = height_interval(&mountains, x, y, params) {
                    let z = min + rng.gen::<f64>() * (max - min);
                    placed = Some(Point3::new(x, y, z));
                    break;
                }
            }

            let Some(apex) = placed else {
                bail!(
                    "terrain generation failed: mountain {} of {} not placed after {} attempts",
                    i + 1,
                    params.count,
                    params.max_attempts
                );
            };

            log::debug!(
                "mountain {i} at ({:.2}, {:.2}) height {:.2}",
                apex.x,
                apex.y,
                apex.z
            );
            mountains.push(Mountain {
                apex,
                flower: params.flowers.then(|| Species::cyclic(i)),
            });
        }

        log::info!(
            "placed {} mountains in {} candidate samples",
            mountains.len(),
            total_attempts
        );
        Ok(Self::from_mountains(mountains, r))
    }

    pub(crate) fn map_radius(&self) -> f64 {
        self.map_radius
    }

    /// Ground height at (x, y): the highest slope-1 cone over that point,
    /// raised by [`SURFACE_OFFSET`], never below `-map_radius`.
    pub(crate) fn height_at(&self, x: f64, y: f64) -> f64 {
        let mut z = -self.map_radius;
        for m in &self.mountains {
            let d = (x - m.apex.x).hypot(y - m.apex.y);
            z = z.max(m.apex.z - d + SURFACE_OFFSET);
        }
        z
    }
}

/// Feasible apex heights for a candidate at (x, y), or None when the candidate
/// is off the map, too close to a placed apex, or over-constrained.
fn height_interval(
    placed: &[Mountain],
    x: f64,
    y: f64,
    params: &TerrainParams,
) -> Option<(f64, f64)> {
    let r = params.map_radius;
    if x * x + y * y > r * r {
        return None;
    }

    let mut min = 0.0_f64;
    let mut max = r;
    for other in placed {
        let d = (x - other.apex.x).hypot(y - other.apex.y);
        if d < params.min_clearance {
            return None;
        }
        min = min.max(other.apex.z - d + params.min_clearance);
        max = max.min(other.apex.z + d - params.min_clearance);
    }

    (min <= max).then_some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SEED: u64 = 0xA1B5_B1B3_0000_0001;

    fn generated(seed: u64) -> Terrain {
        let mut rng = StdRng::seed_from_u64(seed);
        Terrain::generate(&TerrainParams::default(), &mut rng).unwrap()
    }

    fn cone(x: f64, y: f64, z: f64) -> Mountain {
        Mountain {
            apex: Point3::new(x, y, z),
            flower: None,
        }
    }

    #[test]
    fn generated_terrain_respects_disk_and_clearance() {
        for k in 0..8 {
            let t = generated(SEED + k);
            assert_eq!(t.mountains.len(), NUM_MOUNTAINS);
            for (i, a) in t.mountains.iter().enumerate() {
                let p = a.apex;
                assert!(p.x.hypot(p.y) <= MAP_RADIUS + 1e-9);
                assert!(p.z >= 0.0 && p.z <= MAP_RADIUS);
                for b in &t.mountains[i + 1..] {
                    let d = p.horizontal_distance(b.apex);
                    assert!(d >= MIN_CLEARANCE, "apexes {d} apart");
                    // later apex was drawn from [other.z - d + c, other.z + d - c]
                    assert!(
                        (p.z - b.apex.z).abs() <= d - MIN_CLEARANCE + 1e-9,
                        "height constraint violated"
                    );
                }
            }
        }
    }

    #[test]
    fn flowers_assigned_cyclically() {
        let t = generated(SEED);
        for (i, m) in t.mountains.iter().enumerate() {
            assert_eq!(m.flower, Some(Species::cyclic(i)));
        }
    }

    #[test]
    fn terrain_only_variant_has_no_flowers() {
        let params = TerrainParams {
            flowers: false,
            ..TerrainParams::default()
        };
        let mut rng = StdRng::seed_from_u64(SEED);
        let t = Terrain::generate(&params, &mut rng).unwrap();
        assert!(t.mountains.iter().all(|m| m.flower.is_none()));
    }

    #[test]
    fn same_seed_same_terrain() {
        assert_eq!(generated(7).mountains, generated(7).mountains);
    }

    #[test]
    fn infeasible_parameters_fail_loudly() {
        let params = TerrainParams {
            count: 3,
            map_radius: 0.5,
            max_attempts: 500,
            ..TerrainParams::default()
        };
        let mut rng = StdRng::seed_from_u64(SEED);
        let err = Terrain::generate(&params, &mut rng).unwrap_err();
        assert!(err.to_string().contains("mountain 2 of 3"), "{err}");
    }

    #[test]
    fn height_interval_tightens_against_neighbours() {
        let placed = vec![cone(0.0, 0.0, 10.0)];
        let params = TerrainParams::default();
        let (min, max) = height_interval(&placed, 5.0, 0.0, &params).unwrap();
        assert!((min - 7.0).abs() < 1e-12);
        assert!((max - 13.0).abs() < 1e-12);
        assert!(height_interval(&placed, 1.5, 0.0, &params).is_none());
        assert!(height_interval(&placed, 14.0, 14.0, &params).is_none());
    }

    #[test]
    fn apex_column_is_at_least_cone_plus_offset() {
        let t = generated(SEED);
        for m in &t.mountains {
            assert!(t.height_at(m.apex.x, m.apex.y) >= m.apex.z + SURFACE_OFFSET - 1e-12);
        }
    }

    #[test]
    fn height_is_upper_envelope_of_cones() {
        let t = Terrain::from_mountains(vec![cone(0.0, 0.0, 5.0), cone(4.0, 0.0, 2.0)], 15.0);
        assert!((t.height_at(0.0, 0.0) - 6.0).abs() < 1e-12);
        assert!((t.height_at(4.0, 0.0) - 3.0).abs() < 1e-12);
        assert!((t.height_at(0.0, 3.0) - 3.0).abs() < 1e-12);
        assert_eq!(t.height_at(100.0, 0.0), -15.0);
    }

    #[test]
    fn height_falls_off_away_from_all_mountains() {
        let t = generated(SEED + 3);
        for k in 0..16 {
            let a = k as f64 * std::f64::consts::PI / 8.0;
            let (ux, uy) = (a.sin(), a.cos());
            let mut prev = f64::INFINITY;
            let mut r = MAP_RADIUS + 1.0;
            while r < 60.0 {
                let h = t.height_at(ux * r, uy * r);
                assert!(h <= prev + 1e-12);
                prev = h;
                r += 0.25;
            }
            assert_eq!(prev, -MAP_RADIUS);
        }
    }
}
