//! Ray–ellipsoid intersection over a batch of rays sharing one origin.
//!
//! The parametric ray `p + d r` is substituted into the ellipsoid equation and
//! the resulting quadratic in `d` is solved in closed form:
//!
//! ```text
//! value     = -a²b²w·z - a²c²v·y - b²c²u·x
//! radical   = a²b²w² + a²c²v² - a²v²z² + 2a²vw·yz - a²w²y²
//!           + b²c²u² - b²u²z² + 2b²uw·xz - b²w²x²
//!           - c²u²y² + 2c²uv·xy - c²v²x²
//! magnitude = a²b²w² + a²c²v² + b²c²u²
//! d         = (value - abc·sqrt(radical)) / magnitude
//! ```
//!
//! with `(u, v, w) = r` and `(x, y, z) = p`. Taking the minus branch always
//! gives the root nearest the observer, which is the first surface crossing for
//! an observer outside the ellipsoid.

use nalgebra::Vector3;

use crate::{Ellipsoid, GeodesyErrors, M_PER_KM};

/// Nearer quadratic root for every ray, with a mask of valid lanes.
///
/// A lane is invalid when the ray passes outside the ellipsoid (`radical < 0`),
/// when the ellipsoid lies behind the origin (`d < 0`), or when the direction is
/// degenerate. Invalid lanes hold `0.0` in `distance` and must not be used.
/// A tangent ray (`radical == 0`) is a valid lane.
#[derive(Debug, Clone, PartialEq)]
pub struct RootLanes {
    pub distance: Vec<f64>,
    pub valid: Vec<bool>,
}

pub fn nearest_root(
    ellipsoid: &Ellipsoid,
    origin: &Vector3<f64>,
    directions: &[Vector3<f64>],
) -> RootLanes {
    let a = ellipsoid.a;
    let b = ellipsoid.a;
    let c = ellipsoid.c;
    let (a2, b2, c2) = (a * a, b * b, c * c);
    let abc = a * b * c;
    let (x, y, z) = (origin.x, origin.y, origin.z);

    let mut distance = Vec::with_capacity(directions.len());
    let mut valid = Vec::with_capacity(directions.len());

    for r in directions {
        let (u, v, w) = (r.x, r.y, r.z);

        let value = -a2 * b2 * w * z - a2 * c2 * v * y - b2 * c2 * u * x;
        let radical = a2 * b2 * w * w + a2 * c2 * v * v - a2 * v * v * z * z
            + 2.0 * a2 * v * w * y * z
            - a2 * w * w * y * y
            + b2 * c2 * u * u
            - b2 * u * u * z * z
            + 2.0 * b2 * u * w * x * z
            - b2 * w * w * x * x
            - c2 * u * u * y * y
            + 2.0 * c2 * u * v * x * y
            - c2 * v * v * x * x;
        let magnitude = a2 * b2 * w * w + a2 * c2 * v * v + b2 * c2 * u * u;

        // mask before the sqrt so no NaN is ever produced
        let lane_ok = radical >= 0.0 && magnitude > 0.0;
        let d = if lane_ok {
            (value - abc * radical.sqrt()) / magnitude
        } else {
            0.0
        };
        let lane_ok = lane_ok && d >= 0.0 && d.is_finite();

        distance.push(if lane_ok { d } else { 0.0 });
        valid.push(lane_ok);
    }

    RootLanes { distance, valid }
}

/// Result of intersecting a ray batch with an ellipsoid. Points are ECEF in m.
#[derive(Debug, Clone)]
pub struct Intersections {
    hit: Vec<bool>,
    distance: Vec<f64>,
    points: Vec<Vector3<f64>>,
}

impl Intersections {
    pub fn len(&self) -> usize {
        self.hit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hit.is_empty()
    }

    pub fn hit_mask(&self) -> &[bool] {
        &self.hit
    }

    pub fn is_hit(&self, i: usize) -> bool {
        self.hit[i]
    }

    pub fn hit_count(&self) -> usize {
        self.hit.iter().filter(|h| **h).count()
    }

    /// Distance along the ray in m, only for hits.
    pub fn distance(&self, i: usize) -> Option<f64> {
        self.hit[i].then(|| self.distance[i])
    }

    pub fn point(&self, i: usize) -> Option<Vector3<f64>> {
        self.hit[i].then(|| self.points[i])
    }

    /// Indices and points of every hit, in ray order.
    pub fn hits(&self) -> impl Iterator<Item = (usize, Vector3<f64>)> + '_ {
        self.hit
            .iter()
            .zip(&self.points)
            .enumerate()
            .filter_map(|(i, (hit, p))| hit.then_some((i, *p)))
    }
}

/// Intersects rays from `origin_km` (ECEF, km) along unit `directions` (ECEF)
/// with `ellipsoid` inflated by `pad` m.
pub fn intersect(
    ellipsoid: &Ellipsoid,
    origin_km: &Vector3<f64>,
    directions: &[Vector3<f64>],
    pad: f64,
) -> Result<Intersections, GeodesyErrors> {
    ellipsoid.validate()?;
    if !origin_km.iter().all(|v| v.is_finite()) {
        return Err(GeodesyErrors::GeometryInvalid(format!(
            "observer position must be finite, got {origin_km:?}"
        )));
    }
    let shell = if pad == 0.0 {
        *ellipsoid
    } else {
        ellipsoid.padded(pad)?
    };

    let origin = origin_km * M_PER_KM;
    let RootLanes { distance, valid } = nearest_root(&shell, &origin, directions);

    let points = directions
        .iter()
        .zip(distance.iter().zip(&valid))
        .map(|(r, (d, ok))| if *ok { origin + r * *d } else { Vector3::zeros() })
        .collect();

    Ok(Intersections {
        hit: valid,
        distance,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{WGS84_A, WGS84_C};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_nadir_ray_hits_equator() {
        let origin = Vector3::new(7000.0, 0.0, 0.0);
        let rays = [Vector3::new(-1.0, 0.0, 0.0)];
        let hits = intersect(&Ellipsoid::WGS84, &origin, &rays, 0.0).unwrap();

        assert!(hits.is_hit(0));
        assert_abs_diff_eq!(hits.distance(0).unwrap(), 7.0e6 - WGS84_A, epsilon = 1e-6);
        let p = hits.point(0).unwrap() / M_PER_KM;
        assert_abs_diff_eq!(p, Vector3::new(6378.137, 0.0, 0.0), epsilon = 1e-6);

        let g = Ellipsoid::WGS84.geodetic(&hits.point(0).unwrap());
        assert_abs_diff_eq!(g.lat_deg, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g.lon_deg, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sideways_ray_misses() {
        let origin = Vector3::new(7000.0, 0.0, 0.0);
        let rays = [Vector3::new(0.0, 1.0, 0.0)];
        let hits = intersect(&Ellipsoid::WGS84, &origin, &rays, 0.0).unwrap();
        assert!(!hits.is_hit(0));
        assert!(hits.point(0).is_none());
        assert!(hits.distance(0).is_none());
    }

    #[test]
    fn test_ellipsoid_behind_observer_misses() {
        let origin = Vector3::new(7000.0, 0.0, 0.0);
        let rays = [Vector3::new(1.0, 0.0, 0.0)];
        let lanes = nearest_root(&Ellipsoid::WGS84, &(origin * M_PER_KM), &rays);
        assert_eq!(lanes.valid, vec![false]);
        assert_eq!(lanes.distance, vec![0.0]);
    }

    #[test]
    fn test_rays_toward_centre_always_hit() {
        let e = Ellipsoid::WGS84;
        let origins = [
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 6400.0),
            Vector3::new(-30000.0, 12000.0, -9000.0),
            Vector3::new(4000.0, 4000.0, 4000.0),
        ];
        for origin in origins {
            let toward_centre = [-origin.normalize()];
            let lanes = nearest_root(&e, &(origin * M_PER_KM), &toward_centre);
            assert!(lanes.valid[0]);
            assert!(lanes.distance[0] >= 0.0);
            assert!(lanes.distance[0].is_finite());
        }
    }

    #[test]
    fn test_polar_hit() {
        let origin = Vector3::new(0.0, 0.0, 10000.0);
        let rays = [Vector3::new(0.0, 0.0, -1.0)];
        let hits = intersect(&Ellipsoid::WGS84, &origin, &rays, 0.0).unwrap();
        assert_abs_diff_eq!(hits.point(0).unwrap().z, WGS84_C, epsilon = 1e-6);
    }

    #[test]
    fn test_tangent_ray_is_hit() {
        // sphere of radius 1 m, ray grazing at y = 1
        let sphere = Ellipsoid::new(1.0, 1.0).unwrap();
        let origin = Vector3::new(-0.005, 0.001, 0.0); // km
        let rays = [Vector3::new(1.0, 0.0, 0.0)];
        let lanes = nearest_root(&sphere, &(origin * M_PER_KM), &rays);
        assert!(lanes.valid[0]);
        assert_abs_diff_eq!(lanes.distance[0], 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_padding_inflates_shell() {
        let origin = Vector3::new(7000.0, 0.0, 0.0);
        let rays = [Vector3::new(-1.0, 0.0, 0.0)];
        let hits = intersect(&Ellipsoid::WGS84, &origin, &rays, 150e3).unwrap();
        assert_abs_diff_eq!(hits.point(0).unwrap().x, WGS84_A + 150e3, epsilon = 1e-6);
    }

    #[test]
    fn test_misses_produce_no_nan() {
        let origin = Vector3::new(7000.0, 0.0, 0.0);
        let rays = [
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
        ];
        let lanes = nearest_root(&Ellipsoid::WGS84, &(origin * M_PER_KM), &rays);
        assert_eq!(lanes.valid, vec![false, false, false, true]);
        assert!(lanes.distance.iter().all(|d| d.is_finite()));

        let hits = intersect(&Ellipsoid::WGS84, &origin, &rays, 0.0).unwrap();
        assert_eq!(hits.hit_count(), 1);
        assert_eq!(hits.hits().map(|(i, _)| i).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_invalid_inputs() {
        let rays = [Vector3::new(-1.0, 0.0, 0.0)];
        let bad = Ellipsoid { a: -1.0, c: 1.0 };
        assert!(intersect(&bad, &Vector3::new(7000.0, 0.0, 0.0), &rays, 0.0).is_err());
        assert!(
            intersect(&Ellipsoid::WGS84, &Vector3::new(f64::NAN, 0.0, 0.0), &rays, 0.0).is_err()
        );
        assert!(
            intersect(&Ellipsoid::WGS84, &Vector3::new(7000.0, 0.0, 0.0), &rays, -5.0).is_err()
        );
    }
}
