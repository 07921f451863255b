use celestial::CelestialBodies;
use color::blend;
use geodesy::{intersect, Intersections, M_PER_KM};
use nalgebra::Vector3;
use surface_imagery::SurfaceImageCatalog;
use tracing::{debug, debug_span, trace};
use transforms::{right_ascension_declination, EarthRotation, FrameTransform};

use crate::{
    atmosphere,
    discs::{stamp_body, Canvas},
    PixelLabel, RaycastErrors, RenderRequest, RenderResult, RenderStats,
};

/// Renders sensor views against a loaded surface image catalog.
///
/// Holds no state between renders; each call is a pure function of the
/// request and the catalog's pixels.
pub struct RayCaster<'c, F = EarthRotation> {
    catalog: &'c SurfaceImageCatalog,
    frames: F,
}

impl<'c> RayCaster<'c, EarthRotation> {
    pub fn new(catalog: &'c SurfaceImageCatalog) -> Self {
        Self {
            catalog,
            frames: EarthRotation,
        }
    }
}

impl<'c, F: FrameTransform> RayCaster<'c, F> {
    pub fn with_frames(catalog: &'c SurfaceImageCatalog, frames: F) -> Self {
        Self { catalog, frames }
    }

    /// Produces the composited image and per-pixel labels for `request`.
    ///
    /// Stages run in a fixed order and later ones draw over earlier ones:
    /// surface albedo, labels, Sun/Moon discs, atmosphere haze, limb highlight.
    pub fn render(&self, request: &RenderRequest) -> Result<RenderResult, RaycastErrors> {
        if !self.catalog.is_ready() {
            return Err(RaycastErrors::CatalogNotReady);
        }
        validate(request)?;

        let (width, height) = (request.width, request.height);
        let _span = debug_span!("render", width, height).entered();
        let config = request.config;
        let ellipsoid = &config.ellipsoid;
        let n = request.rays.len();

        // sensor -> ECI -> ECEF
        let rays_eci: Vec<Vector3<f64>> = request
            .rays
            .iter()
            .map(|r| (request.pose.eci_from_sensor * r).normalize())
            .collect();
        let ecef_from_eci = self.frames.ecef_from_eci(&request.time);
        let rays_ecef: Vec<Vector3<f64>> = rays_eci.iter().map(|r| ecef_from_eci * r).collect();
        let observer_ecef = ecef_from_eci * request.pose.position_eci;
        let sun_ecef_m = ecef_from_eci * request.sun_eci * M_PER_KM;

        let mut image = vec![[0.0_f32; 3]; n];
        let mut stats = RenderStats::default();

        // surface
        let ground = intersect(ellipsoid, &observer_ecef, &rays_ecef, 0.0)?;
        let mut geodetic = vec![None; n];
        let mut lit_idx = Vec::new();
        let mut dark_idx = Vec::new();
        for (i, point) in ground.hits() {
            geodetic[i] = Some(ellipsoid.geodetic(&point));
            if !config.eclipse_shading || is_sunlit(&point, &sun_ecef_m) {
                lit_idx.push(i);
            } else {
                dark_idx.push(i);
            }
        }
        stats.ground = lit_idx.len() + dark_idx.len();
        stats.eclipsed = dark_idx.len();

        let (wl_min, wl_max) = config.wavelength_nm;
        for (indices, lit) in [(&lit_idx, true), (&dark_idx, false)] {
            if indices.is_empty() {
                continue;
            }
            let id = self.catalog.lookup(wl_min, wl_max, lit)?;
            let (lat, lon): (Vec<f64>, Vec<f64>) = indices
                .iter()
                .filter_map(|&i| geodetic[i].map(|g| (g.lat_deg, g.lon_deg)))
                .unzip();
            let rgb = self.catalog.sample(id, &lat, &lon)?;
            for (&i, px) in indices.iter().zip(rgb) {
                image[i] = px.map(f32::from);
            }
        }

        // labels
        let mut labels: Vec<PixelLabel> = geodetic
            .iter()
            .zip(&rays_eci)
            .map(|(g, r)| match g {
                Some(g) => PixelLabel::Ground {
                    lat_deg: g.lat_deg,
                    lon_deg: g.lon_deg,
                },
                None => {
                    let (ra, dec) = right_ascension_declination(r);
                    PixelLabel::Sky {
                        az_deg: ra.to_degrees(),
                        el_deg: dec.to_degrees(),
                    }
                }
            })
            .collect();

        // Sun and Moon discs
        {
            let mut canvas = Canvas {
                width,
                height,
                image: &mut image,
                labels: &mut labels,
            };
            let bodies = [
                (CelestialBodies::Sun, config.sun_disc, &request.sun_eci, &config.sun_color),
                (CelestialBodies::Moon, config.moon_disc, &request.moon_eci, &config.moon_color),
            ];
            for (body, enabled, position, color) in bodies {
                if !enabled {
                    continue;
                }
                let painted = stamp_body(
                    body,
                    &request.pose.position_eci,
                    position,
                    &rays_eci,
                    request.pixels_per_radian,
                    color.to_rgb255(),
                    &mut canvas,
                );
                match body {
                    CelestialBodies::Sun => stats.sun = painted,
                    CelestialBodies::Moon => stats.moon = painted,
                }
            }
        }

        // atmosphere
        let mut in_atmosphere = vec![false; n];
        if config.atmosphere {
            let h_km = config.atmosphere_height_km;
            let re_km = ellipsoid.a / M_PER_KM;
            let shell = intersect(ellipsoid, &observer_ecef, &rays_ecef, h_km * M_PER_KM)?;
            let day = config.atmosphere_day.to_rgb255();
            let night = config.atmosphere_night.to_rgb255();

            for (i, shell_point) in shell.hits() {
                let ray = &rays_ecef[i];
                let depth = match ground.point(i) {
                    Some(ground_point) => {
                        let dp = ground_point.normalize().dot(ray);
                        atmosphere::ground_path_length(re_km, h_km, dp)
                    }
                    None => {
                        let dp = shell_point.normalize().dot(ray);
                        atmosphere::limb_path_length(re_km, h_km, dp)
                    }
                };
                let alpha =
                    atmosphere::alpha(depth, config.max_atm_depth_km, config.max_alpha);
                let lit = !config.eclipse_shading || is_sunlit(&shell_point, &sun_ecef_m);
                image[i] = blend(if lit { day } else { night }, image[i], alpha);
                in_atmosphere[i] = true;
            }
            stats.atmosphere = shell.hit_count();
        }

        // limb highlight
        if config.edge_highlight {
            let outer = intersect(ellipsoid, &observer_ecef, &rays_ecef, config.highlight_pad_m())?;
            let color = config.highlight_color.to_rgb255();
            for i in highlight_lanes(&ground, &in_atmosphere, &outer) {
                image[i] = color;
                stats.highlight += 1;
            }
        }

        trace!(?stats, "render stages complete");
        debug!(
            ground = stats.ground,
            atmosphere = stats.atmosphere,
            sun = stats.sun,
            moon = stats.moon,
            "rendered sensor view"
        );

        Ok(RenderResult {
            width,
            height,
            image,
            labels,
            stats,
        })
    }
}

fn validate(request: &RenderRequest) -> Result<(), RaycastErrors> {
    request.config.validate()?;

    let expected = request
        .width
        .checked_mul(request.height)
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            RaycastErrors::GeometryInvalid(format!(
                "render resolution must be non-empty and addressable, got {}x{}",
                request.width, request.height
            ))
        })?;
    if request.rays.len() != expected {
        return Err(RaycastErrors::ShapeMismatch {
            what: "ray batch",
            expected,
            found: request.rays.len(),
        });
    }
    if !request.pixels_per_radian.is_finite() || request.pixels_per_radian <= 0.0 {
        return Err(RaycastErrors::GeometryInvalid(format!(
            "pixels_per_radian must be finite and positive, got {}",
            request.pixels_per_radian
        )));
    }
    let positions = [
        request.pose.position_eci,
        request.sun_eci,
        request.moon_eci,
    ];
    if positions.iter().flat_map(|p| p.iter()).any(|v| !v.is_finite()) {
        return Err(RaycastErrors::GeometryInvalid(
            "observer, Sun and Moon positions must be finite".to_string(),
        ));
    }
    if request.pose.eci_from_sensor.coords.iter().any(|v| !v.is_finite()) {
        return Err(RaycastErrors::GeometryInvalid(
            "sensor rotation must be finite".to_string(),
        ));
    }
    if let Some(i) = request
        .rays
        .iter()
        .position(|r| r.iter().any(|v| !v.is_finite()) || r.norm_squared() == 0.0)
    {
        return Err(RaycastErrors::GeometryInvalid(format!(
            "ray {i} must be a finite, non-zero direction, got {:?}",
            request.rays[i]
        )));
    }
    Ok(())
}

/// Terminator test: a point is lit when the direction to the Sun is not below
/// its local horizon, using the geocentric normal. Both arguments in m.
fn is_sunlit(point: &Vector3<f64>, sun: &Vector3<f64>) -> bool {
    let Some(to_sun) = (sun - point).try_normalize(0.0) else {
        return true;
    };
    to_sun.dot(&point.normalize()) >= 0.0
}

/// Rays that reach the outer highlight shell without touching the ground or
/// the atmosphere shell.
fn highlight_lanes<'a>(
    ground: &'a Intersections,
    in_atmosphere: &'a [bool],
    outer: &'a Intersections,
) -> impl Iterator<Item = usize> + 'a {
    (0..outer.len()).filter(move |&i| outer.is_hit(i) && !ground.is_hit(i) && !in_atmosphere[i])
}
