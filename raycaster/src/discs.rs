//! Screen-space Sun and Moon discs.
//!
//! A body is drawn only when the ray closest to it is within
//! `1 / pixels_per_radian` of parallel (in cosine), which can miss a body that
//! falls between pixel centres of a sparse render. Every pixel within the
//! body's angular radius of that closest pixel, measured in pixels, is then
//! painted opaque and labelled with the body.

use celestial::CelestialBodies;
use nalgebra::Vector3;

use crate::PixelLabel;

/// Pixel grid the disc is stamped into.
pub struct Canvas<'a> {
    pub width: usize,
    pub height: usize,
    pub image: &'a mut [[f32; 3]],
    pub labels: &'a mut [PixelLabel],
}

/// Index of the ray closest in direction to `target` and its dot product.
/// Rays whose dot product is not finite are skipped.
pub fn closest_ray(rays: &[Vector3<f64>], target: &Vector3<f64>) -> Option<(usize, f64)> {
    rays.iter()
        .map(|r| r.dot(target))
        .enumerate()
        .filter(|(_, dot)| dot.is_finite())
        .fold(None, |best, (i, dot)| match best {
            Some((_, best_dot)) if best_dot >= dot => best,
            _ => Some((i, dot)),
        })
}

/// Stamps `body` into `canvas` if it is in frame and returns the number of
/// pixels painted. Positions are ECI km, rays ECI unit vectors in canvas order.
pub fn stamp_body(
    body: CelestialBodies,
    observer_eci: &Vector3<f64>,
    body_eci: &Vector3<f64>,
    rays_eci: &[Vector3<f64>],
    pixels_per_radian: f64,
    color: [f32; 3],
    canvas: &mut Canvas,
) -> usize {
    let Some(to_body) = (body_eci - observer_eci).try_normalize(0.0) else {
        return 0;
    };
    let Some((centre, dot)) = closest_ray(rays_eci, &to_body) else {
        return 0;
    };
    // negated so a NaN dot is rejected
    if !(1.0 - dot <= 1.0 / pixels_per_radian) {
        return 0;
    }

    let radius_px = body.angular_radius_deg().to_radians() * pixels_per_radian;
    let reach = radius_px.floor() as usize;
    let (row0, col0) = (centre / canvas.width, centre % canvas.width);

    let mut painted = 0;
    let last_row = row0.saturating_add(reach).min(canvas.height - 1);
    let last_col = col0.saturating_add(reach).min(canvas.width - 1);
    for row in row0.saturating_sub(reach)..=last_row {
        for col in col0.saturating_sub(reach)..=last_col {
            let dr = row as f64 - row0 as f64;
            let dc = col as f64 - col0 as f64;
            if dr * dr + dc * dc <= radius_px * radius_px {
                let i = row * canvas.width + col;
                canvas.image[i] = color;
                canvas.labels[i] = PixelLabel::Body(body);
                painted += 1;
            }
        }
    }
    painted
}
