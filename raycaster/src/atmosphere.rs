//! Path length through the atmosphere shell and the haze alpha derived from it.
//!
//! Both path lengths treat the planet as a sphere of radius `re` with a shell
//! of height `h`. `dp` is the cosine between the ray direction and the outward
//! normal at the point where the ray meets the ground (or the shell), so it is
//! negative for rays travelling inward.

/// Length of atmosphere between a ground hit and the top of the shell, back
/// along the ray: `sqrt((re+h)^2 + re^2 (dp^2 - 1)) + re dp`.
/// Equals `h` looking straight down and `sqrt((re+h)^2 - re^2)` at grazing.
pub fn ground_path_length(re: f64, h: f64, dp: f64) -> f64 {
    let top = re + h;
    (top * top + re * re * (dp * dp - 1.0)).max(0.0).sqrt() + re * dp
}

/// Length of atmosphere from the shell entry point to the ray's closest
/// approach to the planet centre, `-(re+h) dp`, for rays that never reach the
/// ground. At the limb this matches `ground_path_length` at grazing.
pub fn limb_path_length(re: f64, h: f64, dp: f64) -> f64 {
    (-(re + h) * dp).max(0.0)
}

/// Haze opacity, `depth / max_depth * max_alpha`, clipped to
/// `[0, min(1, max_alpha)]`.
pub fn alpha(depth: f64, max_depth: f64, max_alpha: f64) -> f32 {
    (depth / max_depth * max_alpha).clamp(0.0, max_alpha.min(1.0)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const RE: f64 = 6378.137;

    #[test]
    fn test_ground_path_straight_down() {
        assert_abs_diff_eq!(ground_path_length(RE, 150.0, -1.0), 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ground_path_grazing() {
        let expected = ((RE + 150.0).powi(2) - RE * RE).sqrt();
        assert_abs_diff_eq!(ground_path_length(RE, 150.0, 0.0), expected, epsilon = 1e-9);
        // tuned maximum depth sits at the grazing path of a 150 km shell
        assert!((expected - 1390.6).abs() < 1.0);
    }

    #[test]
    fn test_ground_path_grows_toward_limb() {
        let depths: Vec<f64> = [-1.0, -0.8, -0.5, -0.2, -0.05]
            .iter()
            .map(|dp| ground_path_length(RE, 150.0, *dp))
            .collect();
        assert!(depths.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_limb_path_matches_ground_at_grazing() {
        // a ray tangent to the ground enters the shell with dp = -sqrt(1 - (re/(re+h))^2)
        let h = 150.0;
        let dp = -(1.0 - (RE / (RE + h)).powi(2)).sqrt();
        assert_abs_diff_eq!(
            limb_path_length(RE, h, dp),
            ground_path_length(RE, h, 0.0),
            epsilon = 1e-6
        );
        assert_eq!(limb_path_length(RE, h, 0.3), 0.0);
    }

    #[test]
    fn test_alpha_clip() {
        assert_abs_diff_eq!(alpha(0.0, 1390.6, 0.75), 0.0);
        assert_abs_diff_eq!(alpha(695.3, 1390.6, 0.75), 0.375, epsilon = 1e-6);
        assert_abs_diff_eq!(alpha(5000.0, 1390.6, 0.75), 0.75);
        assert_abs_diff_eq!(alpha(-3.0, 1390.6, 0.75), 0.0);
    }
}
