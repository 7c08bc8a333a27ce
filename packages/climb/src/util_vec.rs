//! Vector utilities that the locomotion code needs in a NaN-free form.

use vek::*;


/// Squared length below which a vector is considered to have no direction.
const MIN_DIR_MAGNITUDE_SQUARED: f32 = 1e-8;

/// Normalize `v`, or return the zero vector if `v` is too short (or not finite) to have a
/// meaningful direction.
pub fn safe_normal(v: Vec3<f32>) -> Vec3<f32> {
    let mag_sq = v.magnitude_squared();
    if mag_sq > MIN_DIR_MAGNITUDE_SQUARED && mag_sq.is_finite() {
        v / mag_sq.sqrt()
    } else {
        Vec3::zero()
    }
}

/// Is `v` too short to have a meaningful direction?
pub fn is_nearly_zero(v: Vec3<f32>) -> bool {
    !(v.magnitude_squared() > MIN_DIR_MAGNITUDE_SQUARED)
}

/// Remove the component of `v` along `normal`, leaving only the part lying in the plane.
pub fn project_on_plane(v: Vec3<f32>, normal: Vec3<f32>) -> Vec3<f32> {
    let n = safe_normal(normal);
    v - n * v.dot(n)
}

/// Scale `v` down so its length does not exceed `max`.
pub fn clamp_magnitude(v: Vec3<f32>, max: f32) -> Vec3<f32> {
    if v.magnitude() > max {
        safe_normal(v) * max
    } else {
        v
    }
}


#[test]
fn test_safe_normal_degenerate() {
    assert_eq!(safe_normal(Vec3::zero()), Vec3::zero());
    assert_eq!(safe_normal(Vec3::new(1e-6, 0.0, 0.0)), Vec3::zero());
    assert_eq!(safe_normal(Vec3::new(f32::NAN, 0.0, 0.0)), Vec3::zero());
    let n = safe_normal(Vec3::new(3.0, 0.0, 4.0));
    assert!((n - Vec3::new(0.6, 0.0, 0.8)).magnitude() < 1e-6);
}

#[test]
fn test_project_on_plane() {
    let v = Vec3::new(3.0, 4.0, -5.0);
    let projected = project_on_plane(v, Vec3::new(0.0, 0.0, 2.0));
    assert!((projected - Vec3::new(3.0, 4.0, 0.0)).magnitude() < 1e-6);
    assert_eq!(project_on_plane(v, Vec3::zero()), v);
}

#[test]
fn test_clamp_magnitude() {
    let v = Vec3::new(0.0, 720.0, 960.0);
    let clamped = clamp_magnitude(v, 1000.0);
    assert!((clamped.magnitude() - 1000.0).abs() < 1e-3);
    assert_eq!(clamp_magnitude(v, 5000.0), v);
}
