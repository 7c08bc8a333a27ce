
use serde::{Serialize, Deserialize};
use vek::*;


/// Identifier of some piece of static world geometry.
///
/// Callers pass a set of these to sweeps to exclude the avatar's own collision volumes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct BarrierId(pub u32);

/// First surface touched by a sweep.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hit {
    /// Position of the swept shape's center at the moment of impact.
    pub pos: Vec3<f32>,
    /// Outward surface normal at the impact point.
    pub normal: Vec3<f32>,
    /// Distance travelled from the sweep's start to `pos`.
    pub dist: f32,
    /// Which piece of geometry was hit.
    pub barrier: BarrierId,
}

/// Static world geometry which supports swept intersection queries.
///
/// Queries are read-only and may be made many times within a single tick.
pub trait WorldGeometry {
    /// Sweep a sphere of the given radius from `start` to `end` and return the first hit, ignoring
    /// any barriers in `ignore`.
    fn sweep_sphere(
        &self,
        start: Vec3<f32>,
        end: Vec3<f32>,
        radius: f32,
        ignore: &[BarrierId],
    ) -> Option<Hit>;

    /// Sweep a ray from `start` to `end` and return the first hit, ignoring any barriers in
    /// `ignore`.
    fn sweep_ray(
        &self,
        start: Vec3<f32>,
        end: Vec3<f32>,
        ignore: &[BarrierId],
    ) -> Option<Hit> {
        self.sweep_sphere(start, end, 0.0, ignore)
    }
}

impl<'a, W: WorldGeometry + ?Sized> WorldGeometry for &'a W {
    fn sweep_sphere(
        &self,
        start: Vec3<f32>,
        end: Vec3<f32>,
        radius: f32,
        ignore: &[BarrierId],
    ) -> Option<Hit> {
        (**self).sweep_sphere(start, end, radius, ignore)
    }

    fn sweep_ray(
        &self,
        start: Vec3<f32>,
        end: Vec3<f32>,
        ignore: &[BarrierId],
    ) -> Option<Hit> {
        (**self).sweep_ray(start, end, ignore)
    }
}
