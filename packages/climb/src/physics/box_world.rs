//! Simple world geometry made of axis-aligned boxes.

use super::{
    aa_box::AaBox,
    world_geometry::{
        WorldGeometry,
        BarrierId,
        Hit,
    },
};
use vek::*;


/// World geometry consisting of a flat list of axis-aligned boxes, with no broadphase.
///
/// Sphere sweeps are done by sweeping a ray against each box expanded by the sphere radius. This
/// treats the rounded edges and corners of the true Minkowski sum as sharp, so a sphere passing
/// diagonally close by a box edge may be reported as hitting slightly early.
#[derive(Debug, Clone, Default)]
pub struct BoxWorld {
    boxes: Vec<AaBox>,
}

impl BoxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a box, returning its barrier ID.
    pub fn add(&mut self, aa_box: AaBox) -> BarrierId {
        let id = BarrierId(self.boxes.len() as u32);
        self.boxes.push(aa_box);
        id
    }

    /// Builder-style `add`.
    pub fn with(mut self, aa_box: AaBox) -> Self {
        self.add(aa_box);
        self
    }
}

impl WorldGeometry for BoxWorld {
    fn sweep_sphere(
        &self,
        start: Vec3<f32>,
        end: Vec3<f32>,
        radius: f32,
        ignore: &[BarrierId],
    ) -> Option<Hit> {
        let delta = end - start;
        let mut first: Option<(f32, Vec3<f32>, BarrierId)> = None;

        for (i, &aa_box) in self.boxes.iter().enumerate() {
            let barrier = BarrierId(i as u32);
            if ignore.contains(&barrier) {
                continue;
            }

            if let Some(entry) = aa_box.expand(radius.max(0.0)).segment_entry(start, delta) {
                if first
                    .map(|(t, _, _)| entry.t < t)
                    .unwrap_or(true)
                {
                    first = Some((entry.t, entry.normal, barrier));
                }
            }
        }

        first.map(|(t, normal, barrier)| Hit {
            pos: start + delta * t,
            normal,
            dist: delta.magnitude() * t,
            barrier,
        })
    }
}


#[test]
fn test_sweep_sphere_stops_one_radius_short() {
    let world = BoxWorld::new()
        .with(AaBox::from_corners(Vec3::new(20.0, -50.0, -50.0), Vec3::new(30.0, 50.0, 50.0)));
    let hit = world
        .sweep_sphere(Vec3::zero(), Vec3::new(40.0, 0.0, 0.0), 5.0, &[])
        .unwrap();
    assert!((hit.pos.x - 15.0).abs() < 1e-4);
    assert!((hit.dist - 15.0).abs() < 1e-4);
    assert_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0));
    assert_eq!(hit.barrier, BarrierId(0));
}

#[test]
fn test_sweep_picks_nearest_and_respects_ignore() {
    let mut world = BoxWorld::new();
    let far = world.add(AaBox::from_corners(Vec3::new(50.0, -5.0, -5.0), Vec3::new(60.0, 5.0, 5.0)));
    let near = world.add(AaBox::from_corners(Vec3::new(20.0, -5.0, -5.0), Vec3::new(30.0, 5.0, 5.0)));

    let hit = world.sweep_ray(Vec3::zero(), Vec3::new(100.0, 0.0, 0.0), &[]).unwrap();
    assert_eq!(hit.barrier, near);

    let hit = world.sweep_ray(Vec3::zero(), Vec3::new(100.0, 0.0, 0.0), &[near]).unwrap();
    assert_eq!(hit.barrier, far);

    assert!(world.sweep_ray(Vec3::zero(), Vec3::new(100.0, 0.0, 0.0), &[near, far]).is_none());
}
