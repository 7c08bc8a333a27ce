//! Iterative sphere sweep which stops against world geometry and slides a little along it.

use super::world_geometry::{
    WorldGeometry,
    BarrierId,
    Hit,
};
use crate::{
    settings::Settings,
    util_vec::{
        safe_normal,
        is_nearly_zero,
        project_on_plane,
    },
};
use vek::*;


/// Scale applied to the probe radius (and precision) for the anti-tunneling retry after the
/// first probe misses.
const RETRY_SCALE: f32 = 0.66;

/// Sweep-and-slide movement resolver for a sphere, borrowing the world geometry for the duration
/// of a tick.
#[derive(Debug)]
pub struct SweepSlide<'a, W: ?Sized> {
    pub world: &'a W,
    /// Barriers to pass through, such as the avatar's own collision volumes.
    pub ignore: &'a [BarrierId],
    /// Radius of the swept sphere.
    pub radius: f32,
    /// Probe strictness in (0, 1]. Squared and cubed at deeper probes.
    pub precision: f32,
    /// Fraction of the movement remaining after a hit which is redirected along the hit surface.
    pub slide_factor: f32,
}

/// Result of `SweepSlide::resolve`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Resolved {
    /// Where the sphere ends up. If nothing was hit, this is the unobstructed end position.
    pub pos: Vec3<f32>,
    /// Whether the sphere came into contact with the world.
    pub hit: bool,
}

/// Result of a single validated collision sweep.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Contact {
    /// Position the sphere is allowed to move to.
    pos: Vec3<f32>,
    /// Hit that determined `pos`.
    hit: Hit,
}

impl<'a, W: WorldGeometry + ?Sized> SweepSlide<'a, W> {
    pub fn new(world: &'a W, ignore: &'a [BarrierId], settings: &Settings) -> Self {
        SweepSlide {
            world,
            ignore,
            radius: settings.min_probe_radius,
            precision: settings.precision,
            slide_factor: settings.slide_factor,
        }
    }

    /// Resolve moving the sphere from `start` by `movement` with the configured radius and
    /// precision.
    pub fn resolve(&self, start: Vec3<f32>, movement: Vec3<f32>) -> Resolved {
        self.resolve_with(start, self.radius, movement, self.precision)
    }

    /// Resolve moving a sphere of `radius` from `start` by `movement`.
    ///
    /// Makes at most three collision probes: one along the full movement, then on a hit one
    /// along the slide vector and one from the slid position toward the original destination,
    /// returning on the first of the latter two which hits. If the first probe misses, one
    /// smaller probe guards against tunneling through thin geometry.
    ///
    /// Zero movement never hits anything.
    pub fn resolve_with(
        &self,
        start: Vec3<f32>,
        radius: f32,
        movement: Vec3<f32>,
        precision: f32,
    ) -> Resolved {
        if is_nearly_zero(movement) {
            return Resolved {
                pos: start,
                hit: false,
            };
        }

        let target = start + movement;

        if let Some(first) = self.collision_sweep(start, radius * precision, movement, precision) {
            let slide = project_on_plane(target - first.pos, first.hit.normal) * self.slide_factor;
            let slid = first.pos + slide;

            let probes = [
                (first.pos, slide, precision.powi(2)),
                (slid, target - slid, precision.powi(3)),
            ];
            for (probe_start, probe_movement, probe_precision) in probes {
                if is_nearly_zero(probe_movement) {
                    continue;
                }
                if let Some(contact) = self.collision_sweep(
                    probe_start,
                    radius,
                    probe_movement,
                    probe_precision,
                ) {
                    return Resolved {
                        pos: contact.pos,
                        hit: true,
                    };
                }
            }

            trace!("slide probes found no contact, backing off to first contact");
            return Resolved {
                pos: first.pos,
                hit: true,
            };
        }

        let retry_radius = radius * precision * RETRY_SCALE;
        let retry_movement =
            safe_normal(movement) * (movement.magnitude() + radius * precision * (1.0 - RETRY_SCALE));
        if self
            .collision_sweep(start, retry_radius, retry_movement, precision * RETRY_SCALE)
            .is_some()
        {
            trace!("anti-tunneling retry hit, pinning at start");
            return Resolved {
                pos: start,
                hit: true,
            };
        }

        Resolved {
            pos: target,
            hit: false,
        }
    }

    /// Sweep a sphere of `radius * precision` and validate the resulting position.
    ///
    /// On hit, the candidate position is one radius off the hit along its normal. That candidate
    /// is re-checked with a tighter sphere sweep and a ray sweep from `start`, since against
    /// concave geometry it may itself penetrate a neighboring surface. If the sphere misses
    /// entirely, a ray sweep guards against having clipped through something.
    fn collision_sweep(
        &self,
        start: Vec3<f32>,
        radius: f32,
        movement: Vec3<f32>,
        precision: f32,
    ) -> Option<Contact> {
        let end = start + movement;

        if let Some(hit) = self.world.sweep_sphere(start, end, radius * precision, self.ignore) {
            let candidate = hit.pos + hit.normal * radius;

            let validation_radius = radius * precision * precision;
            if let Some(inner) = self.world.sweep_sphere(start, candidate, validation_radius, self.ignore) {
                let backoff = f32::max(0.0, hit.dist - radius * (1.0 - precision * precision));
                return Some(Contact {
                    pos: start + safe_normal(candidate - start) * backoff,
                    hit: inner,
                });
            }
            if let Some(inner) = self.world.sweep_ray(start, candidate, self.ignore) {
                return Some(Contact {
                    pos: start,
                    hit: inner,
                });
            }
            return Some(Contact {
                pos: candidate,
                hit,
            });
        }

        self.world
            .sweep_ray(start, end, self.ignore)
            .map(|hit| Contact {
                pos: start,
                hit,
            })
    }

    /// Sweep a probe-sized sphere from `from` toward `to`, stopping one radius short of `to`, and
    /// return whatever obstructs it.
    pub fn line_of_sight(&self, from: Vec3<f32>, to: Vec3<f32>) -> Option<Hit> {
        let offset = to - from;
        let dist = f32::max(0.0, offset.magnitude() - self.radius);
        let end = from + safe_normal(offset) * dist;
        self.world.sweep_sphere(from, end, self.radius * self.precision, self.ignore)
    }
}


#[cfg(test)]
use crate::physics::{
    aa_box::AaBox,
    box_world::BoxWorld,
};
#[cfg(test)]
use rand::prelude::*;
#[cfg(test)]
use rand_pcg::Pcg32;
#[cfg(test)]
use std::cell::Cell;

/// Geometry wrapper which counts queries.
#[cfg(test)]
struct Counting<W> {
    inner: W,
    queries: Cell<usize>,
}

#[cfg(test)]
impl<W: WorldGeometry> WorldGeometry for Counting<W> {
    fn sweep_sphere(
        &self,
        start: Vec3<f32>,
        end: Vec3<f32>,
        radius: f32,
        ignore: &[BarrierId],
    ) -> Option<Hit> {
        self.queries.set(self.queries.get() + 1);
        self.inner.sweep_sphere(start, end, radius, ignore)
    }
}

#[cfg(test)]
fn wall_world() -> BoxWorld {
    // wall whose near face is the plane x = 20
    BoxWorld::new()
        .with(AaBox::from_corners(Vec3::new(20.0, -500.0, -500.0), Vec3::new(120.0, 500.0, 500.0)))
}

#[cfg(test)]
fn resolver<'a>(world: &'a BoxWorld) -> SweepSlide<'a, BoxWorld> {
    SweepSlide::new(world, &[], &Settings::default())
}

#[test]
fn test_zero_movement_never_hits() {
    let world = wall_world();
    let resolver = resolver(&world);
    for start in [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(14.0, 0.0, 0.0),
        Vec3::new(19.0, 3.0, -2.0),
        // inside the wall
        Vec3::new(40.0, 0.0, 0.0),
    ] {
        let resolved = resolver.resolve(start, Vec3::zero());
        assert_eq!(resolved, Resolved { pos: start, hit: false });
    }
}

#[test]
fn test_free_movement_passes_through() {
    let world = BoxWorld::new();
    let resolver = resolver(&world);
    let resolved = resolver.resolve(Vec3::new(1.0, 2.0, 3.0), Vec3::new(10.0, -4.0, 0.5));
    assert!(!resolved.hit);
    assert_eq!(resolved.pos, Vec3::new(11.0, -2.0, 3.5));
}

#[test]
fn test_head_on_stops_short_of_wall() {
    let world = wall_world();
    let resolver = resolver(&world);
    let resolved = resolver.resolve(Vec3::zero(), Vec3::new(40.0, 0.0, 0.0));
    assert!(resolved.hit);
    assert!(resolved.pos.x < 15.0);
    assert!(resolved.pos.x > 5.0);
    assert!(resolved.pos.y.abs() < 1e-4);
    assert!(resolved.pos.z.abs() < 1e-4);
}

#[test]
fn test_oblique_movement_slides_along_wall() {
    let world = wall_world();
    let resolver = resolver(&world);
    let movement = Vec3::new(40.0, 20.0, 0.0);
    let resolved = resolver.resolve(Vec3::zero(), movement);
    assert!(resolved.hit);
    assert!(resolved.pos.x < 15.0);
    // the first contact is where the straight path meets the wall, at y = 7.525. sliding
    // carries the sphere further along it.
    assert!(resolved.pos.y > 7.6);
    assert!(resolved.pos.y < 20.0);
}

#[test]
fn test_movement_parallel_to_wall_is_unobstructed() {
    let world = wall_world();
    let resolver = resolver(&world);
    let resolved = resolver.resolve(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 30.0, 0.0));
    assert!(!resolved.hit);
    assert_eq!(resolved.pos, Vec3::new(10.0, 30.0, 0.0));
}

#[test]
fn test_ignored_barrier_is_passed_through() {
    let world = wall_world();
    let ignore = [BarrierId(0)];
    let resolver = SweepSlide::new(&world, &ignore, &Settings::default());
    let resolved = resolver.resolve(Vec3::zero(), Vec3::new(40.0, 0.0, 0.0));
    assert!(!resolved.hit);
}

#[test]
fn test_line_of_sight() {
    let world = wall_world();
    let resolver = resolver(&world);
    assert!(resolver.line_of_sight(Vec3::zero(), Vec3::new(0.0, 50.0, 0.0)).is_none());
    assert!(resolver.line_of_sight(Vec3::zero(), Vec3::new(60.0, 0.0, 0.0)).is_some());
    // target within one radius of the source
    assert!(resolver.line_of_sight(Vec3::zero(), Vec3::new(3.0, 0.0, 0.0)).is_none());
}

#[test]
fn test_query_count_is_bounded() {
    let world = Counting {
        inner: BoxWorld::new()
            .with(AaBox::from_corners(Vec3::new(20.0, -500.0, -500.0), Vec3::new(120.0, 500.0, 500.0)))
            .with(AaBox::from_corners(Vec3::new(-500.0, -500.0, -120.0), Vec3::new(500.0, 500.0, -20.0))),
        queries: Cell::new(0),
    };
    let resolver = SweepSlide::new(&world, &[], &Settings::default());
    let mut rng = Pcg32::seed_from_u64(0x5eed);
    for _ in 0..2000 {
        let start = Vec3::new(
            rng.gen_range(-30.0..15.0),
            rng.gen_range(-30.0..30.0),
            rng.gen_range(-15.0..30.0),
        );
        let movement = Vec3::new(
            rng.gen_range(-40.0..40.0),
            rng.gen_range(-40.0..40.0),
            rng.gen_range(-40.0..40.0),
        );
        world.queries.set(0);
        let resolved = resolver.resolve(start, movement);
        assert!(world.queries.get() <= 9, "{} queries", world.queries.get());
        assert!(resolved.pos.x.is_finite() && resolved.pos.y.is_finite() && resolved.pos.z.is_finite());
    }
}
