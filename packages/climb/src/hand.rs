//! Per-hand grip state machine.
//!
//! Each hand is a small sphere which is dragged toward its controller's target position through
//! the world. A hand which touches world geometry "grips" it, and from then on the difference
//! between where the controller is and where the hand is stuck becomes body movement. A gripping
//! hand lets go once its controller has moved far enough away from the contact and there's a
//! clear path from the body to the controller.

use crate::{
    physics::{
        world_geometry::WorldGeometry,
        sweep_slide::SweepSlide,
    },
    util_vec::safe_normal,
};
use std::ops::{
    Index,
    IndexMut,
};
use serde::{Serialize, Deserialize};
use vek::*;


/// Which hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HandSide {
    Left,
    Right,
}

pub const NUM_HAND_SIDES: usize = 2;

/// Storage of `T` for each hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct PerHand<T>(pub [T; NUM_HAND_SIDES]);

/// Both hands, in the order they're processed each tick.
pub const HAND_SIDES: PerHand<HandSide> = PerHand([HandSide::Left, HandSide::Right]);

impl<T> PerHand<T> {
    pub fn new(left: T, right: T) -> Self {
        PerHand([left, right])
    }

    pub fn map<B, F>(self, f: F) -> PerHand<B>
    where
        F: FnMut(T) -> B,
    {
        PerHand(self.0.map(f))
    }

    pub fn iter(&self) -> impl Iterator<Item=&T> {
        self.0.iter()
    }
}

impl<T: Clone> PerHand<T> {
    pub fn repeat(val: T) -> Self {
        PerHand([val.clone(), val])
    }
}

impl<T> Index<HandSide> for PerHand<T> {
    type Output = T;

    fn index(&self, i: HandSide) -> &Self::Output {
        &self.0[i as usize]
    }
}

impl<T> IndexMut<HandSide> for PerHand<T> {
    fn index_mut(&mut self, i: HandSide) -> &mut Self::Output {
        &mut self.0[i as usize]
    }
}

impl<T> IntoIterator for PerHand<T> {
    type Item = T;
    type IntoIter = <[T; NUM_HAND_SIDES] as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}


/// World-space pose of a tracked hand controller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HandPose {
    pub pos: Vec3<f32>,
    pub rot: Quaternion<f32>,
}

impl HandPose {
    /// Pose at `pos` with identity rotation.
    pub fn at(pos: Vec3<f32>) -> Self {
        HandPose {
            pos,
            rot: Quaternion::identity(),
        }
    }

    /// Where the hand wants to be this tick: the controller position plus `offset` rotated into
    /// world space, clamped to within `max_arm_length` of `head`.
    pub fn target(self, offset: Vec3<f32>, head: Vec3<f32>, max_arm_length: f32) -> Vec3<f32> {
        clamp_to_reach(self.pos + self.rot * offset, head, max_arm_length)
    }
}

/// Clamp `pos` to a sphere of radius `max_arm_length` around `head`.
pub fn clamp_to_reach(pos: Vec3<f32>, head: Vec3<f32>, max_arm_length: f32) -> Vec3<f32> {
    let offset = pos - head;
    if offset.magnitude() < max_arm_length {
        pos
    } else {
        head + safe_normal(offset) * max_arm_length
    }
}


/// Grip state of a hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GripState {
    /// Not touching anything.
    Free,
    /// Touching world geometry and driving body motion.
    Gripping,
}

/// Result of `Hand::check_unstick`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Unstick {
    /// Hand wasn't gripping in the first place.
    NotGripping,
    /// Hand's target is still within the unstick distance of its contact.
    WithinDistance,
    /// Hand's target is far enough away, but something is between it and the body.
    Obstructed,
    /// Hand let go and snapped to its target.
    Released,
}

/// Contact state of one hand. Persists across ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    side: HandSide,
    /// Resolved position as of the last resolution.
    pos: Vec3<f32>,
    /// Most recent position at which the resolver reported contact.
    last_contact: Option<Vec3<f32>>,
    colliding: bool,
    was_colliding: bool,
}

impl Hand {
    /// Free hand at `pos`.
    pub fn new(side: HandSide, pos: Vec3<f32>) -> Self {
        Hand {
            side,
            pos,
            last_contact: None,
            colliding: false,
            was_colliding: false,
        }
    }

    pub fn side(&self) -> HandSide {
        self.side
    }

    /// Resolved hand position, which is what should be displayed.
    pub fn pos(&self) -> Vec3<f32> {
        self.pos
    }

    pub fn last_contact(&self) -> Option<Vec3<f32>> {
        self.last_contact
    }

    pub fn is_colliding(&self) -> bool {
        self.colliding
    }

    pub fn was_colliding(&self) -> bool {
        self.was_colliding
    }

    pub fn state(&self) -> GripState {
        if self.colliding {
            GripState::Gripping
        } else {
            GripState::Free
        }
    }

    /// Whether this hand is gripping this tick or was gripping last tick.
    pub fn grip_engaged(&self) -> bool {
        self.colliding || self.was_colliding
    }

    /// Start a new tick. Contact has to be re-established every tick.
    pub fn begin_tick(&mut self) {
        self.colliding = false;
    }

    /// Finish a tick, remembering whether the hand ended it gripping.
    pub fn end_tick(&mut self) {
        self.was_colliding = self.colliding;
    }

    /// Detect whether the hand grips something on its way to `target`, with the given gravity
    /// bias added to its movement.
    ///
    /// Returns the body displacement this hand asks for, which is zero unless it grips. A hand
    /// which was already gripping holds the body at its previous position, whereas a fresh grip
    /// holds it where the hand just landed.
    pub fn detect_grip<W: WorldGeometry + ?Sized>(
        &mut self,
        resolver: &SweepSlide<W>,
        target: Vec3<f32>,
        gravity_bias: Vec3<f32>,
    ) -> Vec3<f32> {
        let resolved = resolver.resolve(self.pos, target - self.pos + gravity_bias);
        if !resolved.hit {
            return Vec3::zero();
        }

        self.colliding = true;
        self.last_contact = Some(resolved.pos);
        if self.was_colliding {
            self.pos - target
        } else {
            trace!(side = ?self.side, pos = ?resolved.pos, "hand grabbed");
            resolved.pos - target
        }
    }

    /// Move the hand toward `target` along this tick's displacement only, staying pinned to any
    /// surface it touches.
    pub fn settle<W: WorldGeometry + ?Sized>(
        &mut self,
        resolver: &SweepSlide<W>,
        target: Vec3<f32>,
    ) {
        let resolved = resolver.resolve(self.pos, target - self.pos);
        if resolved.hit {
            self.pos = resolved.pos;
            self.last_contact = Some(resolved.pos);
            self.colliding = true;
        } else {
            self.pos = target;
        }
    }

    /// Let go of the surface if the target has moved more than `unstick_distance` away from the
    /// contact and nothing obstructs the path from `body` to the target.
    pub fn check_unstick<W: WorldGeometry + ?Sized>(
        &mut self,
        resolver: &SweepSlide<W>,
        body: Vec3<f32>,
        target: Vec3<f32>,
        unstick_distance: f32,
    ) -> Unstick {
        if !self.colliding {
            return Unstick::NotGripping;
        }
        if (target - self.pos).magnitude() <= unstick_distance {
            return Unstick::WithinDistance;
        }
        if resolver.line_of_sight(body, target).is_some() {
            return Unstick::Obstructed;
        }

        trace!(side = ?self.side, "hand released");
        self.colliding = false;
        self.pos = target;
        Unstick::Released
    }
}


#[cfg(test)]
use crate::{
    physics::{
        aa_box::AaBox,
        box_world::BoxWorld,
    },
    settings::Settings,
};
#[cfg(test)]
use std::f32::consts::FRAC_PI_2;

/// Ground whose top surface is the plane z = -50.
#[cfg(test)]
fn ground() -> BoxWorld {
    BoxWorld::new()
        .with(AaBox::from_corners(Vec3::new(-500.0, -500.0, -150.0), Vec3::new(500.0, 500.0, -50.0)))
}

#[cfg(test)]
fn gripping_hand(resolver: &SweepSlide<BoxWorld>) -> Hand {
    let mut hand = Hand::new(HandSide::Left, Vec3::new(30.0, 0.0, -40.0));
    hand.begin_tick();
    let target = Vec3::new(30.0, 0.0, -60.0);
    hand.detect_grip(resolver, target, Vec3::zero());
    hand.settle(resolver, target);
    assert!(hand.is_colliding());
    hand
}

#[test]
fn test_clamp_to_reach() {
    let clamped = clamp_to_reach(Vec3::new(160.0, 0.0, 0.0), Vec3::zero(), 150.0);
    assert!((clamped - Vec3::new(150.0, 0.0, 0.0)).magnitude() < 1e-4);

    let inside = Vec3::new(30.0, -40.0, 20.0);
    assert_eq!(clamp_to_reach(inside, Vec3::zero(), 150.0), inside);

    let head = Vec3::new(10.0, 10.0, 170.0);
    let clamped = clamp_to_reach(Vec3::new(10.0, 10.0, -200.0), head, 150.0);
    assert!((clamped - Vec3::new(10.0, 10.0, 20.0)).magnitude() < 1e-3);
}

#[test]
fn test_target_applies_rotated_offset() {
    let pose = HandPose {
        pos: Vec3::new(20.0, 0.0, 0.0),
        rot: Quaternion::rotation_z(FRAC_PI_2),
    };
    let target = pose.target(Vec3::new(10.0, 0.0, 0.0), Vec3::zero(), 150.0);
    assert!((target - Vec3::new(20.0, 10.0, 0.0)).magnitude() < 1e-4);
}

#[test]
fn test_per_hand_indexing() {
    let mut per = PerHand::repeat(0);
    per[HandSide::Right] = 7;
    assert_eq!(per.0, [0, 7]);
    assert_eq!(HAND_SIDES.map(|side| per[side] + 1), PerHand::new(1, 8));
}

#[test]
fn test_free_flight_passthrough() {
    let world = ground();
    let resolver = SweepSlide::new(&world, &[], &Settings::default());
    let mut hand = Hand::new(HandSide::Right, Vec3::new(0.0, 0.0, 0.0));
    let target = Vec3::new(12.0, -5.0, 8.0);
    hand.begin_tick();
    let contribution = hand.detect_grip(&resolver, target, Vec3::new(0.0, 0.0, -0.25));
    hand.settle(&resolver, target);
    assert_eq!(contribution, Vec3::zero());
    assert!(!hand.is_colliding());
    assert_eq!(hand.state(), GripState::Free);
    assert_eq!(hand.pos(), target);
    assert_eq!(hand.last_contact(), None);
}

#[test]
fn test_fresh_grip_pushes_body_away_from_surface() {
    let world = ground();
    let resolver = SweepSlide::new(&world, &[], &Settings::default());
    let mut hand = Hand::new(HandSide::Left, Vec3::new(30.0, 0.0, -40.0));
    hand.begin_tick();
    let target = Vec3::new(30.0, 0.0, -60.0);
    let contribution = hand.detect_grip(&resolver, target, Vec3::zero());
    assert!(hand.is_colliding());
    // hand stayed above the ground, so the body has to rise by about the distance the
    // controller sank
    assert!(contribution.z > 15.0 && contribution.z < 20.5, "{:?}", contribution);
    assert!(contribution.x.abs() < 1e-3 && contribution.y.abs() < 1e-3);

    hand.settle(&resolver, target);
    assert!(hand.pos().z > -45.0);
    assert_eq!(hand.last_contact(), Some(hand.pos()));
}

#[test]
fn test_held_grip_uses_previous_position() {
    let world = ground();
    let resolver = SweepSlide::new(&world, &[], &Settings::default());
    let mut hand = gripping_hand(&resolver);
    hand.end_tick();
    let held = hand.pos();

    hand.begin_tick();
    let target = held + Vec3::new(0.0, 0.0, -15.0);
    let contribution = hand.detect_grip(&resolver, target, Vec3::zero());
    assert!((contribution - (held - target)).magnitude() < 1e-5);
}

#[test]
fn test_unstick_requires_distance() {
    let world = ground();
    let resolver = SweepSlide::new(&world, &[], &Settings::default());
    let mut hand = gripping_hand(&resolver);
    let held = hand.pos();

    // clear path, but not far enough
    let target = held + Vec3::new(0.0, 0.0, 5.0);
    let body = Vec3::new(0.0, 0.0, 20.0);
    assert_eq!(hand.check_unstick(&resolver, body, target, 10.0), Unstick::WithinDistance);
    assert!(hand.is_colliding());
    assert_eq!(hand.pos(), held);
}

#[test]
fn test_unstick_requires_clear_path() {
    let world = ground();
    let resolver = SweepSlide::new(&world, &[], &Settings::default());
    let mut hand = gripping_hand(&resolver);
    let held = hand.pos();

    // far enough, but the ground is in the way
    let target = Vec3::new(30.0, 0.0, -80.0);
    let body = Vec3::new(0.0, 0.0, 20.0);
    assert_eq!(hand.check_unstick(&resolver, body, target, 10.0), Unstick::Obstructed);
    assert!(hand.is_colliding());
    assert_eq!(hand.pos(), held);
}

#[test]
fn test_unstick_releases() {
    let world = ground();
    let resolver = SweepSlide::new(&world, &[], &Settings::default());
    let mut hand = gripping_hand(&resolver);

    let target = Vec3::new(30.0, 0.0, -20.0);
    let body = Vec3::new(0.0, 0.0, 20.0);
    assert_eq!(hand.check_unstick(&resolver, body, target, 10.0), Unstick::Released);
    assert!(!hand.is_colliding());
    assert_eq!(hand.pos(), target);

    assert_eq!(hand.check_unstick(&resolver, body, target, 10.0), Unstick::NotGripping);
}
