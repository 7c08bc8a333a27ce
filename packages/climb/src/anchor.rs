//! Interfaces through which locomotion affects things it doesn't own.

use crate::hand::HandSide;
use vek::*;


/// The externally owned rigid body representing the player's torso and head.
///
/// Locomotion only ever moves it by translating it or by setting its linear velocity.
pub trait BodyAnchor {
    fn position(&self) -> Vec3<f32>;

    fn linear_velocity(&self) -> Vec3<f32>;

    fn set_linear_velocity(&mut self, vel: Vec3<f32>);

    fn translate_by(&mut self, delta: Vec3<f32>);
}

/// Visual representation of a hand, which is told where the resolved hand is each tick.
pub trait HandProxy {
    fn set_proxy_position(&mut self, side: HandSide, pos: Vec3<f32>);
}

impl<F: FnMut(HandSide, Vec3<f32>)> HandProxy for F {
    fn set_proxy_position(&mut self, side: HandSide, pos: Vec3<f32>) {
        self(side, pos)
    }
}


/// Minimal body anchor which just stores a position and velocity.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct KinematicBody {
    pub pos: Vec3<f32>,
    pub vel: Vec3<f32>,
}

impl KinematicBody {
    pub fn new(pos: Vec3<f32>) -> Self {
        KinematicBody {
            pos,
            vel: Vec3::zero(),
        }
    }

    /// Drift along the current velocity for `dt` seconds, under `gravity` pulling toward -Z.
    pub fn advance(&mut self, dt: f32, gravity: f32) {
        self.vel.z -= gravity * dt;
        self.pos += self.vel * dt;
    }
}

impl BodyAnchor for KinematicBody {
    fn position(&self) -> Vec3<f32> {
        self.pos
    }

    fn linear_velocity(&self) -> Vec3<f32> {
        self.vel
    }

    fn set_linear_velocity(&mut self, vel: Vec3<f32>) {
        self.vel = vel;
    }

    fn translate_by(&mut self, delta: Vec3<f32>) {
        self.pos += delta;
    }
}


#[test]
fn test_kinematic_body() {
    let mut body = KinematicBody::new(Vec3::new(0.0, 0.0, 10.0));
    body.translate_by(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(body.position(), Vec3::new(1.0, 2.0, 13.0));
    body.set_linear_velocity(Vec3::new(10.0, 0.0, 0.0));
    body.advance(0.5, 0.0);
    assert_eq!(body.position(), Vec3::new(6.0, 2.0, 13.0));
    body.advance(1.0, 2.0);
    assert_eq!(body.linear_velocity(), Vec3::new(10.0, 0.0, -2.0));
}

#[test]
fn test_closure_hand_proxy() {
    let mut published = Vec::new();
    {
        let mut proxy = |side: HandSide, pos: Vec3<f32>| published.push((side, pos));
        proxy.set_proxy_position(HandSide::Left, Vec3::new(1.0, 0.0, 0.0));
    }
    assert_eq!(published, vec![(HandSide::Left, Vec3::new(1.0, 0.0, 0.0))]);
}
