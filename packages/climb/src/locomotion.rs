//! Per-tick driver which turns hand grips into body movement.
//!
//! Each tick:
//!
//! 1. Both hands' targets are computed from their controller poses, clamped to arm's reach.
//! 2. Each hand is swept toward its target with a little extra fall added, and any hand which
//!    grips something asks for the body to move so as to keep the hand where it gripped.
//! 3. The requests are combined. If both hands are involved they're averaged, so two hands
//!    gripping the same wall don't double the motion.
//! 4. Each hand is swept toward its target again without the extra fall, which gives the
//!    position it's shown at.
//! 5. The body's position feeds the velocity history.
//! 6. If any hand is gripping, the body either gets thrown (if it's moving fast enough, and not
//!    downwards) or moved by the combined request.
//! 7. Gripping hands which have been pulled far enough away, with nothing in between them and
//!    the body, let go.
//! 8. Hand proxies are told where their hands are.
//! 9. Each hand remembers whether it ended the tick gripping.

use crate::{
    anchor::{
        BodyAnchor,
        HandProxy,
    },
    hand::{
        Hand,
        HandPose,
        HandSide,
        PerHand,
        Unstick,
        HAND_SIDES,
    },
    physics::{
        world_geometry::{
            WorldGeometry,
            BarrierId,
        },
        sweep_slide::SweepSlide,
    },
    settings::{
        Settings,
        JumpPolicy,
    },
    util_vec::clamp_magnitude,
    velocity_history::VelocityHistory,
};
use vek::*;
use anyhow::*;


/// The smoothed body velocity's Z component must be at least this for a throw to happen.
pub const MIN_JUMP_UPWARD_VELOCITY: f32 = 0.01;

/// Everything tracked about the avatar this tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TickInput {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Head position, which hand reach is measured from.
    pub head: Vec3<f32>,
    /// Controller poses. `None` if a controller isn't available this tick.
    pub hands: PerHand<Option<HandPose>>,
}

/// Why a tick was skipped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SkipReason {
    /// Delta time was zero, negative, or not finite.
    BadDeltaTime,
    /// No pose was available for this hand.
    MissingHand(HandSide),
}

/// What the tick did to the body.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Motion {
    /// Body was left alone.
    Idle,
    /// Body was moved by this amount and its velocity zeroed.
    Translated(Vec3<f32>),
    /// Body's velocity was set to this.
    Jumped(Vec3<f32>),
}

/// Outcome of `Locomotion::tick`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TickReport {
    /// Nothing was done and all state was left as it was.
    Skipped(SkipReason),
    Ran {
        motion: Motion,
        unstick: PerHand<Unstick>,
        /// Smoothed body velocity after this tick's sample.
        average_velocity: Vec3<f32>,
    },
}

impl TickReport {
    pub fn motion(&self) -> Option<Motion> {
        match *self {
            TickReport::Skipped(_) => None,
            TickReport::Ran { motion, .. } => Some(motion),
        }
    }
}

/// Climbing locomotion state for one avatar.
pub struct Locomotion {
    settings: Settings,
    /// The avatar's own collision volumes, which hands pass through.
    ignore: Vec<BarrierId>,
    hands: PerHand<Hand>,
    velocity: VelocityHistory,
    proxies: PerHand<Option<Box<dyn HandProxy>>>,
}

impl Locomotion {
    /// Set up locomotion with hands starting free at their controllers' positions.
    ///
    /// Errors if the settings are invalid.
    pub fn new<A: BodyAnchor + ?Sized>(
        settings: Settings,
        ignore: Vec<BarrierId>,
        hands: PerHand<HandPose>,
        anchor: &A,
    ) -> Result<Self> {
        settings.validate().context("invalid locomotion settings")?;
        let velocity = VelocityHistory::new(settings.velocity_history_size, anchor.position());
        let hands = initial_hands(hands);
        debug!(
            left = ?hands[HandSide::Left].pos(),
            right = ?hands[HandSide::Right].pos(),
            "initialized locomotion",
        );
        Ok(Locomotion {
            settings,
            ignore,
            hands,
            velocity,
            proxies: PerHand::new(None, None),
        })
    }

    /// Re-seed hand state and velocity history, as after a teleport.
    pub fn reinitialize<A: BodyAnchor + ?Sized>(
        &mut self,
        hands: PerHand<HandPose>,
        anchor: &A,
    ) {
        self.hands = initial_hands(hands);
        self.velocity.reset(anchor.position());
        debug!("reinitialized locomotion");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hand(&self, side: HandSide) -> &Hand {
        &self.hands[side]
    }

    /// Smoothed body velocity.
    pub fn average_velocity(&self) -> Vec3<f32> {
        self.velocity.average()
    }

    pub fn set_hand_proxy(&mut self, side: HandSide, proxy: Box<dyn HandProxy>) {
        self.proxies[side] = Some(proxy);
    }

    pub fn clear_hand_proxy(&mut self, side: HandSide) -> Option<Box<dyn HandProxy>> {
        self.proxies[side].take()
    }

    /// While disabled, hands still grip and slide but never move the body.
    pub fn set_movement_disabled(&mut self, disabled: bool) {
        self.settings.movement_disabled = disabled;
    }

    /// Raise or lower the jump threshold by `delta`, not going below zero. Returns the new
    /// threshold.
    pub fn adjust_jump_threshold(&mut self, delta: f32) -> f32 {
        let threshold = f32::max(self.settings.jump_velocity_threshold + delta, 0.0);
        self.settings.jump_velocity_threshold = threshold;
        info!(threshold, "jump velocity threshold changed");
        threshold
    }

    /// Run one tick of locomotion.
    pub fn tick<W, A>(
        &mut self,
        input: &TickInput,
        world: &W,
        anchor: &mut A,
    ) -> TickReport
    where
        W: WorldGeometry + ?Sized,
        A: BodyAnchor + ?Sized,
    {
        let dt = input.dt;
        if !(dt > 0.0) || !dt.is_finite() {
            warn!(dt, "skipping locomotion tick with unusable delta time");
            return TickReport::Skipped(SkipReason::BadDeltaTime);
        }
        let mut poses = PerHand::repeat(HandPose::at(Vec3::zero()));
        for side in HAND_SIDES {
            match input.hands[side] {
                Some(pose) => poses[side] = pose,
                None => {
                    warn!(?side, "skipping locomotion tick with hand missing");
                    return TickReport::Skipped(SkipReason::MissingHand(side));
                }
            }
        }

        let settings = &self.settings;
        let resolver = SweepSlide::new(world, &self.ignore, settings);

        let targets = HAND_SIDES.map(|side| poses[side].target(
            settings.hand_offset(side),
            input.head,
            settings.max_arm_length,
        ));

        // grip detection, biased toward surfaces the hands are falling into
        let gravity_bias = Vec3::new(0.0, 0.0, -2.0 * settings.gravity * dt * dt);
        let mut contributions = PerHand::repeat(Vec3::zero());
        for side in HAND_SIDES {
            let hand = &mut self.hands[side];
            hand.begin_tick();
            contributions[side] = hand.detect_grip(&resolver, targets[side], gravity_bias);
        }
        let engaged = HAND_SIDES.map(|side| self.hands[side].grip_engaged());
        let displacement = combine_contributions(engaged, contributions);

        for side in HAND_SIDES {
            self.hands[side].settle(&resolver, targets[side]);
        }

        let average = self.velocity.push(anchor.position(), dt);

        let colliding = self.hands.iter().any(Hand::is_colliding);
        let motion = if settings.movement_disabled || !colliding {
            Motion::Idle
        } else if average.z >= MIN_JUMP_UPWARD_VELOCITY
            && average.magnitude() > settings.jump_velocity_threshold
        {
            let vel = jump_velocity(settings, average, anchor.linear_velocity(), dt);
            anchor.set_linear_velocity(vel);
            debug!(?vel, "jumped");
            Motion::Jumped(vel)
        } else if displacement != Vec3::zero() {
            anchor.translate_by(displacement);
            anchor.set_linear_velocity(Vec3::zero());
            Motion::Translated(displacement)
        } else {
            Motion::Idle
        };

        let body = anchor.position();
        let mut unstick = PerHand::repeat(Unstick::NotGripping);
        for side in HAND_SIDES {
            unstick[side] = self.hands[side].check_unstick(
                &resolver,
                body,
                targets[side],
                settings.unstick_distance,
            );
        }

        for side in HAND_SIDES {
            let pos = self.hands[side].pos();
            match self.proxies[side].as_mut() {
                Some(proxy) => proxy.set_proxy_position(side, pos),
                None => trace!(?side, "no hand proxy attached"),
            }
            self.hands[side].end_tick();
        }

        TickReport::Ran {
            motion,
            unstick,
            average_velocity: average,
        }
    }
}

// hands start free at their controllers, unclamped. the first tick pulls them into reach.
fn initial_hands(poses: PerHand<HandPose>) -> PerHand<Hand> {
    HAND_SIDES.map(|side| Hand::new(side, poses[side].pos))
}

/// Combine the body displacements requested by each hand.
///
/// If both hands are engaged, the body follows their average. Otherwise at most one hand is
/// asking for anything, and the body follows it fully.
pub fn combine_contributions(
    engaged: PerHand<bool>,
    contributions: PerHand<Vec3<f32>>,
) -> Vec3<f32> {
    let sum = contributions[HandSide::Left] + contributions[HandSide::Right];
    if engaged[HandSide::Left] && engaged[HandSide::Right] {
        sum / 2.0
    } else {
        sum
    }
}

/// Launch velocity for a throw given the smoothed body velocity, per the configured policy.
pub fn jump_velocity(
    settings: &Settings,
    average: Vec3<f32>,
    current: Vec3<f32>,
    dt: f32,
) -> Vec3<f32> {
    let vel = match settings.jump_policy {
        JumpPolicy::DirectSet => average * settings.jump_multiplier,
        JumpPolicy::IncrementalImpulse => current + average * settings.jump_multiplier * dt,
    };
    clamp_magnitude(vel, settings.max_jump_speed)
}


#[cfg(test)]
use crate::{
    anchor::KinematicBody,
    physics::{
        aa_box::AaBox,
        box_world::BoxWorld,
    },
};
#[cfg(test)]
use std::{
    cell::RefCell,
    rc::Rc,
};

#[cfg(test)]
const DT: f32 = 1.0 / 90.0;

/// Ground whose top surface is the plane z = -50.
#[cfg(test)]
fn ground() -> BoxWorld {
    BoxWorld::new()
        .with(AaBox::from_corners(Vec3::new(-500.0, -500.0, -150.0), Vec3::new(500.0, 500.0, -50.0)))
}

/// Input with the head at the body and hands at the given body-relative positions.
#[cfg(test)]
fn input(body: &KinematicBody, left: Vec3<f32>, right: Vec3<f32>) -> TickInput {
    TickInput {
        dt: DT,
        head: body.pos,
        hands: PerHand::new(
            Some(HandPose::at(body.pos + left)),
            Some(HandPose::at(body.pos + right)),
        ),
    }
}

#[cfg(test)]
fn setup(settings: Settings, body: &KinematicBody, left: Vec3<f32>, right: Vec3<f32>) -> Locomotion {
    Locomotion::new(
        settings,
        Vec::new(),
        PerHand::new(HandPose::at(body.pos + left), HandPose::at(body.pos + right)),
        body,
    ).unwrap()
}

#[cfg(test)]
type Published = Rc<RefCell<Vec<(HandSide, Vec3<f32>)>>>;

#[cfg(test)]
fn attach_recorder(loco: &mut Locomotion, side: HandSide) -> Published {
    let published = Published::default();
    let published2 = Rc::clone(&published);
    loco.set_hand_proxy(side, Box::new(move |side: HandSide, pos: Vec3<f32>| {
        published2.borrow_mut().push((side, pos));
    }));
    published
}

#[cfg(test)]
const LEFT_START: Vec3<f32> = Vec3 { x: 30.0, y: 0.0, z: -40.0 };
#[cfg(test)]
const RIGHT_START: Vec3<f32> = Vec3 { x: -30.0, y: 0.0, z: 40.0 };

#[test]
fn test_invalid_settings_rejected() {
    let body = KinematicBody::default();
    let mut settings = Settings::default();
    settings.precision = 2.0;
    let result = Locomotion::new(
        settings,
        Vec::new(),
        PerHand::repeat(HandPose::at(Vec3::zero())),
        &body,
    );
    assert!(result.is_err());
}

#[test]
fn test_hand_target_clamped_to_reach() {
    let world = BoxWorld::new();
    let mut body = KinematicBody::default();
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);
    let report = loco.tick(
        &input(&body, Vec3::new(160.0, 0.0, 0.0), RIGHT_START),
        &world,
        &mut body,
    );
    assert_eq!(report.motion(), Some(Motion::Idle));
    let left = loco.hand(HandSide::Left).pos();
    assert!((left - Vec3::new(150.0, 0.0, 0.0)).magnitude() < 1e-3, "{:?}", left);
}

#[test]
fn test_free_flight_leaves_body_alone() {
    let world = BoxWorld::new();
    let mut body = KinematicBody::new(Vec3::new(5.0, 5.0, 5.0));
    body.vel = Vec3::new(0.0, 0.0, -100.0);
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);
    let left_log = attach_recorder(&mut loco, HandSide::Left);
    let right_log = attach_recorder(&mut loco, HandSide::Right);

    let left = Vec3::new(40.0, 10.0, -20.0);
    let right = Vec3::new(-40.0, 10.0, 20.0);
    let report = loco.tick(&input(&body, left, right), &world, &mut body);

    let TickReport::Ran { motion, unstick, .. } = report else {
        panic!("tick skipped: {:?}", report);
    };
    assert_eq!(motion, Motion::Idle);
    assert_eq!(unstick, PerHand::repeat(Unstick::NotGripping));
    assert_eq!(body.pos, Vec3::new(5.0, 5.0, 5.0));
    assert_eq!(body.vel, Vec3::new(0.0, 0.0, -100.0));
    for side in HAND_SIDES {
        assert!(!loco.hand(side).is_colliding());
    }
    assert_eq!(*left_log.borrow(), vec![(HandSide::Left, body.pos + left)]);
    assert_eq!(*right_log.borrow(), vec![(HandSide::Right, body.pos + right)]);
}

#[test]
fn test_missing_hand_skips_tick() {
    let world = ground();
    let mut body = KinematicBody::default();
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);
    let log = attach_recorder(&mut loco, HandSide::Left);
    let before = loco.hand(HandSide::Left).clone();

    let mut tick_input = input(&body, Vec3::new(30.0, 0.0, -60.0), RIGHT_START);
    tick_input.hands[HandSide::Right] = None;
    let report = loco.tick(&tick_input, &world, &mut body);

    assert_eq!(report, TickReport::Skipped(SkipReason::MissingHand(HandSide::Right)));
    assert_eq!(*loco.hand(HandSide::Left), before);
    assert_eq!(body, KinematicBody::default());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_bad_dt_skips_tick() {
    let world = ground();
    let mut body = KinematicBody::default();
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);
    for dt in [0.0, -DT, f32::NAN, f32::INFINITY] {
        let mut tick_input = input(&body, Vec3::new(30.0, 0.0, -60.0), RIGHT_START);
        tick_input.dt = dt;
        let report = loco.tick(&tick_input, &world, &mut body);
        assert_eq!(report, TickReport::Skipped(SkipReason::BadDeltaTime));
    }
    assert_eq!(loco.average_velocity(), Vec3::zero());
    assert_eq!(body, KinematicBody::default());
}

#[test]
fn test_symmetric_grips_cancel() {
    let a = Vec3::<f32>::new(3.0, -7.5, 12.0);
    let both = combine_contributions(PerHand::new(true, true), PerHand::new(a, -a));
    assert_eq!(both, Vec3::zero());

    let both = combine_contributions(PerHand::new(true, true), PerHand::new(a, a));
    assert_eq!(both, a);

    let one = combine_contributions(PerHand::new(false, true), PerHand::new(Vec3::zero(), a));
    assert_eq!(one, a);
}

#[test]
fn test_grip_pulls_body_up() {
    let world = ground();
    let mut body = KinematicBody::default();
    body.vel = Vec3::new(0.0, 0.0, -300.0);
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);

    // pull the left hand down into the ground
    let report = loco.tick(
        &input(&body, Vec3::new(30.0, 0.0, -60.0), RIGHT_START),
        &world,
        &mut body,
    );

    let TickReport::Ran { motion, unstick, .. } = report else {
        panic!("tick skipped: {:?}", report);
    };
    let Motion::Translated(delta) = motion else {
        panic!("expected translation, got {:?}", motion);
    };
    assert!(delta.z > 15.0 && delta.z < 20.5, "{:?}", delta);
    assert!(delta.x.abs() < 1e-3 && delta.y.abs() < 1e-3);
    assert_eq!(body.pos, delta);
    assert_eq!(body.vel, Vec3::zero());

    let left = loco.hand(HandSide::Left);
    assert!(left.is_colliding());
    assert!(left.pos().z > -45.0);
    // the controller is still deep in the ground from the body's point of view
    assert_eq!(unstick[HandSide::Left], Unstick::Obstructed);
    assert_eq!(unstick[HandSide::Right], Unstick::NotGripping);
    assert!(!loco.hand(HandSide::Right).is_colliding());
}

#[test]
fn test_movement_disabled_keeps_body_still() {
    let world = ground();
    let mut body = KinematicBody::default();
    let mut settings = Settings::default();
    settings.movement_disabled = true;
    let mut loco = setup(settings, &body, LEFT_START, RIGHT_START);

    let report = loco.tick(
        &input(&body, Vec3::new(30.0, 0.0, -60.0), RIGHT_START),
        &world,
        &mut body,
    );
    assert_eq!(report.motion(), Some(Motion::Idle));
    assert_eq!(body, KinematicBody::default());
    assert!(loco.hand(HandSide::Left).is_colliding());

    loco.set_movement_disabled(false);
    let report = loco.tick(
        &input(&body, Vec3::new(30.0, 0.0, -60.0), RIGHT_START),
        &world,
        &mut body,
    );
    assert!(matches!(report.motion(), Some(Motion::Translated(_))));
}

#[test]
fn test_missing_proxy_skips_only_that_hand() {
    let world = BoxWorld::new();
    let mut body = KinematicBody::default();
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);
    let right_log = attach_recorder(&mut loco, HandSide::Right);

    loco.tick(&input(&body, LEFT_START, RIGHT_START), &world, &mut body);
    assert_eq!(*right_log.borrow(), vec![(HandSide::Right, RIGHT_START)]);

    assert!(loco.clear_hand_proxy(HandSide::Right).is_some());
    loco.tick(&input(&body, LEFT_START, RIGHT_START), &world, &mut body);
    assert_eq!(right_log.borrow().len(), 1);
}

#[test]
fn test_jump_velocity_clamped() {
    let mut settings = Settings::default();
    settings.jump_velocity_threshold = 1000.0;
    settings.jump_multiplier = 100.0;
    settings.max_jump_speed = 1000.0;
    let average = Vec3::<f32>::new(0.0, 720.0, 960.0);
    assert!((average.magnitude() - 1200.0).abs() < 1e-3);

    let vel = jump_velocity(&settings, average, Vec3::zero(), DT);
    assert!((vel.magnitude() - 1000.0).abs() < 1e-2, "{:?}", vel);
    let dir = vel / vel.magnitude();
    assert!((dir - average / 1200.0).magnitude() < 1e-5);
}

#[test]
fn test_incremental_impulse_adds_to_current() {
    let mut settings = Settings::default();
    settings.jump_policy = JumpPolicy::IncrementalImpulse;
    settings.jump_multiplier = 10.0;
    settings.max_jump_speed = 1000.0;
    let current = Vec3::new(100.0, 0.0, 0.0);
    let average = Vec3::new(0.0, 0.0, 500.0);

    let vel = jump_velocity(&settings, average, current, 0.1);
    assert!((vel - Vec3::new(100.0, 0.0, 500.0)).magnitude() < 1e-3);

    settings.jump_multiplier = 100.0;
    let vel = jump_velocity(&settings, average, current, 0.1);
    assert!((vel.magnitude() - 1000.0).abs() < 1e-2);
}

#[test]
fn test_fast_pull_launches_body() {
    let world = ground();
    let mut body = KinematicBody::default();
    let mut settings = Settings::default();
    settings.jump_velocity_threshold = 300.0;
    let max_jump_speed = settings.max_jump_speed;
    let mut loco = setup(settings, &body, LEFT_START, RIGHT_START);

    // the controller tracks the body, and is pulled down 20 units every tick
    let mut jumped = None;
    for k in 1..=6 {
        let left = LEFT_START - Vec3::new(0.0, 0.0, 20.0 * k as f32);
        let report = loco.tick(&input(&body, left, RIGHT_START), &world, &mut body);
        if let Some(Motion::Jumped(vel)) = report.motion() {
            jumped = Some(vel);
            break;
        }
    }

    let vel = jumped.expect("never jumped");
    assert!((vel.magnitude() - max_jump_speed).abs() < 1e-2, "{:?}", vel);
    assert!(vel.z > 0.99 * max_jump_speed);
    assert_eq!(body.vel, vel);
    assert!(loco.average_velocity().z > 300.0);
}

#[test]
fn test_adjust_jump_threshold() {
    let body = KinematicBody::default();
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);
    assert_eq!(loco.adjust_jump_threshold(250.0), 1250.0);
    assert_eq!(loco.adjust_jump_threshold(-5000.0), 0.0);
    assert_eq!(loco.settings().jump_velocity_threshold, 0.0);
}

#[test]
fn test_reinitialize_resets_hands_and_history() {
    let world = ground();
    let mut body = KinematicBody::default();
    let mut loco = setup(Settings::default(), &body, LEFT_START, RIGHT_START);
    loco.tick(&input(&body, Vec3::new(30.0, 0.0, -60.0), RIGHT_START), &world, &mut body);
    assert!(loco.hand(HandSide::Left).was_colliding());
    loco.tick(&input(&body, Vec3::new(30.0, 0.0, -60.0), RIGHT_START), &world, &mut body);
    assert!(loco.average_velocity() != Vec3::zero());

    body.pos = Vec3::new(1000.0, 0.0, 0.0);
    loco.reinitialize(
        PerHand::new(HandPose::at(body.pos + LEFT_START), HandPose::at(body.pos + RIGHT_START)),
        &body,
    );
    let left = loco.hand(HandSide::Left);
    assert!(!left.is_colliding() && !left.was_colliding());
    assert_eq!(left.pos(), body.pos + LEFT_START);
    assert_eq!(loco.average_velocity(), Vec3::zero());
}

#[test]
fn test_hands_start_at_controllers() {
    let world = BoxWorld::new();
    let mut body = KinematicBody::default();
    let far = Vec3::new(400.0, 0.0, 0.0);
    let mut loco = setup(Settings::default(), &body, far, RIGHT_START);
    assert_eq!(loco.hand(HandSide::Left).pos(), far);
    assert!(!loco.hand(HandSide::Left).is_colliding());

    loco.tick(&input(&body, far, RIGHT_START), &world, &mut body);
    let left = loco.hand(HandSide::Left).pos();
    assert!((left - Vec3::new(150.0, 0.0, 0.0)).magnitude() < 1e-3, "{:?}", left);
}

/// Body displacement from one tick starting with hands at the given body-relative positions
/// and pulling them to the given targets, from a body at the origin above the ground.
#[cfg(test)]
fn first_tick_displacement(
    starts: PerHand<Vec3<f32>>,
    targets: PerHand<Vec3<f32>>,
) -> Vec3<f32> {
    let world = ground();
    let mut body = KinematicBody::default();
    let mut loco = setup(Settings::default(), &body, starts[HandSide::Left], starts[HandSide::Right]);
    let report = loco.tick(
        &input(&body, targets[HandSide::Left], targets[HandSide::Right]),
        &world,
        &mut body,
    );
    match report.motion() {
        Some(Motion::Translated(delta)) => delta,
        motion => panic!("expected translation, got {:?}", motion),
    }
}

#[test]
fn test_two_gripping_hands_average() {
    let left_start = Vec3::new(30.0, 0.0, -40.0);
    let right_start = Vec3::new(-30.0, 0.0, -40.0);
    let left_pull = Vec3::new(30.0, 0.0, -60.0);
    let right_pull = Vec3::new(-30.0, 0.0, -50.0);
    let left_air = Vec3::new(30.0, 0.0, 40.0);
    let right_air = Vec3::new(-30.0, 0.0, 40.0);

    // each hand on its own, with the other one up in the air
    let left_alone = first_tick_displacement(
        PerHand::new(left_start, right_air),
        PerHand::new(left_pull, right_air),
    );
    let right_alone = first_tick_displacement(
        PerHand::new(left_air, right_start),
        PerHand::new(left_air, right_pull),
    );
    assert!((left_alone - right_alone).magnitude() > 1.0, "{:?} {:?}", left_alone, right_alone);

    let both = first_tick_displacement(
        PerHand::new(left_start, right_start),
        PerHand::new(left_pull, right_pull),
    );
    let expected = (left_alone + right_alone) / 2.0;
    assert!((both - expected).magnitude() < 1e-4, "{:?} vs {:?}", both, expected);
}

#[test]
fn test_hand_gripping_last_tick_still_averages() {
    let world = ground();
    let mut body = KinematicBody::default();
    let right_start = Vec3::new(-30.0, 0.0, -40.0);
    let mut loco = setup(Settings::default(), &body, LEFT_START, right_start);

    // both hands grip the ground
    loco.tick(
        &input(&body, Vec3::new(30.0, 0.0, -60.0), Vec3::new(-30.0, 0.0, -60.0)),
        &world,
        &mut body,
    );
    for side in HAND_SIDES {
        assert!(loco.hand(side).was_colliding());
    }

    // left keeps pulling while right lifts off the ground, staying within the unstick distance
    let left_pos = loco.hand(HandSide::Left).pos();
    let right_pos = loco.hand(HandSide::Right).pos();
    let left_target = left_pos + Vec3::new(0.0, 0.0, -20.0);
    let right_target = right_pos + Vec3::new(0.0, 0.0, 5.0);
    let before = body.pos;
    let report = loco.tick(
        &input(&body, left_target - body.pos, right_target - body.pos),
        &world,
        &mut body,
    );

    assert!(loco.hand(HandSide::Left).is_colliding());
    assert!(!loco.hand(HandSide::Right).is_colliding());
    let Some(Motion::Translated(delta)) = report.motion() else {
        panic!("expected translation, got {:?}", report);
    };
    // right contributes nothing but still halves the left's pull
    let expected = (left_pos - left_target) / 2.0;
    assert!((delta - expected).magnitude() < 1e-3, "{:?} vs {:?}", delta, expected);
    assert!((body.pos - (before + delta)).magnitude() < 1e-4);
}
