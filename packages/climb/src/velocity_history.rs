//! Rolling average of recent body velocities, used to estimate throw speed.

use vek::*;


/// Every this many rounds through the ring buffer, the running average is recomputed from
/// scratch so float error can't accumulate without bound.
const RECOMPUTE_EVERY_ROUNDS: usize = 16;

/// Fixed-size ring buffer of the most recent per-tick body velocities, with a running average.
///
/// The buffer starts full of zero velocities, so the average ramps up over the first `size`
/// pushes.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityHistory {
    samples: Vec<Vec3<f32>>,
    /// Index of the most recently written sample.
    idx: usize,
    last_pos: Vec3<f32>,
    average: Vec3<f32>,
    pushes_until_recompute: usize,
}

impl VelocityHistory {
    /// Construct with room for `size` samples, starting at `pos`. A `size` of 0 is treated as 1.
    pub fn new(size: usize, pos: Vec3<f32>) -> Self {
        let size = size.max(1);
        VelocityHistory {
            samples: vec![Vec3::zero(); size],
            idx: 0,
            last_pos: pos,
            average: Vec3::zero(),
            pushes_until_recompute: size * RECOMPUTE_EVERY_ROUNDS,
        }
    }

    /// Forget all history and start again from `pos`.
    pub fn reset(&mut self, pos: Vec3<f32>) {
        *self = Self::new(self.samples.len(), pos);
    }

    /// Record the body being at `pos` after `dt` seconds, and return the updated average.
    ///
    /// A non-positive or non-finite `dt` records nothing and returns the average unchanged.
    pub fn push(&mut self, pos: Vec3<f32>, dt: f32) -> Vec3<f32> {
        if !(dt > 0.0) || !dt.is_finite() {
            trace!(dt, "skipping velocity sample");
            return self.average;
        }

        let vel = (pos - self.last_pos) / dt;
        self.last_pos = pos;

        self.idx = (self.idx + 1) % self.samples.len();
        let oldest = self.samples[self.idx];
        self.samples[self.idx] = vel;

        self.pushes_until_recompute -= 1;
        if self.pushes_until_recompute == 0 {
            self.average = self.recompute_average();
            self.pushes_until_recompute = self.samples.len() * RECOMPUTE_EVERY_ROUNDS;
        } else {
            self.average += (vel - oldest) / self.samples.len() as f32;
        }

        self.average
    }

    /// The running average velocity.
    pub fn average(&self) -> Vec3<f32> {
        self.average
    }

    /// Compute the average of the stored samples from scratch.
    pub fn recompute_average(&self) -> Vec3<f32> {
        let sum = self.samples.iter().fold(Vec3::zero(), |sum, &vel| sum + vel);
        sum / self.samples.len() as f32
    }

    /// Most recently recorded velocity.
    pub fn latest(&self) -> Vec3<f32> {
        self.samples[self.idx]
    }

    pub fn samples(&self) -> &[Vec3<f32>] {
        &self.samples
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }
}


#[cfg(test)]
use rand::prelude::*;
#[cfg(test)]
use rand_pcg::Pcg32;

#[cfg(test)]
fn assert_agrees(history: &VelocityHistory) {
    let incremental = history.average();
    let full = history.recompute_average();
    let scale = history
        .samples()
        .iter()
        .map(|v| v.magnitude())
        .fold(1.0, f32::max);
    assert!(
        (incremental - full).magnitude() <= 1e-4 * scale,
        "incremental {:?} drifted from {:?}", incremental, full,
    );
}

#[test]
fn test_constant_velocity() {
    let mut history = VelocityHistory::new(10, Vec3::zero());
    let dt = 1.0 / 90.0;
    let vel = Vec3::new(90.0, 0.0, 180.0);
    let mut pos = Vec3::zero();
    for i in 1..=10 {
        pos += vel * dt;
        let average = history.push(pos, dt);
        let expected = vel * i as f32 / 10.0;
        assert!((average - expected).magnitude() < 1e-2, "{:?} vs {:?}", average, expected);
    }
    for _ in 0..25 {
        pos += vel * dt;
        history.push(pos, dt);
    }
    assert!((history.average() - vel).magnitude() < 1e-2);
    assert!((history.latest() - vel).magnitude() < 1e-2);
}

#[test]
fn test_zero_dt_is_noop() {
    let mut history = VelocityHistory::new(4, Vec3::zero());
    history.push(Vec3::new(1.0, 0.0, 0.0), 0.5);
    let before = history.clone();
    let average = history.push(Vec3::new(100.0, 0.0, 0.0), 0.0);
    assert_eq!(average, before.average());
    assert_eq!(history, before);
    history.push(Vec3::new(100.0, 0.0, 0.0), -1.0);
    history.push(Vec3::new(100.0, 0.0, 0.0), f32::NAN);
    assert_eq!(history, before);
}

#[test]
fn test_reset() {
    let mut history = VelocityHistory::new(3, Vec3::zero());
    history.push(Vec3::new(5.0, 5.0, 5.0), 0.1);
    history.reset(Vec3::new(1.0, 1.0, 1.0));
    assert_eq!(history.average(), Vec3::zero());
    assert_eq!(history.size(), 3);
    let average = history.push(Vec3::new(1.0, 1.0, 1.0), 0.1);
    assert_eq!(average, Vec3::zero());
}

#[test]
fn test_incremental_matches_recompute() {
    let mut rng = Pcg32::seed_from_u64(0xc11b);
    for size in [1, 2, 3, 10, 17] {
        let mut history = VelocityHistory::new(size, Vec3::zero());
        let mut pos = Vec3::zero();
        for _ in 0..20_000 {
            let dt = rng.gen_range(0.005..0.02);
            pos += Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            history.push(pos, dt);
            assert_agrees(&history);
        }
    }
}

#[test]
fn test_zero_size_is_treated_as_one() {
    let mut history = VelocityHistory::new(0, Vec3::zero());
    assert_eq!(history.size(), 1);
    let average = history.push(Vec3::new(2.0, 0.0, 0.0), 0.5);
    assert_eq!(average, Vec3::new(4.0, 0.0, 0.0));
}
