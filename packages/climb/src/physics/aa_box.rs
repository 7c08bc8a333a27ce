//! Axis-aligned box.

use vek::*;


/// Axis-aligned box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AaBox {
    /// Box minimum corner position.
    pub pos: Vec3<f32>,
    /// Box extent from `pos`. Assumed to be non-negative.
    pub ext: Extent3<f32>,
}

/// Where a line segment enters an `AaBox`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SegmentEntry {
    /// Fraction of the segment, in `[0, 1]`, at which it enters the box.
    pub t: f32,
    /// Outward normal of the face it enters through.
    pub normal: Vec3<f32>,
}

impl AaBox {
    /// Box spanning between the two given corners, in either order.
    pub fn from_corners<V: Into<Vec3<f32>>>(a: V, b: V) -> Self {
        let a = a.into();
        let b = b.into();
        let min = a.zip(b).map(|(a, b)| f32::min(a, b));
        let max = a.zip(b).map(|(a, b)| f32::max(a, b));
        AaBox {
            pos: min,
            ext: Extent3::from(max - min),
        }
    }

    /// Maximum corner position.
    pub fn max(self) -> Vec3<f32> {
        self.pos + Vec3::from(self.ext)
    }

    /// Translate self by `v`.
    pub fn translate<V: Into<Vec3<f32>>>(mut self, v: V) -> Self {
        self.pos += v.into();
        self
    }

    /// Move the minimum corner position backwards and the maximum corner position forwards on all
    /// axes by `amount`.
    pub fn expand(mut self, amount: f32) -> Self {
        self.pos -= Vec3::from(amount);
        self.ext += Extent3::from(amount * 2.0);
        self
    }

    /// Does self contain the point `pos`?
    pub fn contains<V: Into<Vec3<f32>>>(self, pos: V) -> bool {
        let pos = pos.into();
        let max = self.max();
        pos.x > self.pos.x
            && pos.y > self.pos.y
            && pos.z > self.pos.z
            && pos.x < max.x
            && pos.y < max.y
            && pos.z < max.z
    }

    /// Find where the segment from `start` to `start + delta` first enters self, if it does.
    ///
    /// A segment starting inside the box enters it at `t = 0`, through whichever face `start` is
    /// closest to.
    pub fn segment_entry(self, start: Vec3<f32>, delta: Vec3<f32>) -> Option<SegmentEntry> {
        let max = self.max();

        if self.contains(start) {
            return Some(SegmentEntry {
                t: 0.0,
                normal: self.nearest_face_normal(start),
            });
        }

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::zero();

        for i in 0..3 {
            if delta[i] == 0.0 {
                // parallel to this slab, so must already be strictly between its planes
                if start[i] <= self.pos[i] || start[i] >= max[i] {
                    return None;
                }
                continue;
            }

            let mut t1 = (self.pos[i] - start[i]) / delta[i];
            let mut t2 = (max[i] - start[i]) / delta[i];
            let mut sign = -1.0;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
                sign = 1.0;
            }

            if t1 > t_enter {
                t_enter = t1;
                normal = Vec3::zero();
                normal[i] = sign;
            }
            t_exit = f32::min(t_exit, t2);
        }

        if t_enter > t_exit || t_enter < 0.0 || t_enter > 1.0 {
            return None;
        }

        Some(SegmentEntry {
            t: t_enter,
            normal,
        })
    }

    /// Outward normal of the face closest to `pos`.
    fn nearest_face_normal(self, pos: Vec3<f32>) -> Vec3<f32> {
        let max = self.max();
        let mut best = f32::INFINITY;
        let mut normal = Vec3::zero();
        for i in 0..3 {
            for (dist, sign) in [(pos[i] - self.pos[i], -1.0), (max[i] - pos[i], 1.0)] {
                if dist < best {
                    best = dist;
                    normal = Vec3::zero();
                    normal[i] = sign;
                }
            }
        }
        normal
    }
}


#[test]
fn test_segment_entry_face() {
    let aa_box = AaBox::from_corners(Vec3::new(10.0, -5.0, -5.0), Vec3::new(20.0, 5.0, 5.0));
    let entry = aa_box
        .segment_entry(Vec3::zero(), Vec3::new(40.0, 0.0, 0.0))
        .unwrap();
    assert!((entry.t - 0.25).abs() < 1e-6);
    assert_eq!(entry.normal, Vec3::new(-1.0, 0.0, 0.0));

    let entry = aa_box
        .segment_entry(Vec3::new(15.0, 0.0, 30.0), Vec3::new(0.0, 0.0, -50.0))
        .unwrap();
    assert!((entry.t - 0.5).abs() < 1e-6);
    assert_eq!(entry.normal, Vec3::new(0.0, 0.0, 1.0));
}

#[test]
fn test_segment_entry_misses() {
    let aa_box = AaBox::from_corners(Vec3::new(10.0, -5.0, -5.0), Vec3::new(20.0, 5.0, 5.0));
    // stops short
    assert!(aa_box.segment_entry(Vec3::zero(), Vec3::new(9.0, 0.0, 0.0)).is_none());
    // passes beside
    assert!(aa_box.segment_entry(Vec3::new(0.0, 10.0, 0.0), Vec3::new(40.0, 0.0, 0.0)).is_none());
    // pointing away
    assert!(aa_box.segment_entry(Vec3::zero(), Vec3::new(-40.0, 0.0, 0.0)).is_none());
    // zero length outside
    assert!(aa_box.segment_entry(Vec3::zero(), Vec3::zero()).is_none());
}

#[test]
fn test_segment_entry_from_inside() {
    let aa_box = AaBox::from_corners(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
    let entry = aa_box
        .segment_entry(Vec3::new(5.0, 5.0, 9.0), Vec3::new(1.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(entry.t, 0.0);
    assert_eq!(entry.normal, Vec3::new(0.0, 0.0, 1.0));
}
