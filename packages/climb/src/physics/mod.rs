//! Collision system for the climbing hands.
//!
//! The hands are treated as small spheres which are moved through static world geometry with
//! continuous collision. The gist is:
//!
//! - The "world geometry" is some collection of unmoveable surfaces which can be asked to sweep a
//!   sphere or a ray along a line segment and report the first thing it touches, reified by the
//!   `WorldGeometry` trait. The engine usually owns this, but `BoxWorld` provides a simple
//!   implementation over axis-aligned boxes.
//! - The `SweepSlide` resolver can be asked to move a sphere from a start position by some
//!   movement vector such that it stops against, and slides a little along, whatever it hits.

pub mod aa_box;
pub mod world_geometry;
pub mod box_world;
pub mod sweep_slide;


/// Physics system common re-exports.
pub mod prelude {
    pub use super::{
        aa_box::AaBox,
        world_geometry::{
            WorldGeometry,
            BarrierId,
            Hit,
        },
        box_world::BoxWorld,
        sweep_slide::{
            SweepSlide,
            Resolved,
        },
    };
}
