//! Hand-driven climbing locomotion for a VR avatar.
//!
//! The avatar's hands are swept through the world each tick. Hands which grip world geometry
//! move the body by the opposite of the controllers' motion, and releasing a grip while moving
//! fast throws the body.

#[macro_use]
extern crate tracing;

pub mod logging;
pub mod settings;
pub mod util_vec;
pub mod physics;
pub mod anchor;
pub mod hand;
pub mod velocity_history;
pub mod locomotion;
