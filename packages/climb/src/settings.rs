
use crate::hand::HandSide;
use std::{
    path::Path,
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
};
use serde::{Serialize, Deserialize};
use vek::*;
use anyhow::*;


pub const SETTINGS_FILE_NAME: &'static str = "climb_settings.json";


/// How a jump turns the smoothed body velocity into a launch velocity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum JumpPolicy {
    /// Replace the body velocity with the smoothed velocity times the jump multiplier.
    DirectSet,
    /// Add the smoothed velocity times the jump multiplier times the tick's delta time to the
    /// body's current velocity.
    IncrementalImpulse,
}

/// Locomotion tunables. Lengths are in world units (centimeters by default), speeds in world
/// units per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hand targets are clamped to a sphere of this radius around the head.
    pub max_arm_length: f32,
    /// Radius of the sphere swept for each hand.
    pub min_probe_radius: f32,
    /// Sweep strictness in (0, 1].
    pub precision: f32,
    pub slide_factor: f32,
    /// How far a gripping hand's target must get from its contact before it may let go.
    pub unstick_distance: f32,
    pub velocity_history_size: usize,
    /// Smoothed body speed above which releasing a grip launches the body.
    pub jump_velocity_threshold: f32,
    pub jump_multiplier: f32,
    pub max_jump_speed: f32,
    pub jump_policy: JumpPolicy,
    /// Downward acceleration used to bias grip detection toward surfaces a hand is falling into.
    pub gravity: f32,
    pub movement_disabled: bool,
    /// Offset from the left controller, in controller space, to the point that grips.
    pub left_hand_offset: [f32; 3],
    /// Offset from the right controller, in controller space, to the point that grips.
    pub right_hand_offset: [f32; 3],
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_arm_length: 150.0,
            min_probe_radius: 5.0,
            precision: 0.995,
            slide_factor: 0.3,
            unstick_distance: 10.0,
            velocity_history_size: 10,
            jump_velocity_threshold: 1000.0,
            jump_multiplier: 100.0,
            max_jump_speed: 1000.0,
            jump_policy: JumpPolicy::DirectSet,
            gravity: 980.0,
            movement_disabled: false,
            left_hand_offset: [0.0; 3],
            right_hand_offset: [0.0; 3],
        }
    }
}

impl Settings {
    /// Read from a file, falling back to defaults if it's missing or invalid.
    pub fn read(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_read(path) {
            core::result::Result::Ok(settings) => settings,
            Err(e) => {
                debug!(?path, "using default settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn try_read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        let settings: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }

    /// Check that the tunables are usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.precision > 0.0 && self.precision <= 1.0,
            "precision must be in (0, 1], got {}", self.precision,
        );
        ensure!(self.velocity_history_size > 0, "velocity_history_size must be at least 1");
        for (name, value) in [
            ("max_arm_length", self.max_arm_length),
            ("min_probe_radius", self.min_probe_radius),
            ("slide_factor", self.slide_factor),
            ("unstick_distance", self.unstick_distance),
            ("jump_velocity_threshold", self.jump_velocity_threshold),
            ("jump_multiplier", self.jump_multiplier),
            ("max_jump_speed", self.max_jump_speed),
            ("gravity", self.gravity),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{} must be finite and non-negative, got {}", name, value,
            );
        }
        Ok(())
    }

    /// Grip point offset for the given hand, in controller space.
    pub fn hand_offset(&self, side: HandSide) -> Vec3<f32> {
        Vec3::from(match side {
            HandSide::Left => self.left_hand_offset,
            HandSide::Right => self.right_hand_offset,
        })
    }
}


#[test]
fn test_default_settings_are_valid() {
    Settings::default().validate().unwrap();
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut settings = Settings::default();
    settings.precision = 0.0;
    assert!(settings.validate().is_err());
    settings.precision = 1.5;
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.velocity_history_size = 0;
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.max_arm_length = f32::NAN;
    assert!(settings.validate().is_err());
}

#[test]
fn test_partial_settings_fill_defaults() {
    let settings: Settings = serde_json::from_str(r#"{
        "max_jump_speed": 800.0,
        "jump_policy": "IncrementalImpulse"
    }"#).unwrap();
    assert_eq!(settings.max_jump_speed, 800.0);
    assert_eq!(settings.jump_policy, JumpPolicy::IncrementalImpulse);
    assert_eq!(settings.max_arm_length, 150.0);
    assert_eq!(settings.velocity_history_size, 10);
}

#[test]
fn test_settings_file_round_trip() {
    let path = std::env::temp_dir()
        .join(format!("climb_settings_test_{}.json", std::process::id()));
    let mut settings = Settings::default();
    settings.unstick_distance = 12.5;
    settings.right_hand_offset = [1.0, 2.0, 3.0];
    settings.write(&path).unwrap();
    let read = Settings::try_read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(read, settings);
    assert_eq!(read.hand_offset(HandSide::Right), Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn test_read_missing_file_falls_back_to_default() {
    let settings = Settings::read("/nonexistent/dir/climb_settings.json");
    assert_eq!(settings, Settings::default());
}
