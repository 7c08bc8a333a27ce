
#[macro_use]
extern crate tracing;

use climb::{
    logging::init_logging,
    settings::{
        Settings,
        SETTINGS_FILE_NAME,
    },
    physics::prelude::*,
    anchor::{
        BodyAnchor,
        KinematicBody,
    },
    hand::{
        HandPose,
        HandSide,
        PerHand,
    },
    locomotion::{
        Locomotion,
        Motion,
        TickInput,
        TickReport,
    },
};
use std::{
    env::args,
    path::Path,
    process::exit,
};
use vek::*;
use anyhow::*;


const CLI_INTRO: &'static str = r#"Climbing locomotion simulator.

Drives a scripted pair of hands up a wall and throws the body off the top."#;

const CLI_HELP: &'static str = r#"
Examples:

    [this command]
    Run the default script, reading climb_settings.json if it exists.

    [this command] --settings=my_settings.json --ticks=600 --log=climb.log
    Run with explicit options.

Env var examples:
    RUST_LOG=climb=trace
    Changes logging levels"#;

const DT: f32 = 1.0 / 90.0;
const DEFAULT_TICKS: u32 = 540;
/// Seconds for one hand to reach up and pull down.
const STROKE_PERIOD: f32 = 1.0;
/// Ticks at the end of the script spent yanking both hands down to throw the body.
const THROW_TICKS: u32 = 20;
/// Distance of the body's center from the ground when standing.
const BODY_HEIGHT: f32 = 100.0;
const WALL_X: f32 = 100.0;


fn main() {
    println!("{}", CLI_INTRO);
    let args = args().collect::<Vec<_>>();
    if args.get(1).map(String::as_str) == Some("--help") {
        println!("{}", CLI_HELP);
        return;
    }

    let log_file = args.iter()
        .filter_map(|arg| arg.strip_prefix("--log="))
        .next();
    if let Err(e) = init_logging(log_file.map(Path::new)) {
        eprintln!("unable to initialize logging: {:#}", e);
        exit(1);
    }

    if let Err(e) = run_from_cli(&args) {
        error!("{:#}", e);
        exit(1);
    }
}

// parse CLI args and run the script from that
fn run_from_cli(args: &Vec<String>) -> Result<()> {
    let settings = match args.iter().filter_map(|arg| arg.strip_prefix("--settings=")).next() {
        Some(path) => Settings::try_read(path)?,
        None => Settings::read(SETTINGS_FILE_NAME),
    };
    let ticks = match args.iter().filter_map(|arg| arg.strip_prefix("--ticks=")).next() {
        Some(ticks) => ticks.parse::<u32>()
            .with_context(|| format!("invalid tick count {:?}", ticks))?,
        None => DEFAULT_TICKS,
    };
    run(settings, ticks)
}

// ground at z = 0 with a wall standing on it
fn build_world() -> BoxWorld {
    BoxWorld::new()
        .with(AaBox::from_corners(
            Vec3::new(-1000.0, -1000.0, -100.0),
            Vec3::new(1000.0, 1000.0, 0.0),
        ))
        .with(AaBox::from_corners(
            Vec3::new(0.0, -500.0, 0.0),
            Vec3::new(100.0, 500.0, 800.0),
        ).translate(Vec3::new(WALL_X, 0.0, 0.0)))
}

// body-relative position of a hand at the given point in its stroke, which alternates
// between pressing into the wall while pulling down and drawing back while reaching up
fn stroke(phase: f32, y: f32) -> Vec3<f32> {
    if phase < 0.5 {
        Vec3::new(WALL_X + 10.0, y, 50.0 - 200.0 * phase)
    } else {
        Vec3::new(WALL_X - 40.0, y, -50.0 + 200.0 * (phase - 0.5))
    }
}

fn script(tick: u32, ticks: u32) -> PerHand<Vec3<f32>> {
    let throw_start = ticks.saturating_sub(THROW_TICKS);
    if tick >= throw_start {
        let yank = 20.0 * (tick - throw_start) as f32;
        PerHand::new(
            Vec3::new(WALL_X + 10.0, 20.0, 50.0 - yank),
            Vec3::new(WALL_X + 10.0, -20.0, 50.0 - yank),
        )
    } else {
        let t = tick as f32 * DT / STROKE_PERIOD;
        PerHand::new(
            stroke(t.fract(), 20.0),
            stroke((t + 0.5).fract(), -20.0),
        )
    }
}

fn run(settings: Settings, ticks: u32) -> Result<()> {
    info!(ticks, "running climb script");
    let world = build_world();
    let gravity = settings.gravity;
    let mut body = KinematicBody::new(Vec3::new(0.0, 0.0, BODY_HEIGHT));

    // start with both hands drawn back from the wall
    let initial = script(0, ticks)
        .map(|local| Vec3::new(WALL_X - 40.0, local.y, local.z));
    let mut loco = Locomotion::new(
        settings,
        Vec::new(),
        initial.map(|local| HandPose::at(body.pos + local)),
        &body,
    )?;

    let mut jumps = 0;
    for tick in 0..ticks {
        let local = script(tick, ticks);
        let input = TickInput {
            dt: DT,
            head: body.pos,
            hands: local.map(|local| Some(HandPose::at(body.pos + local))),
        };
        let report = loco.tick(&input, &world, &mut body);
        let motion = match report {
            TickReport::Skipped(reason) => {
                warn!(tick, ?reason, "tick skipped");
                continue;
            }
            TickReport::Ran { motion, .. } => motion,
        };
        match motion {
            Motion::Translated(_) => (),
            Motion::Idle | Motion::Jumped(_) => {
                body.advance(DT, gravity);
                if body.pos.z < BODY_HEIGHT {
                    body.pos.z = BODY_HEIGHT;
                    body.vel.z = f32::max(body.vel.z, 0.0);
                }
            }
        }
        if let Motion::Jumped(vel) = motion {
            jumps += 1;
            info!(tick, ?vel, "body thrown");
        }
        debug!(
            tick,
            ?motion,
            pos = ?body.position(),
            left = ?loco.hand(HandSide::Left).pos(),
            right = ?loco.hand(HandSide::Right).pos(),
        );
    }

    info!(
        pos = ?body.pos,
        vel = ?body.vel,
        jumps,
        average_velocity = ?loco.average_velocity(),
        "finished climb script",
    );
    Ok(())
}
