//! Headless demo driver
//!
//! Runs a preset scenario (or a JSON scene) for a number of fixed steps and
//! prints the final snapshot as JSON on stdout. Logging goes to stderr and
//! is controlled by `RUST_LOG`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use pixel_physics::config::SceneConfig;
use pixel_physics::runner::BackgroundRunner;
use pixel_physics::scenario::{Scenario, Scene};
use pixel_physics::sim::WorldSnapshot;
use pixel_physics::{World, WorldConfig};

struct Args {
    scenario: Scenario,
    frames: u64,
    seed: u64,
    config: Option<String>,
    scene: Option<String>,
    threaded: bool,
}

fn print_usage() {
    eprintln!("Usage: pixel-physics [scenario] [frames] [options]");
    eprintln!();
    eprintln!("Scenarios: pong, football, platformer, well (default: pong)");
    eprintln!("Frames:    fixed steps to run (default: 600)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config PATH   World config JSON applied before the scenario's own settings");
    eprintln!("  --scene PATH    Run a JSON scene instead of a preset");
    eprintln!("  --seed N        RNG seed for preset layouts (default: 0)");
    eprintln!("  --threaded      Step on a background thread in real time");
}

fn parse_args() -> Result<Option<Args>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut parsed = Args {
        scenario: Scenario::Pong,
        frames: 600,
        seed: 0,
        config: None,
        scene: None,
        threaded: false,
    };

    let mut positional = 0;
    let mut i = 0;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i + 1)
                .cloned()
                .with_context(|| format!("{} requires an argument", args[i]))
        };
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "--config" => {
                parsed.config = Some(value(i)?);
                i += 1;
            }
            "--scene" => {
                parsed.scene = Some(value(i)?);
                i += 1;
            }
            "--seed" => {
                parsed.seed = value(i)?.parse().context("--seed expects an integer")?;
                i += 1;
            }
            "--threaded" => parsed.threaded = true,
            arg if arg.starts_with("--") => bail!("unknown option {}", arg),
            arg => {
                match positional {
                    0 => {
                        parsed.scenario =
                            Scenario::parse(arg).with_context(|| format!("unknown scenario '{}'", arg))?
                    }
                    1 => parsed.frames = arg.parse().with_context(|| format!("invalid frame count '{}'", arg))?,
                    _ => bail!("unexpected argument '{}'", arg),
                }
                positional += 1;
            }
        }
        i += 1;
    }
    Ok(Some(parsed))
}

/// What the demo steps: a preset with its AI, or a bare world from a scene file
enum Driver {
    Preset(Scene),
    Bare(World),
}

impl Driver {
    fn step(&mut self, dt: f32) -> usize {
        match self {
            Driver::Preset(scene) => {
                scene.step(dt);
                scene.world.drain_events().len()
            }
            Driver::Bare(world) => {
                world.step(dt);
                world.drain_events().len()
            }
        }
    }

    fn into_world(self) -> World {
        match self {
            Driver::Preset(scene) => scene.world,
            Driver::Bare(world) => world,
        }
    }
}

/// Wall-clock time the threaded runner needs for `frames` fixed steps
fn run_time(frames: u64, config: &WorldConfig) -> Result<Duration> {
    let seconds = frames as f32 * config.fixed_dt / config.time_scale.max(f32::EPSILON);
    Duration::try_from_secs_f32(seconds).with_context(|| format!("{} frames is not a usable run time", frames))
}

fn run(args: &Args) -> Result<WorldSnapshot> {
    let base = match &args.config {
        Some(path) => WorldConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => WorldConfig::default(),
    };

    let (mut driver, config) = match &args.scene {
        Some(path) => {
            let scene = SceneConfig::load(path).with_context(|| format!("loading {}", path))?;
            (Driver::Bare(scene.build()?), scene.world)
        }
        None => (
            Driver::Preset(args.scenario.build(&base, args.seed)?),
            args.scenario.world_config(&base),
        ),
    };

    if args.threaded {
        // Presets lose their AI here; only the physics runs
        let duration = run_time(args.frames, &config)?;
        log::info!("Running threaded for {:.1}s", duration.as_secs_f32());
        let mut runner = BackgroundRunner::spawn(driver.into_world(), &config)?;
        std::thread::sleep(duration);
        runner.stop();
        return Ok(runner.snapshot());
    }

    let report_every = (args.frames / 10).max(1);
    let mut collisions = 0;
    for frame in 1..=args.frames {
        collisions += driver.step(config.fixed_dt);
        if frame % report_every == 0 {
            match &driver {
                Driver::Preset(scene) => {
                    log::info!("frame {} collisions {} score {:?}", frame, collisions, scene.score)
                }
                Driver::Bare(_) => log::info!("frame {} collisions {}", frame, collisions),
            }
        }
    }
    Ok(driver.into_world().snapshot())
}

fn main() -> Result<()> {
    env_logger::init();

    let Some(args) = parse_args()? else {
        print_usage();
        return Ok(());
    };
    match &args.scene {
        Some(path) => log::info!("Pixel Physics starting scene {}", path),
        None => log::info!(
            "Pixel Physics starting {} for {} frames (seed {})",
            args.scenario.name(),
            args.frames,
            args.seed
        ),
    }

    let snapshot = run(&args)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
