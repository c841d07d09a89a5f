#![deny(unsafe_code)]
//! CLI binary for the backdrop animated backgrounds.
//!
//! Subcommands:
//! - `render <effect>`: run an effect headless for N frames, write PNG
//! - `run --config <seed.json>`: same, driven by a replay file
//! - `list`: print available effects
//! - `schema <effect>`: print an effect's parameter schema
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=debug`) to see lifecycle logs on stderr.

mod error;

use backdrop_core::color::Srgb;
use backdrop_core::{AnimationLoop, Effect, ManualScheduler, Raster, Seed};
use backdrop_effects::EffectKind;
use clap::{Parser, Subcommand};
use error::CliError;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug, Parser)]
#[command(name = "backdrop", about = "Animated particle backgrounds, rendered headless")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run an effect for N frames and write a PNG of the last one.
    Render {
        /// Effect name ("disk" or "network").
        effect: String,

        /// Surface width in pixels.
        #[arg(short = 'W', long, default_value_t = 800)]
        width: usize,

        /// Surface height in pixels.
        #[arg(short = 'H', long, default_value_t = 600)]
        height: usize,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 120)]
        frames: usize,

        /// Simulated display refresh rate in Hz.
        #[arg(long, default_value_t = backdrop_core::seed::DEFAULT_FRAME_RATE)]
        fps: f64,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Effect parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Hold the pointer at `x,y` pixels for the whole run.
        #[arg(long, value_parser = parse_pointer)]
        pointer: Option<(f64, f64)>,

        /// Flatten onto this `#rrggbb` color instead of keeping transparency.
        #[arg(long)]
        background: Option<String>,

        /// Output file path.
        #[arg(short, long, default_value = "output.png")]
        output: PathBuf,
    },
    /// Replay a seed file and write a PNG of the last frame.
    Run {
        /// Path to a JSON seed file.
        #[arg(short, long)]
        config: PathBuf,

        /// Flatten onto this `#rrggbb` color instead of keeping transparency.
        #[arg(long)]
        background: Option<String>,

        /// Output file path.
        #[arg(short, long, default_value = "output.png")]
        output: PathBuf,
    },
    /// List available effects.
    List,
    /// Print the parameter schema of an effect.
    Schema {
        /// Effect name.
        effect: String,
    },
}

/// Parses `"x,y"` into pixel coordinates.
fn parse_pointer(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|c| c.is_finite())
            .ok_or_else(|| format!("invalid coordinate {v:?}"))
    };
    Ok((coord(x)?, coord(y)?))
}

fn parse_background(background: Option<&str>) -> Result<Option<Srgb>, CliError> {
    background
        .map(|hex| {
            Srgb::from_hex(hex).map_err(|e| CliError::invalid_flag("--background", e))
        })
        .transpose()
}

fn load_seed(path: &Path) -> Result<Seed, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid seed file {}: {e}", path.display())))
}

/// Drives the seed's effect through the frame loop and returns the surface
/// holding the final frame.
fn simulate(seed: &Seed, pointer: Option<(f64, f64)>) -> Result<Raster, CliError> {
    seed.validate()?;
    let effect = EffectKind::from_name(
        &seed.effect,
        seed.width,
        seed.height,
        seed.seed,
        &seed.params,
    )?;
    let mut raster = Raster::new(seed.width, seed.height)?;
    let mut animation = AnimationLoop::new(effect);
    if let Some((x, y)) = pointer {
        animation.effect_mut().pointer_moved(x, y);
    }

    if seed.frames == 0 {
        animation.effect().draw(&mut raster);
        return Ok(raster);
    }

    let mut scheduler = ManualScheduler::new();
    animation.start(&mut scheduler, 0.0)?;
    for index in 0..seed.frames {
        if scheduler.take_pending().is_none() {
            break;
        }
        animation.on_frame(seed.frame_time(index), &mut raster, &mut scheduler)?;
    }
    animation.stop(&mut scheduler);
    tracing::info!(
        effect = %seed.effect,
        frames = animation.frames(),
        covered = raster.covered_pixels(),
        "simulation finished"
    );
    Ok(raster)
}

fn write_snapshot(
    seed: &Seed,
    pointer: Option<(f64, f64)>,
    background: Option<&str>,
    output: &Path,
    json: bool,
) -> Result<(), CliError> {
    let background = parse_background(background)?;
    let raster = simulate(seed, pointer)?;
    backdrop_effects::snapshot::write_png(&raster, background, output)?;

    if json {
        let info = serde_json::json!({
            "effect": seed.effect,
            "width": seed.width,
            "height": seed.height,
            "frames": seed.frames,
            "frame_rate": seed.frame_rate,
            "seed": seed.seed,
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {} ({}x{}, {} frames at {} Hz, seed {}) -> {}",
            seed.effect,
            seed.width,
            seed.height,
            seed.frames,
            seed.frame_rate,
            seed.seed,
            output.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let effects = EffectKind::list_effects();
            if cli.json {
                let info = serde_json::json!({ "effects": effects });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Effects:");
                for name in effects {
                    println!("  {name}");
                }
            }
        }
        Command::Schema { effect } => {
            // Any valid size works; the schema does not depend on it.
            let kind = EffectKind::from_name(&effect, 1, 1, 1, &serde_json::json!({}))?;
            let schema = kind.param_schema();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&schema)?);
            } else if let Some(fields) = schema.as_object() {
                println!("{effect} parameters:");
                for (name, spec) in fields {
                    println!(
                        "  {name:<24} default {:<10} {}",
                        spec["default"],
                        spec["description"].as_str().unwrap_or("")
                    );
                }
            }
        }
        Command::Render {
            effect,
            width,
            height,
            frames,
            fps,
            seed,
            params,
            pointer,
            background,
            output,
        } => {
            let params: serde_json::Value = serde_json::from_str(&params)
                .map_err(|e| CliError::invalid_flag("--params JSON", e))?;
            let replay = Seed {
                params,
                frames,
                frame_rate: fps,
                ..Seed::new(&effect, width, height, seed)
            };
            write_snapshot(&replay, pointer, background.as_deref(), &output, cli.json)?;
        }
        Command::Run {
            config,
            background,
            output,
        } => {
            let replay = load_seed(&config)?;
            write_snapshot(&replay, None, background.as_deref(), &output, cli.json)?;
        }
    }

    Ok(())
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        tracing::debug!(exit_code = e.exit_code(), "command failed");
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
