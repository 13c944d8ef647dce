//! Cycle player.
//!
//! Plays a sprite cycle in the terminal, logging every frame change, and can
//! export the sliced frames.
//!
//! # Usage
//!
//! ```bash
//! # Play the "Run" cycle of a sheet described by a manifest for 3 seconds
//! cargo run --example cycle_player -- play margery.png margery.toml --cycle Run --seconds 3
//!
//! # Same, mirrored and backwards
//! cargo run --example cycle_player -- play margery.png margery.toml -c Run --mirror --reverse
//!
//! # Step through a cycle by hand
//! cargo run --example cycle_player -- step margery.png margery.toml -c Idle --count 8
//!
//! # Export every frame (and its mirror) to a directory
//! cargo run --example cycle_player -- export margery.png margery.toml -o frames/ --mirrors
//!
//! # Show frames and cycles
//! cargo run --example cycle_player -- info margery.png margery.toml
//! ```

use std::{
	fs,
	path::{Path, PathBuf},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	thread,
	time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use frameloop_rs::prelude::*;
use log::info;

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	match cli.command {
		Command::Play(opts) => run_play(opts),
		Command::Step(opts) => run_step(opts),
		Command::Export(opts) => run_export(opts),
		Command::Info(opts) => run_info(opts),
	}
}

#[derive(Parser)]
#[command(name = "cycle_player")]
#[command(author = "frameloop-rs project")]
#[command(version)]
#[command(about = "Play, step through and export sprite sheet cycles", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Play a cycle for a while, logging each frame change
	Play(PlayArgs),
	/// Step through a cycle by hand
	Step(StepArgs),
	/// Write every extracted frame to a directory
	Export(ExportArgs),
	/// Show frames and registered cycles
	Info(SpriteArgs),
}

#[derive(Args)]
struct SpriteArgs {
	/// Sprite sheet image
	#[arg(value_name = "SHEET")]
	sheet: PathBuf,

	/// Manifest describing the grid and cycles (.toml, .json or .yaml)
	#[arg(value_name = "MANIFEST")]
	manifest: PathBuf,
}

#[derive(Args)]
struct CycleArgs {
	/// Cycle to select (defaults to the manifest's default cycle)
	#[arg(short, long, value_name = "NAME")]
	cycle: Option<String>,

	/// Show mirrored frames
	#[arg(short, long, default_value_t = false)]
	mirror: bool,

	/// Step backwards
	#[arg(short, long, default_value_t = false)]
	reverse: bool,

	/// Override the cycle speed (frames per second)
	#[arg(long, value_name = "FPS")]
	speed: Option<u32>,
}

#[derive(Args)]
struct PlayArgs {
	#[command(flatten)]
	sprite: SpriteArgs,

	#[command(flatten)]
	cycle: CycleArgs,

	/// How long to play
	#[arg(short, long, value_name = "SECONDS", default_value_t = 3.0)]
	seconds: f64,
}

#[derive(Args)]
struct StepArgs {
	#[command(flatten)]
	sprite: SpriteArgs,

	#[command(flatten)]
	cycle: CycleArgs,

	/// Number of steps
	#[arg(short = 'n', long, value_name = "COUNT", default_value_t = 8)]
	count: usize,
}

#[derive(Args)]
struct ExportArgs {
	#[command(flatten)]
	sprite: SpriteArgs,

	/// Output directory (defaults to `<sheet>_frames/`)
	#[arg(short, long, value_name = "DIR")]
	output: Option<PathBuf>,

	/// Also write mirrored frames
	#[arg(long, default_value_t = false)]
	mirrors: bool,
}

fn load_sprite(args: &SpriteArgs) -> Result<Sprite> {
	let manifest = Manifest::from_file(&args.manifest)
		.with_context(|| format!("failed to load manifest {}", args.manifest.display()))?;
	let sheet = fs::read(&args.sheet)
		.with_context(|| format!("failed to read sheet {}", args.sheet.display()))?;
	let sprite = Sprite::from_manifest(sheet, &manifest)
		.with_context(|| format!("failed to build sprite from {}", args.sheet.display()))?;

	info!("Loaded {} frames, cycles: {}", sprite.frame_count(), sprite.list_cycles().join(", "));
	Ok(sprite)
}

fn select_cycle(sprite: &mut Sprite, args: &CycleArgs) -> Result<()> {
	let name = match &args.cycle {
		Some(name) => name.clone(),
		None => sprite.active_cycle_name().context("sprite has no active cycle")?.to_string(),
	};
	let Some(cycle) = sprite.cycle(&name) else {
		bail!("no cycle named '{}' (available: {})", name, sprite.list_cycles().join(", "));
	};

	// flags first, so a reversed cycle starts from its last frame
	apply_overrides(cycle, args)?;
	sprite.set_cycle(&name)?;
	Ok(())
}

/// Applies only the flags given on the command line; manifest settings stay
/// otherwise.
fn apply_overrides(cycle: &Cycle, args: &CycleArgs) -> Result<()> {
	if args.reverse {
		cycle.set_reverse(true);
	}
	if args.mirror {
		cycle.set_mirror(true);
	}
	if let Some(speed) = args.speed {
		cycle.set_speed(speed)?;
	}
	Ok(())
}

fn describe(frame: &Frame) -> String {
	format!("{}x{} {:?}, {} bytes", frame.width(), frame.height(), frame.format(), frame.len())
}

fn run_play(opts: PlayArgs) -> Result<()> {
	if !opts.seconds.is_finite() || opts.seconds < 0.0 {
		bail!("--seconds must be a non-negative number");
	}

	let mut sprite = load_sprite(&opts.sprite)?;
	select_cycle(&mut sprite, &opts.cycle)?;

	let updates = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&updates);
	let viewer = sprite.viewer();
	sprite.set_on_update(move || {
		let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
		info!("update #{}: {}", n, describe(&viewer.image()));
	});

	if let Some(cycle) = sprite.active_cycle() {
		cycle.set_on_end(|| info!("cycle ended"));
		info!(
			"Playing '{}' ({} frames at {} fps) for {:.1}s",
			cycle.name(),
			cycle.len(),
			cycle.speed(),
			opts.seconds
		);
	}

	sprite.play()?;
	thread::sleep(Duration::from_secs_f64(opts.seconds));
	sprite.stop()?;

	info!("{} frame updates", updates.load(Ordering::SeqCst));
	Ok(())
}

fn run_step(opts: StepArgs) -> Result<()> {
	let mut sprite = load_sprite(&opts.sprite)?;
	select_cycle(&mut sprite, &opts.cycle)?;

	let cycle = sprite.active_cycle().context("sprite has no active cycle")?;
	cycle.set_on_end(|| info!("cycle ended"));
	let reverse = cycle.is_reversed();

	for step in 1..=opts.count {
		if reverse {
			sprite.prev()?;
		} else {
			sprite.next()?;
		}
		let index = sprite.active_cycle().map_or(0, Cycle::index);
		info!("step {:>3}: index {:>3}, {}", step, index, describe(&sprite.image()));
	}
	Ok(())
}

fn extension(format: image::ImageFormat) -> &'static str {
	format.extensions_str().first().copied().unwrap_or("img")
}

fn run_export(opts: ExportArgs) -> Result<()> {
	let sprite = load_sprite(&opts.sprite)?;
	let output = opts.output.unwrap_or_else(|| default_output_dir(&opts.sprite.sheet));
	fs::create_dir_all(&output)
		.with_context(|| format!("failed to create {}", output.display()))?;

	let ext = extension(sprite.format());
	for (index, frame) in sprite.frames().iter().enumerate() {
		let path = output.join(format!("frame_{index:03}.{ext}"));
		fs::write(&path, frame.data())
			.with_context(|| format!("failed to write {}", path.display()))?;

		if opts.mirrors {
			let path = output.join(format!("frame_{index:03}_mirror.{ext}"));
			fs::write(&path, frame.mirrored()?.data())
				.with_context(|| format!("failed to write {}", path.display()))?;
		}
	}

	info!("Exported {} frames to {}", sprite.frame_count(), output.display());
	Ok(())
}

fn default_output_dir(sheet: &Path) -> PathBuf {
	let stem = sheet.file_stem().and_then(|s| s.to_str()).unwrap_or("sheet");
	sheet.with_file_name(format!("{stem}_frames"))
}

fn run_info(opts: SpriteArgs) -> Result<()> {
	let sprite = load_sprite(&opts)?;

	println!("Sheet: {} bytes, {:?}", sprite.sheet().len(), sprite.format());
	println!("Grid:  {}", sprite.grid());
	println!("Frames: {}", sprite.frame_count());
	println!("Cycles:");
	for cycle in sprite.cycles() {
		let active = if sprite.active_cycle_name() == Some(cycle.name()) {
			"*"
		} else {
			" "
		};
		println!(
			" {} {:<12} {:>3} frames @ {:>2} fps  loop={} reverse={} mirror={} stop={}",
			active,
			cycle.name(),
			cycle.len(),
			cycle.speed(),
			cycle.is_looping(),
			cycle.is_reversed(),
			cycle.is_mirrored(),
			cycle.stop_policy()
		);
	}
	Ok(())
}
