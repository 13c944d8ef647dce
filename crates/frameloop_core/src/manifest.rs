//! Sprite manifests.
//!
//! A manifest describes how to slice a sheet and which cycles to register,
//! so sprite setup can live next to the artwork instead of in code. Files
//! are read through the `config` crate; the format follows the extension
//! (`.toml`, `.json`, `.yaml`).
//!
//! ```toml
//! default_cycle = "Idle"
//!
//! [grid]
//! total = 17
//! rows = 3
//! columns = 6
//! frame_width = 104
//! frame_height = 112
//!
//! [[cycles]]
//! name = "Idle"
//! start = 12
//! end = 16
//! speed = 3
//!
//! [[cycles]]
//! name = "Jump"
//! start = 6
//! end = 11
//! speed = 5
//! loop = false
//! stop = "rewind"
//! ```

use std::path::Path;

use bytes::Bytes;
use config::{Config, File, FileFormat};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
	cycle::{Cycle, StopPolicy},
	error::Result,
	sheet::Grid,
	sprite::Sprite,
};

fn default_speed() -> u32 {
	1
}

fn default_looping() -> bool {
	true
}

/// One cycle entry of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSpec {
	/// Unique cycle name
	pub name: String,
	/// First frame (inclusive, 0-based)
	pub start: usize,
	/// Last frame (exclusive)
	pub end: usize,
	/// Frames per second
	#[serde(default = "default_speed")]
	pub speed: u32,
	/// Wrap around at the ends
	#[serde(default = "default_looping", alias = "loop")]
	pub looping: bool,
	/// Play backwards
	#[serde(default)]
	pub reverse: bool,
	/// Show mirrored frames
	#[serde(default)]
	pub mirror: bool,
	/// Position handling on stop
	#[serde(default)]
	pub stop: StopPolicy,
}

impl CycleSpec {
	/// Creates a looping, forward, unmirrored cycle entry.
	pub fn new(name: impl Into<String>, start: usize, end: usize, speed: u32) -> Self {
		Self {
			name: name.into(),
			start,
			end,
			speed,
			looping: true,
			reverse: false,
			mirror: false,
			stop: StopPolicy::Hold,
		}
	}

	/// Builds the cycle against `sprite` with every flag applied.
	///
	/// # Errors
	///
	/// See [`Cycle::new`].
	pub fn build(&self, sprite: &Sprite) -> Result<Cycle> {
		Ok(Cycle::new(self.name.clone(), sprite, self.start, self.end, self.speed)?
			.with_looping(self.looping)
			.with_reverse(self.reverse)
			.with_mirror(self.mirror)
			.with_stop_policy(self.stop))
	}
}

/// Sheet layout plus the cycles to register on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
	/// How the sheet is sliced
	pub grid: Grid,
	/// Cycles registered after [`ALL_FRAMES`](crate::cycle::ALL_FRAMES), in order
	#[serde(default)]
	pub cycles: Vec<CycleSpec>,
	/// Cycle activated once everything is registered
	#[serde(default)]
	pub default_cycle: Option<String>,
}

impl Manifest {
	/// Creates a manifest with no cycles besides the built-in one.
	pub fn new(grid: Grid) -> Self {
		Self {
			grid,
			cycles: Vec::new(),
			default_cycle: None,
		}
	}

	/// Loads a manifest file; the format is taken from the extension.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::Config`](crate::error::SpriteError::Config) if
	/// the file can not be read or does not describe a manifest.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let manifest = Config::builder().add_source(File::from(path)).build()?.try_deserialize()?;
		debug!("Loaded manifest {}", path.display());
		Ok(manifest)
	}

	/// Parses a TOML manifest.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::Config`](crate::error::SpriteError::Config) on
	/// syntax errors or missing fields.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Self::from_str_with_format(source, FileFormat::Toml)
	}

	/// Parses a JSON manifest.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::Config`](crate::error::SpriteError::Config) on
	/// syntax errors or missing fields.
	pub fn from_json_str(source: &str) -> Result<Self> {
		Self::from_str_with_format(source, FileFormat::Json)
	}

	fn from_str_with_format(source: &str, format: FileFormat) -> Result<Self> {
		Ok(Config::builder()
			.add_source(File::from_str(source, format))
			.build()?
			.try_deserialize()?)
	}

	/// Adds a cycle entry, builder style.
	pub fn with_cycle(mut self, cycle: CycleSpec) -> Self {
		self.cycles.push(cycle);
		self
	}

	/// Builds a sprite from `sheet`, registers every cycle and activates
	/// the default one.
	///
	/// # Errors
	///
	/// Returns the first construction, registration or selection error.
	pub fn build(&self, sheet: impl Into<Bytes>) -> Result<Sprite> {
		let mut sprite = Sprite::new(sheet, self.grid)?;
		for spec in &self.cycles {
			let cycle = spec.build(&sprite)?;
			sprite.add_cycle(cycle)?;
		}
		if let Some(name) = &self.default_cycle {
			sprite.set_cycle(name)?;
		}
		Ok(sprite)
	}
}

impl Sprite {
	/// Builds a sprite as described by `manifest`.
	///
	/// # Errors
	///
	/// See [`Manifest::build`].
	pub fn from_manifest(sheet: impl Into<Bytes>, manifest: &Manifest) -> Result<Self> {
		manifest.build(sheet)
	}
}
