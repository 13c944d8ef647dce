//! Sprites: a sliced sheet plus its registry of named cycles.
//!
//! The sprite owns the frames, the cycles and the currently displayed frame.
//! Playback requests go to the active cycle, which pushes frames back
//! through a shared display slot; every update fires the change callback.

use std::sync::{Arc, Mutex, Weak};

use bytes::Bytes;
use image::ImageFormat;
use log::{debug, info, warn};

use crate::{
	cycle::{ALL_FRAMES, Callback, Cycle},
	error::{Result, SpriteError},
	lock,
	sheet::{Frame, Grid, Sheet},
};

/// Slot holding the displayed frame, shared with every cycle of a sprite.
pub(crate) struct Display {
	image: Mutex<Frame>,
	on_update: Mutex<Option<Callback>>,
}

impl Display {
	pub(crate) fn new(frame: Frame) -> Self {
		Self {
			image: Mutex::new(frame),
			on_update: Mutex::new(None),
		}
	}

	pub(crate) fn image(&self) -> Frame {
		lock(&self.image).clone()
	}

	/// Replaces the displayed frame, then fires the change callback outside
	/// of any lock.
	pub(crate) fn show(&self, frame: Frame) {
		*lock(&self.image) = frame;
		let callback = lock(&self.on_update).clone();
		if let Some(callback) = callback {
			callback();
		}
	}
}

/// Read-only, thread-safe handle to a sprite's displayed frame.
///
/// Useful inside the change callback, which may run on a playback thread
/// where the sprite itself is not reachable.
///
/// ```no_run
/// use frameloop_core::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sprite = Sprite::open("margery.png", Grid::new(17, 3, 6, 104, 112))?;
/// let viewer = sprite.viewer();
/// sprite.set_on_update(move || {
///     let frame = viewer.image();
///     println!("now showing {frame}");
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Viewer(Arc<Display>);

impl Viewer {
	/// Returns the currently displayed frame.
	pub fn image(&self) -> Frame {
		self.0.image()
	}
}

impl std::fmt::Debug for Viewer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Viewer").field(&self.0.image()).finish()
	}
}

/// A sprite sheet sliced into frames, with named playback cycles.
///
/// On construction the sheet is validated and sliced, and a cycle named
/// [`ALL_FRAMES`] spanning every frame is registered and activated.
///
/// # Examples
///
/// ```no_run
/// use frameloop_core::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut sprite = Sprite::open("margery.png", Grid::new(17, 3, 6, 104, 112))?;
/// sprite.add_cycle(Cycle::new("Idle", &sprite, 12, 16, 3)?)?;
/// sprite.add_cycle(Cycle::new("Run", &sprite, 0, 5, 5)?)?;
/// sprite.add_cycle(Cycle::new("Jump", &sprite, 6, 11, 5)?)?;
///
/// assert_eq!(sprite.list_cycles(), ["All", "Idle", "Run", "Jump"]);
///
/// sprite.set_cycle("Run")?;
/// sprite.play()?;
/// // ...
/// sprite.stop()?;
/// # Ok(())
/// # }
/// ```
pub struct Sprite {
	sheet: Sheet,
	grid: Grid,
	frames: Vec<Frame>,
	cycles: Vec<Cycle>,
	active: Option<usize>,
	display: Arc<Display>,
}

impl Sprite {
	/// Slices `sheet` according to `grid` and builds the sprite.
	///
	/// # Errors
	///
	/// Returns an error if the sheet can not be decoded, the grid does not
	/// fit the sheet, or a frame fails to encode. No sprite is produced in
	/// that case.
	pub fn new(sheet: impl Into<Bytes>, grid: Grid) -> Result<Self> {
		let sheet = Sheet::from_bytes(sheet)?;
		let frames = sheet.extract(&grid)?;
		let Some(first) = frames.first().cloned() else {
			// a validated grid always yields at least one cell
			return Err(SpriteError::EmptyGrid {
				field: "total",
			});
		};

		let display = Arc::new(Display::new(first));
		let all = Cycle::build(
			ALL_FRAMES.to_string(),
			&frames,
			Arc::downgrade(&display),
			0,
			frames.len(),
			1,
		)?;

		let mut sprite = Self {
			sheet,
			grid,
			frames,
			cycles: Vec::new(),
			active: None,
			display,
		};
		sprite.add_cycle(all)?;
		sprite.set_cycle(ALL_FRAMES)?;

		debug!("Created sprite with {} frames from {}", sprite.frame_count(), grid);
		Ok(sprite)
	}

	/// Reads a sheet from `path` and builds the sprite.
	///
	/// # Errors
	///
	/// Returns an error if the file can not be read, or see [`Sprite::new`].
	pub fn open(path: impl AsRef<std::path::Path>, grid: Grid) -> Result<Self> {
		let data = std::fs::read(path)?;
		Self::new(data, grid)
	}

	/// Returns the encoded sheet.
	pub fn sheet(&self) -> &Bytes {
		self.sheet.data()
	}

	/// Returns the image format of the sheet (and of every frame).
	pub fn format(&self) -> ImageFormat {
		self.sheet.format()
	}

	/// Returns the grid the sheet was sliced with.
	pub fn grid(&self) -> &Grid {
		&self.grid
	}

	/// Returns every extracted frame, in sheet order.
	pub fn frames(&self) -> &[Frame] {
		&self.frames
	}

	/// Returns the number of extracted frames.
	pub fn frame_count(&self) -> usize {
		self.frames.len()
	}

	/// Returns the currently displayed frame.
	pub fn image(&self) -> Frame {
		self.display.image()
	}

	/// Returns a handle that reads the displayed frame from any thread.
	pub fn viewer(&self) -> Viewer {
		Viewer(Arc::clone(&self.display))
	}

	pub(crate) fn display_handle(&self) -> Weak<Display> {
		Arc::downgrade(&self.display)
	}

	/// Registers the callback fired after every display update.
	///
	/// The callback runs synchronously on the thread that changed the frame:
	/// a playback worker for timed steps, the caller for manual steps. It
	/// must not block on anything that waits for [`Sprite::stop`].
	pub fn set_on_update<F>(&self, callback: F)
	where
		F: Fn() + Send + Sync + 'static,
	{
		*lock(&self.display.on_update) = Some(Arc::new(callback));
	}

	/// Removes the change callback.
	pub fn clear_on_update(&self) {
		*lock(&self.display.on_update) = None;
	}

	/// Replaces the displayed frame and fires the change callback.
	pub fn set_image(&self, frame: Frame) {
		self.display.show(frame);
	}

	/// Registers a cycle.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::DuplicateCycle`] if the name is taken, or
	/// [`SpriteError::ForeignCycle`] if the cycle was built from another
	/// sprite. The registry is unchanged in both cases.
	pub fn add_cycle(&mut self, cycle: Cycle) -> Result<()> {
		if self.cycle(cycle.name()).is_some() {
			warn!("Duplicate cycle '{}' not added", cycle.name());
			return Err(SpriteError::DuplicateCycle(cycle.name().to_string()));
		}
		if !cycle.belongs_to(&self.display_handle()) {
			warn!("Cycle '{}' was built from another sprite", cycle.name());
			return Err(SpriteError::ForeignCycle(cycle.name().to_string()));
		}

		debug!("Added cycle '{}' ({} frames)", cycle.name(), cycle.len());
		self.cycles.push(cycle);
		Ok(())
	}

	/// Activates the cycle called `name` and displays its starting frame
	/// (the last frame if the cycle plays in reverse).
	///
	/// A different cycle that was playing is halted first.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::UnknownCycle`] if no such cycle is registered;
	/// the active cycle is unchanged.
	pub fn set_cycle(&mut self, name: &str) -> Result<()> {
		let Some(index) = self.cycles.iter().position(|c| c.name() == name) else {
			warn!("No such cycle '{}'", name);
			return Err(SpriteError::UnknownCycle(name.to_string()));
		};

		if let Some(previous) = self.active.filter(|&p| p != index)
			&& self.cycles[previous].halt()
		{
			debug!("Halted cycle '{}'", self.cycles[previous].name());
		}

		self.active = Some(index);
		self.cycles[index].cue();
		info!("Active cycle is now '{}'", name);
		Ok(())
	}

	/// Returns the registered cycle called `name`.
	pub fn cycle(&self, name: &str) -> Option<&Cycle> {
		self.cycles.iter().find(|c| c.name() == name)
	}

	/// Returns all registered cycles in registration order.
	pub fn cycles(&self) -> &[Cycle] {
		&self.cycles
	}

	/// Returns the active cycle.
	pub fn active_cycle(&self) -> Option<&Cycle> {
		self.active.and_then(|index| self.cycles.get(index))
	}

	/// Returns the name of the active cycle.
	pub fn active_cycle_name(&self) -> Option<&str> {
		self.active_cycle().map(Cycle::name)
	}

	/// Returns the names of all registered cycles in registration order.
	pub fn list_cycles(&self) -> Vec<&str> {
		self.cycles.iter().map(Cycle::name).collect()
	}

	/// Returns true if the active cycle is playing.
	pub fn is_playing(&self) -> bool {
		self.active_cycle().is_some_and(Cycle::is_playing)
	}

	fn require_active(&self) -> Result<&Cycle> {
		self.active_cycle().ok_or(SpriteError::NoActiveCycle)
	}

	/// Starts playback of the active cycle.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::NoActiveCycle`] without an active cycle, or
	/// the error from [`Cycle::play`].
	pub fn play(&self) -> Result<()> {
		self.require_active()?.play()
	}

	/// Stops playback of the active cycle.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::NoActiveCycle`] without an active cycle.
	pub fn stop(&self) -> Result<()> {
		self.require_active()?.stop();
		Ok(())
	}

	/// Steps the active cycle forward.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::NoActiveCycle`] without an active cycle.
	pub fn next(&self) -> Result<()> {
		self.require_active()?.next();
		Ok(())
	}

	/// Steps the active cycle backward.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::NoActiveCycle`] without an active cycle.
	pub fn prev(&self) -> Result<()> {
		self.require_active()?.prev();
		Ok(())
	}

	/// Jumps the active cycle to `index`.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::NoActiveCycle`] without an active cycle, or
	/// [`SpriteError::IndexOutOfRange`] from [`Cycle::set`].
	pub fn set_frame(&self, index: usize) -> Result<()> {
		self.require_active()?.set(index)
	}

	/// Redisplays the active cycle's current frame, for example after
	/// toggling its mirror flag.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::NoActiveCycle`] without an active cycle.
	pub fn refresh(&self) -> Result<()> {
		self.require_active()?.refresh_frame();
		Ok(())
	}
}

impl std::fmt::Debug for Sprite {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Sprite")
			.field("grid", &self.grid)
			.field("format", &self.sheet.format())
			.field("frames", &self.frames.len())
			.field("cycles", &self.list_cycles())
			.field("active", &self.active_cycle_name())
			.finish()
	}
}
