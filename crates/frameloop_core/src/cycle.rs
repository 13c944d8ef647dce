//! Frame cycles.
//!
//! A [`Cycle`] is a named, contiguous run of a sprite's frames with its own
//! playback position and flags. Cycles are created against a
//! [`Sprite`](crate::sprite::Sprite) and display their frames through it.
//!
//! # Playback model
//!
//! ```text
//!            play()                     stop()
//! Stopped ───────────▶ Playing ───────────────────▶ Stopped
//!                        │  every 1/speed s:            (worker joined,
//!                        │  step forward or backward     frame refreshed)
//!                        ▼
//!                  next()/prev() at the boundary:
//!                    loop    → wrap to the opposite end
//!                    no loop → index = 0, end callback
//! ```
//!
//! Each playing cycle owns exactly one worker thread. The worker waits on a
//! bounded stop channel for one tick interval; a stop request always wins
//! over the pending advance. All index and flag changes, whether from the
//! worker or from the caller's thread, go through a single mutex per cycle,
//! so manual stepping while playing is safe.
//!
//! # Examples
//!
//! ```no_run
//! use frameloop_core::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sprite = Sprite::open("margery.png", Grid::new(17, 3, 6, 104, 112))?;
//!
//! // frames 12, 13, 14 and 15 at 3 frames per second
//! sprite.add_cycle(Cycle::new("Idle", &sprite, 12, 16, 3)?.with_looping(false))?;
//! sprite.set_cycle("Idle")?;
//! sprite.play()?;
//! # Ok(())
//! # }
//! ```

use std::sync::{
	Arc, Mutex, Weak,
	mpsc::{self, Receiver, RecvTimeoutError, SyncSender},
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
	error::{Result, SpriteError},
	lock,
	sheet::Frame,
	sprite::{Display, Sprite},
};

/// Name of the cycle spanning every frame, registered on every sprite.
pub const ALL_FRAMES: &str = "All";

/// Stop requests the channel absorbs before `stop()` would have to wait.
const STOP_QUEUE_CAPACITY: usize = 10;

/// Notification callback with no arguments, shared across threads.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// What happens to the playback position when a cycle is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPolicy {
	/// Keep the current frame
	#[default]
	Hold,
	/// Return to the first frame
	Rewind,
}

impl std::fmt::Display for StopPolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Hold => write!(f, "hold"),
			Self::Rewind => write!(f, "rewind"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
	Forward,
	Backward,
}

/// Mutable playback state, guarded by the cycle mutex.
#[derive(Debug)]
struct Playback {
	index: usize,
	speed: u32,
	looping: bool,
	reverse: bool,
	mirror: bool,
	playing: bool,
	stop_policy: StopPolicy,
}

impl Playback {
	fn direction(&self) -> Direction {
		if self.reverse {
			Direction::Backward
		} else {
			Direction::Forward
		}
	}

	fn interval(&self) -> Duration {
		Duration::from_secs(1) / self.speed.max(1)
	}

	/// Moves one frame in `direction`. Returns true if a non-looping cycle
	/// ran off its end (the index is then reset to 0).
	fn advance(&mut self, direction: Direction, total: usize) -> bool {
		let last = total.saturating_sub(1);
		match direction {
			Direction::Forward if self.index < last => self.index += 1,
			Direction::Backward if self.index > 0 => self.index -= 1,
			Direction::Forward if self.looping => self.index = 0,
			Direction::Backward if self.looping => self.index = last,
			_ => {
				self.index = 0;
				return true;
			}
		}
		false
	}
}

/// State shared between a cycle handle and its worker thread.
struct Shared {
	name: String,
	frames: Vec<Frame>,
	mirrors: Vec<Frame>,
	state: Mutex<Playback>,
	on_end: Mutex<Option<Callback>>,
	// non-owning: the sprite owns the display, cycles only borrow it
	display: Weak<Display>,
}

impl Shared {
	fn current_frame(&self) -> Frame {
		let state = lock(&self.state);
		let frames = if state.mirror {
			&self.mirrors
		} else {
			&self.frames
		};
		frames[state.index].clone()
	}

	/// Pushes the current frame to the sprite. Returns false once the sprite
	/// is gone.
	fn refresh(&self) -> bool {
		let frame = self.current_frame();
		match self.display.upgrade() {
			Some(display) => {
				display.show(frame);
				true
			}
			None => false,
		}
	}

	fn step(&self, direction: Direction) -> bool {
		let ended = lock(&self.state).advance(direction, self.frames.len());
		if ended {
			debug!("Cycle '{}' reached its end", self.name);
			let callback = lock(&self.on_end).clone();
			if let Some(callback) = callback {
				callback();
			}
		}
		self.refresh()
	}

	fn run(&self, stop: Receiver<()>) {
		loop {
			let interval = lock(&self.state).interval();
			match stop.recv_timeout(interval) {
				Err(RecvTimeoutError::Timeout) => {}
				Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
			}

			let direction = lock(&self.state).direction();
			trace!("Cycle '{}' tick ({:?})", self.name, direction);
			if !self.step(direction) {
				debug!("Cycle '{}' lost its sprite, stopping worker", self.name);
				lock(&self.state).playing = false;
				break;
			}
		}
	}
}

struct Worker {
	stop: SyncSender<()>,
	handle: JoinHandle<()>,
}

/// A named range of frames with its own playback state.
///
/// Frames are taken from the sprite at construction time together with a
/// precomputed horizontally mirrored copy of each, so toggling
/// [`set_mirror`](Self::set_mirror) never re-encodes anything.
///
/// All methods take `&self`; a cycle registered on a sprite can be adjusted
/// through [`Sprite::cycle`].
pub struct Cycle {
	shared: Arc<Shared>,
	worker: Mutex<Option<Worker>>,
}

impl Cycle {
	/// Creates a cycle over the sprite frames `start..end` (end exclusive,
	/// 0-based) playing at `speed` frames per second.
	///
	/// New cycles loop, play forward, are not mirrored and hold their frame
	/// when stopped.
	///
	/// # Errors
	///
	/// Returns an error if `speed` is zero, the range is empty or reaches
	/// past the sprite's frames, or mirroring a frame fails.
	pub fn new(
		name: impl Into<String>,
		sprite: &Sprite,
		start: usize,
		end: usize,
		speed: u32,
	) -> Result<Self> {
		Self::build(name.into(), sprite.frames(), sprite.display_handle(), start, end, speed)
	}

	/// Creates the [`ALL_FRAMES`] cycle spanning every frame at one frame
	/// per second.
	///
	/// # Errors
	///
	/// Returns an error if mirroring a frame fails.
	pub fn all_frames(sprite: &Sprite) -> Result<Self> {
		Self::build(
			ALL_FRAMES.to_string(),
			sprite.frames(),
			sprite.display_handle(),
			0,
			sprite.frame_count(),
			1,
		)
	}

	pub(crate) fn build(
		name: String,
		frames: &[Frame],
		display: Weak<Display>,
		start: usize,
		end: usize,
		speed: u32,
	) -> Result<Self> {
		if speed == 0 {
			warn!("Cycle '{}' rejected: speed must be at least 1", name);
			return Err(SpriteError::InvalidSpeed(speed));
		}
		if end > frames.len() {
			warn!("Cycle '{}' rejected: frames {}..{} of {}", name, start, end, frames.len());
			return Err(SpriteError::FrameRange {
				start,
				end,
				total: frames.len(),
			});
		}
		if start >= end {
			warn!("Cycle '{}' rejected: empty range {}..{}", name, start, end);
			return Err(SpriteError::EmptyCycle {
				name,
			});
		}

		let frames = frames[start..end].to_vec();
		let mirrors = frames.iter().map(Frame::mirrored).collect::<Result<Vec<_>>>()?;
		debug!("Created cycle '{}' over frames {}..{} at {} fps", name, start, end, speed);

		Ok(Self {
			shared: Arc::new(Shared {
				name,
				frames,
				mirrors,
				state: Mutex::new(Playback {
					index: 0,
					speed,
					looping: true,
					reverse: false,
					mirror: false,
					playing: false,
					stop_policy: StopPolicy::Hold,
				}),
				on_end: Mutex::new(None),
				display,
			}),
			worker: Mutex::new(None),
		})
	}

	/// Returns the cycle name.
	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Returns the number of frames in the cycle.
	pub fn len(&self) -> usize {
		self.shared.frames.len()
	}

	/// Returns true if the cycle has no frames.
	pub fn is_empty(&self) -> bool {
		self.shared.frames.is_empty()
	}

	/// Returns the frames of the cycle, in order.
	pub fn frames(&self) -> &[Frame] {
		&self.shared.frames
	}

	/// Returns the mirrored frames, parallel to [`frames`](Self::frames).
	pub fn mirrors(&self) -> &[Frame] {
		&self.shared.mirrors
	}

	/// Returns the frame the cycle would display right now.
	pub fn current_frame(&self) -> Frame {
		self.shared.current_frame()
	}

	/// Returns the current position within the cycle.
	pub fn index(&self) -> usize {
		lock(&self.shared.state).index
	}

	/// Returns the playback speed in frames per second.
	pub fn speed(&self) -> u32 {
		lock(&self.shared.state).speed
	}

	/// Returns true if the cycle wraps around at its ends.
	pub fn is_looping(&self) -> bool {
		lock(&self.shared.state).looping
	}

	/// Returns true if playback steps backwards.
	pub fn is_reversed(&self) -> bool {
		lock(&self.shared.state).reverse
	}

	/// Returns true if mirrored frames are displayed.
	pub fn is_mirrored(&self) -> bool {
		lock(&self.shared.state).mirror
	}

	/// Returns true while the worker thread is advancing the cycle.
	pub fn is_playing(&self) -> bool {
		lock(&self.shared.state).playing
	}

	/// Returns the stop policy.
	pub fn stop_policy(&self) -> StopPolicy {
		lock(&self.shared.state).stop_policy
	}

	/// Sets the playback speed. Takes effect from the next tick.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::InvalidSpeed`] if `speed` is zero.
	pub fn set_speed(&self, speed: u32) -> Result<()> {
		if speed == 0 {
			warn!("Cycle '{}': speed must be at least 1", self.name());
			return Err(SpriteError::InvalidSpeed(speed));
		}
		lock(&self.shared.state).speed = speed;
		Ok(())
	}

	/// Sets whether the cycle wraps around at its ends.
	pub fn set_looping(&self, looping: bool) {
		lock(&self.shared.state).looping = looping;
	}

	/// Sets the direction of automatic playback.
	pub fn set_reverse(&self, reverse: bool) {
		lock(&self.shared.state).reverse = reverse;
	}

	/// Selects mirrored or normal frames. Call [`refresh_frame`] (or
	/// [`Sprite::refresh`]) to show the change immediately.
	///
	/// [`refresh_frame`]: Self::refresh_frame
	pub fn set_mirror(&self, mirror: bool) {
		lock(&self.shared.state).mirror = mirror;
	}

	/// Sets what [`stop`](Self::stop) does to the playback position.
	pub fn set_stop_policy(&self, policy: StopPolicy) {
		lock(&self.shared.state).stop_policy = policy;
	}

	/// Builder form of [`set_looping`](Self::set_looping).
	pub fn with_looping(self, looping: bool) -> Self {
		self.set_looping(looping);
		self
	}

	/// Builder form of [`set_reverse`](Self::set_reverse).
	pub fn with_reverse(self, reverse: bool) -> Self {
		self.set_reverse(reverse);
		self
	}

	/// Builder form of [`set_mirror`](Self::set_mirror).
	pub fn with_mirror(self, mirror: bool) -> Self {
		self.set_mirror(mirror);
		self
	}

	/// Builder form of [`set_stop_policy`](Self::set_stop_policy).
	pub fn with_stop_policy(self, policy: StopPolicy) -> Self {
		self.set_stop_policy(policy);
		self
	}

	/// Registers the callback invoked when a non-looping cycle runs off
	/// either end.
	///
	/// The callback runs on whichever thread stepped the cycle: the worker
	/// during playback, the caller for [`next`](Self::next) and
	/// [`prev`](Self::prev). It may call back into the cycle.
	pub fn set_on_end<F>(&self, callback: F)
	where
		F: Fn() + Send + Sync + 'static,
	{
		*lock(&self.shared.on_end) = Some(Arc::new(callback));
	}

	/// Removes the end callback.
	pub fn clear_on_end(&self) {
		*lock(&self.shared.on_end) = None;
	}

	/// Starts timed playback on a worker thread.
	///
	/// The first step happens one tick after this call. Calling `play` on a
	/// cycle that is already playing does nothing.
	///
	/// # Errors
	///
	/// Returns an error if the worker thread can not be spawned.
	pub fn play(&self) -> Result<()> {
		let mut worker = lock(&self.worker);
		if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
			debug!("Cycle '{}' is already playing", self.name());
			return Ok(());
		}
		if let Some(finished) = worker.take()
			&& finished.handle.join().is_err()
		{
			warn!("Cycle '{}' worker panicked", self.name());
		}

		let (stop, signal) = mpsc::sync_channel(STOP_QUEUE_CAPACITY);
		let shared = Arc::clone(&self.shared);
		lock(&self.shared.state).playing = true;

		let spawned =
			thread::Builder::new().name("frameloop-cycle".into()).spawn(move || shared.run(signal));
		let handle = match spawned {
			Ok(handle) => handle,
			Err(e) => {
				lock(&self.shared.state).playing = false;
				return Err(e.into());
			}
		};

		*worker = Some(Worker {
			stop,
			handle,
		});
		info!("Cycle '{}' playing at {} fps", self.name(), self.speed());
		Ok(())
	}

	/// Stops playback and redisplays the current frame.
	///
	/// The worker thread is joined before this returns, unless `stop` is
	/// called from the worker itself (for example inside the end callback),
	/// in which case the worker exits right after the callback.
	pub fn stop(&self) {
		let was_playing = self.halt();
		{
			let mut state = lock(&self.shared.state);
			state.playing = false;
			if state.stop_policy == StopPolicy::Rewind {
				state.index = 0;
			}
		}
		if was_playing {
			info!("Cycle '{}' stopped at frame {}", self.name(), self.index());
		}
		self.shared.refresh();
	}

	/// Steps one frame forward and displays it.
	pub fn next(&self) {
		self.shared.step(Direction::Forward);
	}

	/// Steps one frame backward and displays it.
	pub fn prev(&self) {
		self.shared.step(Direction::Backward);
	}

	/// Jumps to `index` and displays it.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::IndexOutOfRange`] if `index` is not a frame of
	/// this cycle; the position is left unchanged.
	pub fn set(&self, index: usize) -> Result<()> {
		let total = self.len();
		if index >= total {
			warn!("Cycle '{}': frame {} out of range ({} frames)", self.name(), index, total);
			return Err(SpriteError::IndexOutOfRange {
				index,
				total,
			});
		}
		lock(&self.shared.state).index = index;
		self.shared.refresh();
		Ok(())
	}

	/// Displays the current frame (mirrored if the mirror flag is set).
	pub fn refresh_frame(&self) {
		self.shared.refresh();
	}

	/// Moves to the frame playback starts from (the last one when reversed)
	/// and displays it.
	pub(crate) fn cue(&self) {
		{
			let mut state = lock(&self.shared.state);
			state.index = match state.direction() {
				Direction::Forward => 0,
				Direction::Backward => self.len().saturating_sub(1),
			};
		}
		self.shared.refresh();
	}

	/// Signals the worker to exit and joins it. Returns true if a worker was
	/// running.
	pub(crate) fn halt(&self) -> bool {
		let Some(worker) = lock(&self.worker).take() else {
			return false;
		};

		let _ = worker.stop.try_send(());
		if worker.handle.thread().id() != thread::current().id() && worker.handle.join().is_err() {
			warn!("Cycle '{}' worker panicked", self.name());
		}
		lock(&self.shared.state).playing = false;
		true
	}

	pub(crate) fn belongs_to(&self, display: &Weak<Display>) -> bool {
		self.shared.display.ptr_eq(display)
	}
}

impl Drop for Cycle {
	fn drop(&mut self) {
		self.halt();
	}
}

impl std::fmt::Debug for Cycle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = lock(&self.shared.state);
		f.debug_struct("Cycle")
			.field("name", &self.shared.name)
			.field("frames", &self.shared.frames.len())
			.field("index", &state.index)
			.field("speed", &state.speed)
			.field("looping", &state.looping)
			.field("reverse", &state.reverse)
			.field("mirror", &state.mirror)
			.field("playing", &state.playing)
			.finish()
	}
}
