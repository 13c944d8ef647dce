//! Core engine of `frameloop-rs`: sprite sheet slicing and frame cycle playback.
//!
//! # Overview
//!
//! - [`sheet`]: grid descriptors, encoded [`Frame`](sheet::Frame)s and the
//!   extractor that crops a sheet into frames
//! - [`cycle`]: named frame ranges with timed, cancellable playback
//! - [`sprite`]: owns the frames and cycles, exposes the displayed frame and
//!   fires a change callback on every update
//! - [`manifest`]: serde descriptions of a sprite and its cycles
//!
//! # Examples
//!
//! ```no_run
//! use frameloop_core::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sprite = Sprite::open("margery.png", Grid::new(17, 3, 6, 104, 112))?;
//! sprite.add_cycle(Cycle::new("Run", &sprite, 0, 5, 5)?)?;
//! sprite.set_cycle("Run")?;
//!
//! let viewer = sprite.viewer();
//! sprite.set_on_update(move || {
//!     let frame = viewer.image();
//!     // hand frame.data() to the renderer
//! #   let _ = frame;
//! });
//!
//! sprite.play()?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod cycle;
pub mod error;
pub mod manifest;
pub mod sheet;
pub mod sprite;

/// `use frameloop_core::prelude::*;` to import commonly used items.
pub mod prelude;

/// Locks `mutex`, recovering the data if a callback panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
