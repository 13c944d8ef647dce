//! Prelude module for `frameloop_core`.
//!
//! ```no_run
//! use frameloop_core::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sprite = Sprite::open("margery.png", Grid::new(17, 3, 6, 104, 112))?;
//! # Ok(())
//! # }
//! ```

#[doc(inline)]
pub use crate::{
	cycle::{ALL_FRAMES, Callback, Cycle, StopPolicy},
	error::{Dimension, SpriteError},
	manifest::{CycleSpec, Manifest},
	sheet::{Frame, Grid, Sheet, extract},
	sprite::{Sprite, Viewer},
};
