//! Error types for sprite construction and playback control.

use thiserror::Error;

/// Axis of a sheet that a grid descriptor was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
	/// Horizontal axis (`frame_width * columns` against the sheet width)
	Width,
	/// Vertical axis (`frame_height * rows` against the sheet height)
	Height,
}

impl std::fmt::Display for Dimension {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Width => write!(f, "width"),
			Self::Height => write!(f, "height"),
		}
	}
}

/// Unified error type for the `frameloop` crates.
#[derive(Debug, Error)]
pub enum SpriteError {
	/// The sheet (or a frame) could not be decoded or re-encoded
	#[error(transparent)]
	Image(#[from] image::ImageError),

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// A manifest could not be loaded or deserialized
	#[error(transparent)]
	Config(#[from] config::ConfigError),

	/// A grid field that must be positive was zero
	#[error("Invalid grid: {field} must be greater than zero")]
	EmptyGrid {
		/// Name of the offending grid field
		field: &'static str,
	},

	/// The grid does not fit inside the sheet along one axis
	#[error(
		"Grid exceeds sheet {dimension}: {required}px required, sheet is {available}px (maximum frame {dimension} is {max_frame}px)"
	)]
	GridMismatch {
		/// Axis that overflowed
		dimension: Dimension,
		/// Pixels the grid needs along that axis
		required: u64,
		/// Pixels the sheet provides along that axis
		available: u32,
		/// Largest frame size along that axis that would still fit
		max_frame: u32,
	},

	/// A cycle range reaches past the sprite's frames
	#[error("Frame range {start}..{end} out of bounds (sprite has {total} frames)")]
	FrameRange {
		/// First frame index (inclusive)
		start: usize,
		/// Last frame index (exclusive)
		end: usize,
		/// Number of frames in the sprite
		total: usize,
	},

	/// A cycle range selects no frames
	#[error("Cycle '{name}' has an empty frame range")]
	EmptyCycle {
		/// Name of the rejected cycle
		name: String,
	},

	/// Playback speed must be at least one frame per second
	#[error("Invalid speed {0}: must be at least 1 frame per second")]
	InvalidSpeed(u32),

	/// A cycle with the same name is already registered
	#[error("Duplicate cycle name '{0}', cycle names can not be re-used")]
	DuplicateCycle(String),

	/// No cycle with the requested name is registered
	#[error("No such cycle '{0}', add the cycle before selecting it")]
	UnknownCycle(String),

	/// The cycle was built from a different sprite
	#[error("Cycle '{0}' belongs to another sprite")]
	ForeignCycle(String),

	/// The sprite has no active cycle
	#[error("No active cycle")]
	NoActiveCycle,

	/// Frame index outside the cycle
	#[error("Frame index {index} out of range (cycle has {total} frames)")]
	IndexOutOfRange {
		/// Requested index
		index: usize,
		/// Number of frames in the cycle
		total: usize,
	},
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpriteError>;
