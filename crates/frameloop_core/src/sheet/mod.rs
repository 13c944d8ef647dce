//! Sprite sheet slicing.
//!
//! A sheet is a single encoded image holding every frame of a sprite laid out
//! on a regular grid. [`Grid`] describes that layout and [`Sheet::extract`]
//! crops it into independently encoded [`Frame`]s.
//!
//! # Layout
//!
//! ```text
//! (0,0) ───────── columns × frame_width ────────▶
//!   │  ┌──────┬──────┬──────┬──────┐
//!   │  │  0   │  1   │  2   │  3   │   cells are numbered row by row,
//!  rows├──────┼──────┼──────┼──────┤   left to right; extraction stops
//!   ×  │  4   │  5   │  6   │ (7)  │   once `total` frames are collected
//!   h  └──────┴──────┴──────┴──────┘
//!   ▼
//! ```
//!
//! # Examples
//!
//! ```
//! use frameloop_core::sheet::{Grid, Sheet};
//! use image::{DynamicImage, ImageFormat, RgbaImage};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut png = Cursor::new(Vec::new());
//! DynamicImage::ImageRgba8(RgbaImage::new(40, 20)).write_to(&mut png, ImageFormat::Png)?;
//!
//! let sheet = Sheet::from_bytes(png.into_inner())?;
//! let frames = sheet.extract(&Grid::new(7, 2, 4, 10, 10))?;
//! assert_eq!(frames.len(), 7);
//! # Ok(())
//! # }
//! ```

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Dimension, Result, SpriteError};

pub mod frame;

pub use frame::Frame;

/// Grid descriptor: how frames are laid out on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
	/// Number of frame rows
	pub rows: u32,
	/// Number of frame columns
	pub columns: u32,
	/// Width of a single frame in pixels
	pub frame_width: u32,
	/// Height of a single frame in pixels
	pub frame_height: u32,
	/// Declared number of frames; may be less than `rows * columns`
	pub total: u32,
}

impl Grid {
	/// Creates a grid descriptor.
	///
	/// Arguments follow the order used when describing a sheet: frame total
	/// first, then the grid shape, then the cell size.
	pub fn new(total: u32, rows: u32, columns: u32, frame_width: u32, frame_height: u32) -> Self {
		Self {
			rows,
			columns,
			frame_width,
			frame_height,
			total,
		}
	}

	/// Number of cells on the grid.
	pub fn cell_count(&self) -> u64 {
		u64::from(self.rows) * u64::from(self.columns)
	}

	/// Number of frames extraction will produce.
	pub fn frame_count(&self) -> usize {
		self.cell_count().min(u64::from(self.total)) as usize
	}

	/// Top-left pixel of the cell at `index`, counting row by row.
	///
	/// Returns `None` past the last cell or when the origin does not fit in
	/// a `u32`.
	pub fn cell_origin(&self, index: usize) -> Option<(u32, u32)> {
		if self.columns == 0 || index as u64 >= self.cell_count() {
			return None;
		}
		let columns = self.columns as usize;
		let column = u32::try_from(index % columns).ok()?;
		let row = u32::try_from(index / columns).ok()?;
		Some((column.checked_mul(self.frame_width)?, row.checked_mul(self.frame_height)?))
	}

	/// Checks that the grid is non-empty and fits a `width × height` sheet.
	///
	/// Width and height are checked independently; the error names the axis
	/// that overflowed and the largest frame size that would fit.
	///
	/// # Errors
	///
	/// Returns [`SpriteError::EmptyGrid`] if any field is zero, or
	/// [`SpriteError::GridMismatch`] if the grid is larger than the sheet.
	pub fn validate(&self, width: u32, height: u32) -> Result<()> {
		for (field, value) in [
			("rows", self.rows),
			("columns", self.columns),
			("frame_width", self.frame_width),
			("frame_height", self.frame_height),
			("total", self.total),
		] {
			if value == 0 {
				return Err(SpriteError::EmptyGrid {
					field,
				});
			}
		}

		Self::check_axis(Dimension::Width, self.frame_width, self.columns, width)?;
		Self::check_axis(Dimension::Height, self.frame_height, self.rows, height)
	}

	fn check_axis(dimension: Dimension, cell: u32, count: u32, available: u32) -> Result<()> {
		let required = u64::from(cell) * u64::from(count);
		if required > u64::from(available) {
			return Err(SpriteError::GridMismatch {
				dimension,
				required,
				available,
				max_frame: available / count,
			});
		}
		Ok(())
	}
}

impl std::fmt::Display for Grid {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{}x{} grid of {}x{} frames ({} declared)",
			self.rows, self.columns, self.frame_width, self.frame_height, self.total
		)
	}
}

/// An encoded sprite sheet.
///
/// Only the header is read on construction; pixels are decoded on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
	data: Bytes,
	format: ImageFormat,
	width: u32,
	height: u32,
}

impl Sheet {
	/// Wraps encoded sheet bytes.
	///
	/// # Errors
	///
	/// Returns an error if the image format can not be detected or the
	/// image header can not be read.
	pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
		let data = data.into();
		let format = image::guess_format(&data)?;
		let (width, height) =
			image::ImageReader::with_format(Cursor::new(&data[..]), format).into_dimensions()?;

		Ok(Self {
			data,
			format,
			width,
			height,
		})
	}

	/// Reads a sheet from the specified path.
	///
	/// # Errors
	///
	/// Returns an error if the file can not be read or is not an image.
	pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
		let data = std::fs::read(path)?;
		Self::from_bytes(data)
	}

	/// Returns the encoded sheet bytes.
	pub fn data(&self) -> &Bytes {
		&self.data
	}

	/// Returns the detected image format.
	pub fn format(&self) -> ImageFormat {
		self.format
	}

	/// Returns the sheet width in pixels.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Returns the sheet height in pixels.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Decodes the whole sheet.
	///
	/// # Errors
	///
	/// Returns an error if the pixel data is malformed.
	pub fn decode(&self) -> Result<DynamicImage> {
		Ok(image::load_from_memory_with_format(&self.data, self.format)?)
	}

	/// Slices the sheet into frames according to `grid`.
	///
	/// The grid is validated against the sheet size before anything is
	/// decoded. Frames are re-encoded in the sheet's own format.
	///
	/// # Errors
	///
	/// Returns an error if the grid does not fit, or if decoding or
	/// encoding fails.
	pub fn extract(&self, grid: &Grid) -> Result<Vec<Frame>> {
		grid.validate(self.width, self.height)?;
		let image = self.decode()?;
		crop_frames(&image, grid, self.format)
	}
}

/// Slices encoded sheet bytes into frames.
///
/// Shorthand for [`Sheet::from_bytes`] followed by [`Sheet::extract`].
///
/// # Errors
///
/// See [`Sheet::from_bytes`] and [`Sheet::extract`].
pub fn extract(sheet: impl Into<Bytes>, grid: &Grid) -> Result<Vec<Frame>> {
	Sheet::from_bytes(sheet)?.extract(grid)
}

/// Crops every cell of an already decoded sheet, row by row.
///
/// Stops as soon as `grid.total` frames are collected, even mid-row.
///
/// # Errors
///
/// Returns an error if the grid does not fit or a frame fails to encode.
pub fn crop_frames(image: &DynamicImage, grid: &Grid, format: ImageFormat) -> Result<Vec<Frame>> {
	grid.validate(image.width(), image.height())?;

	let total = grid.total as usize;
	let mut frames = Vec::with_capacity(grid.frame_count());

	for index in 0..total {
		let Some((x, y)) = grid.cell_origin(index) else {
			break;
		};
		let cell = image.crop_imm(x, y, grid.frame_width, grid.frame_height);
		frames.push(Frame::encode(&cell, format)?);
	}

	if frames.len() < total {
		warn!(
			"Sheet grid only holds {} cells, {} frames were declared",
			frames.len(),
			total
		);
	}
	debug!("Extracted {} frames from {}", frames.len(), grid);

	Ok(frames)
}
