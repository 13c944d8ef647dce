//! Independently encoded frame images.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use crate::error::Result;

/// A single encoded frame image.
///
/// Frames hold the encoded bytes (not pixels) so they can be handed to a
/// renderer as-is. Cloning a frame only bumps a reference count.
///
/// # Examples
///
/// ```
/// use frameloop_core::sheet::Frame;
/// use image::{DynamicImage, ImageFormat, RgbaImage};
///
/// let image = DynamicImage::ImageRgba8(RgbaImage::new(4, 2));
/// let frame = Frame::encode(&image, ImageFormat::Png).unwrap();
///
/// assert_eq!(frame.width(), 4);
/// assert_eq!(frame.height(), 2);
/// assert_eq!(frame.mirrored().unwrap().width(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
	data: Bytes,
	format: ImageFormat,
	width: u32,
	height: u32,
}

impl Frame {
	/// Encodes `image` with the default encoder settings of `format`.
	///
	/// # Errors
	///
	/// Returns an error if the encoder rejects the image (for example an
	/// unsupported color type for the format).
	pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Self> {
		let mut buffer = Cursor::new(Vec::new());
		image.write_to(&mut buffer, format)?;

		Ok(Self {
			data: Bytes::from(buffer.into_inner()),
			format,
			width: image.width(),
			height: image.height(),
		})
	}

	/// Wraps already encoded image bytes, detecting their format.
	///
	/// # Errors
	///
	/// Returns an error if the format can not be detected or the header
	/// can not be read.
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

	/// Returns the encoded bytes.
	pub fn data(&self) -> &Bytes {
		&self.data
	}

	/// Returns the encoding of this frame.
	pub fn format(&self) -> ImageFormat {
		self.format
	}

	/// Returns the frame width in pixels.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Returns the frame height in pixels.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Returns the encoded size in bytes.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Returns true if the frame holds no bytes.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Decodes the frame back into pixels.
	///
	/// # Errors
	///
	/// Returns an error if the bytes are not a valid image of this format.
	pub fn decode(&self) -> Result<DynamicImage> {
		Ok(image::load_from_memory_with_format(&self.data, self.format)?)
	}

	/// Returns a horizontally flipped copy, re-encoded in the same format.
	///
	/// # Errors
	///
	/// Returns an error if decoding or re-encoding fails.
	pub fn mirrored(&self) -> Result<Self> {
		let flipped = self.decode()?.fliph();
		Self::encode(&flipped, self.format)
	}
}

impl From<Frame> for Bytes {
	fn from(frame: Frame) -> Self {
		frame.data
	}
}

impl AsRef<[u8]> for Frame {
	fn as_ref(&self) -> &[u8] {
		&self.data
	}
}

impl std::fmt::Display for Frame {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Frame({}x{}, {:?}, {} bytes)",
			self.width,
			self.height,
			self.format,
			self.data.len()
		)
	}
}
