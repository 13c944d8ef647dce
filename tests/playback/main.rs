//! Integration tests for sprite construction and frame cycle playback

mod stepping;
mod timing;

use std::io::Cursor;

use frameloop_rs::prelude::*;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// Builds a PNG sheet for `grid` where each cell's left column carries its
/// cell number in the red channel and the rest of the cell is white, so both
/// the frame number and its orientation can be read back.
pub(crate) fn numbered_sheet(grid: &Grid) -> Vec<u8> {
	let width = grid.columns * grid.frame_width;
	let height = grid.rows * grid.frame_height;
	let image = RgbaImage::from_fn(width, height, |x, y| {
		if x % grid.frame_width == 0 {
			let cell = (y / grid.frame_height) * grid.columns + x / grid.frame_width;
			Rgba([cell as u8, 0, 0, 255])
		} else {
			Rgba([255, 255, 255, 255])
		}
	});

	let mut png = Cursor::new(Vec::new());
	DynamicImage::ImageRgba8(image).write_to(&mut png, ImageFormat::Png).unwrap();
	png.into_inner()
}

/// Reads back `(cell number, mirrored)` from a frame of [`numbered_sheet`].
pub(crate) fn read_frame(frame: &Frame) -> (u8, bool) {
	let pixels = frame.decode().unwrap().to_rgba8();
	let last = pixels.width() - 1;
	let left = pixels.get_pixel(0, 0);
	if left[1] == 0 {
		(left[0], false)
	} else {
		(pixels.get_pixel(last, 0)[0], true)
	}
}

/// The 624x336 character sheet: 3 rows of 6 frames at 104x112, 17 used.
pub(crate) fn character_grid() -> Grid {
	Grid::new(17, 3, 6, 104, 112)
}

pub(crate) fn small_grid() -> Grid {
	Grid::new(6, 2, 3, 4, 3)
}

pub(crate) fn small_sprite() -> Sprite {
	let grid = small_grid();
	Sprite::new(numbered_sheet(&grid), grid).unwrap()
}
