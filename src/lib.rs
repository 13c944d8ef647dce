#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `frameloop-rs` slices sprite sheets into frames and plays named frame
//! cycles as timed animations.
//!
//! Rendering is left to the caller: register a change callback and draw
//! whatever [`Sprite::image`](prelude::Sprite::image) returns.
//!
pub use frameloop_core::*;
