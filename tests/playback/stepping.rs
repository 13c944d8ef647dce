use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use frameloop_rs::prelude::*;

use crate::{read_frame, small_sprite};

fn end_counter(cycle: &Cycle) -> Arc<AtomicUsize> {
	let ends = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&ends);
	cycle.set_on_end(move || {
		counter.fetch_add(1, Ordering::SeqCst);
	});
	ends
}

#[test_log::test]
fn looping_next_cycles_without_ending() {
	let mut sprite = small_sprite();
	sprite.add_cycle(Cycle::new("Walk", &sprite, 1, 5, 4).unwrap()).unwrap();
	sprite.set_cycle("Walk").unwrap();
	let walk = sprite.cycle("Walk").unwrap();
	let ends = end_counter(walk);

	for round in 0..3 {
		for expected in [2, 3, 4, 1] {
			sprite.next().unwrap();
			assert_eq!(read_frame(&sprite.image()).0, expected, "round {round}");
		}
	}
	assert_eq!(ends.load(Ordering::SeqCst), 0);
}

#[test_log::test]
fn non_looping_next_ends_exactly_once_per_pass() {
	let mut sprite = small_sprite();
	let cycle = Cycle::new("Once", &sprite, 0, 4, 4).unwrap().with_looping(false);
	sprite.add_cycle(cycle).unwrap();
	sprite.set_cycle("Once").unwrap();
	let once = sprite.cycle("Once").unwrap();
	let ends = end_counter(once);

	for _ in 0..once.len() {
		sprite.next().unwrap();
	}
	assert_eq!(once.index(), 0);
	assert_eq!(ends.load(Ordering::SeqCst), 1);
	assert_eq!(read_frame(&sprite.image()), (0, false));
}

#[test_log::test]
fn prev_walks_backwards_and_wraps() {
	let sprite = small_sprite();
	sprite.prev().unwrap();
	assert_eq!(read_frame(&sprite.image()), (5, false));
	sprite.prev().unwrap();
	assert_eq!(read_frame(&sprite.image()), (4, false));
}

#[test_log::test]
fn mirrored_frames_are_horizontal_flips() {
	let sprite = small_sprite();
	let all = sprite.active_cycle().unwrap();

	for index in 0..all.len() {
		sprite.set_frame(index).unwrap();
		all.set_mirror(false);
		sprite.refresh().unwrap();
		let normal = sprite.image().decode().unwrap();

		all.set_mirror(true);
		sprite.refresh().unwrap();
		let mirrored = sprite.image().decode().unwrap();

		assert_eq!(mirrored.to_rgba8(), normal.fliph().to_rgba8());
		assert_eq!(read_frame(&sprite.image()), (index as u8, true));
	}
}

#[test_log::test]
fn set_frame_accepts_last_and_rejects_past_end() {
	let sprite = small_sprite();
	sprite.set_frame(5).unwrap();
	assert_eq!(read_frame(&sprite.image()).0, 5);

	assert!(matches!(
		sprite.set_frame(6),
		Err(SpriteError::IndexOutOfRange {
			index: 6,
			total: 6
		})
	));
	assert_eq!(sprite.active_cycle().unwrap().index(), 5);
}

#[test_log::test]
fn duplicate_cycle_leaves_registry_untouched() {
	let mut sprite = small_sprite();
	sprite.add_cycle(Cycle::new("Walk", &sprite, 0, 2, 2).unwrap()).unwrap();
	let before = sprite.list_cycles().len();

	let err = sprite.add_cycle(Cycle::new("Walk", &sprite, 2, 6, 8).unwrap()).unwrap_err();
	assert!(matches!(err, SpriteError::DuplicateCycle(_)));
	assert_eq!(sprite.list_cycles().len(), before);
	assert_eq!(sprite.cycle("Walk").unwrap().len(), 2);
	assert_eq!(sprite.list_cycles(), vec![ALL_FRAMES, "Walk"]);
}

#[test_log::test]
fn out_of_range_cycle_is_reported() {
	let sprite = small_sprite();
	assert!(matches!(
		Cycle::new("Far", &sprite, 4, 9, 1),
		Err(SpriteError::FrameRange {
			total: 6,
			..
		})
	));
}

#[test_log::test]
fn update_callback_counts_every_display_change() {
	let sprite = small_sprite();
	let updates = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&updates);
	sprite.set_on_update(move || {
		counter.fetch_add(1, Ordering::SeqCst);
	});

	sprite.next().unwrap();
	sprite.next().unwrap();
	sprite.stop().unwrap();
	assert_eq!(updates.load(Ordering::SeqCst), 3);
}

#[test_log::test]
fn manifest_builds_ready_sprite() {
	let grid = crate::small_grid();
	let manifest = Manifest::new(grid)
		.with_cycle(CycleSpec::new("Walk", 0, 3, 6))
		.with_cycle(CycleSpec {
			reverse: true,
			..CycleSpec::new("Back", 3, 6, 6)
		});
	let mut sprite = Sprite::from_manifest(crate::numbered_sheet(&grid), &manifest).unwrap();
	assert_eq!(sprite.list_cycles(), vec![ALL_FRAMES, "Walk", "Back"]);

	sprite.set_cycle("Back").unwrap();
	assert_eq!(read_frame(&sprite.image()).0, 5);
}
