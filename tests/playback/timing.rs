use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	thread,
	time::Duration,
};

use frameloop_rs::prelude::*;

use crate::{read_frame, small_sprite};

#[test_log::test]
fn stop_within_first_tick_changes_nothing() {
	let mut sprite = small_sprite();
	sprite.add_cycle(Cycle::new("Slow", &sprite, 0, 6, 2).unwrap()).unwrap();
	sprite.set_cycle("Slow").unwrap();
	sprite.set_frame(2).unwrap();
	let before = sprite.image();

	sprite.play().unwrap();
	thread::sleep(Duration::from_millis(50));
	sprite.stop().unwrap();

	assert_eq!(sprite.image(), before);
	assert_eq!(sprite.active_cycle().unwrap().index(), 2);
	assert!(!sprite.is_playing());
}

#[test_log::test]
fn playback_advances_on_a_worker_thread() {
	let mut sprite = small_sprite();
	sprite.add_cycle(Cycle::new("Fast", &sprite, 0, 6, 25).unwrap()).unwrap();
	sprite.set_cycle("Fast").unwrap();

	let threads = Arc::new(Mutex::new(Vec::new()));
	let seen = Arc::clone(&threads);
	sprite.set_on_update(move || {
		let name = thread::current().name().map(str::to_string);
		seen.lock().unwrap().push(name);
	});

	sprite.play().unwrap();
	thread::sleep(Duration::from_millis(300));
	sprite.stop().unwrap();

	let names = threads.lock().unwrap().clone();
	// at least a couple of timed steps plus the refresh from stop()
	assert!(names.len() >= 3, "only {} updates", names.len());
	assert_eq!(names[0].as_deref(), Some("frameloop-cycle"));
	assert_ne!(names.last().unwrap().as_deref(), Some("frameloop-cycle"));
}

#[test_log::test]
fn reverse_playback_starts_from_the_tail() {
	let mut sprite = small_sprite();
	let cycle = Cycle::new("Back", &sprite, 0, 6, 20).unwrap().with_reverse(true);
	sprite.add_cycle(cycle).unwrap();
	sprite.set_cycle("Back").unwrap();
	assert_eq!(read_frame(&sprite.image()).0, 5);

	sprite.play().unwrap();
	thread::sleep(Duration::from_millis(130));
	sprite.stop().unwrap();

	let index = sprite.active_cycle().unwrap().index();
	assert!(index < 5, "expected backwards steps, index is {index}");
}

#[test_log::test]
fn play_twice_runs_a_single_worker() {
	let mut sprite = small_sprite();
	sprite.add_cycle(Cycle::new("Tick", &sprite, 0, 6, 10).unwrap()).unwrap();
	sprite.set_cycle("Tick").unwrap();

	let updates = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&updates);
	sprite.set_on_update(move || {
		counter.fetch_add(1, Ordering::SeqCst);
	});

	sprite.play().unwrap();
	sprite.play().unwrap();
	thread::sleep(Duration::from_millis(250));
	sprite.stop().unwrap();

	// two ticks at 10 fps plus the stop refresh; a second worker would double the ticks
	let count = updates.load(Ordering::SeqCst);
	assert!((2..=4).contains(&count), "{count} updates");
}

#[test_log::test]
fn non_looping_playback_can_stop_itself() {
	let mut sprite = small_sprite();
	let cycle = Cycle::new("Once", &sprite, 0, 3, 50).unwrap().with_looping(false);
	sprite.add_cycle(cycle).unwrap();
	sprite.set_cycle("Once").unwrap();

	let sprite = Arc::new(sprite);
	let weak = Arc::downgrade(&sprite);
	sprite.cycle("Once").unwrap().set_on_end(move || {
		if let Some(sprite) = weak.upgrade() {
			let _ = sprite.stop();
		}
	});

	sprite.play().unwrap();
	thread::sleep(Duration::from_millis(200));
	assert!(!sprite.is_playing());
	assert_eq!(sprite.active_cycle().unwrap().index(), 0);
}

#[test_log::test]
fn dropping_the_sprite_stops_playback() {
	let sprite = small_sprite();
	let updates = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&updates);
	sprite.set_on_update(move || {
		counter.fetch_add(1, Ordering::SeqCst);
	});
	sprite.active_cycle().unwrap().set_speed(50).unwrap();
	sprite.play().unwrap();
	thread::sleep(Duration::from_millis(50));
	drop(sprite);

	let after_drop = updates.load(Ordering::SeqCst);
	thread::sleep(Duration::from_millis(60));
	assert_eq!(updates.load(Ordering::SeqCst), after_drop);
}

#[test_log::test]
fn manual_stepping_while_playing_keeps_a_valid_index() {
	let mut sprite = small_sprite();
	sprite.add_cycle(Cycle::new("Busy", &sprite, 1, 5, 200).unwrap()).unwrap();
	sprite.set_cycle("Busy").unwrap();
	let sprite = Arc::new(sprite);

	sprite.play().unwrap();
	let stepper = {
		let sprite = Arc::clone(&sprite);
		thread::spawn(move || {
			for i in 0..2000 {
				match i % 3 {
					0 => sprite.next().unwrap(),
					1 => sprite.prev().unwrap(),
					_ => sprite.set_frame(i % 4).unwrap(),
				}
			}
		})
	};
	stepper.join().unwrap();
	sprite.stop().unwrap();

	let cycle = sprite.active_cycle().unwrap();
	assert!(!cycle.is_playing());
	assert!(cycle.index() < cycle.len(), "index {} of {}", cycle.index(), cycle.len());
	let (number, _) = read_frame(&sprite.image());
	assert!((1..5).contains(&number), "displayed frame {number}");
}
