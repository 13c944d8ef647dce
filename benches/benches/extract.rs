//! Benchmark suite for sheet extraction and frame mirroring
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use frameloop_benches::{generate_sheet, layouts};
use frameloop_core::sheet::{Grid, Sheet};
use std::hint::black_box;

/// Benchmark slicing whole sheets into frames
fn bench_extract(c: &mut Criterion) {
	let mut group = c.benchmark_group("extract");

	for (name, (rows, columns, width, height)) in
		[("tiny", layouts::TINY), ("character", layouts::CHARACTER), ("atlas", layouts::ATLAS)]
	{
		let sheet = match Sheet::from_bytes(generate_sheet(rows, columns, width, height)) {
			Ok(sheet) => sheet,
			Err(e) => {
				eprintln!("Warning: could not generate {name} sheet: {e}");
				continue;
			}
		};
		let grid = Grid::new(rows * columns, rows, columns, width, height);

		group.throughput(Throughput::Elements(u64::from(rows * columns)));
		group.bench_with_input(BenchmarkId::new("frames", name), &sheet, |b, sheet| {
			b.iter(|| black_box(sheet.extract(black_box(&grid))));
		});
	}

	group.finish();
}

/// Benchmark the per-frame mirror precomputation done by every cycle
fn bench_mirror(c: &mut Criterion) {
	let mut group = c.benchmark_group("mirror");

	let (rows, columns, width, height) = layouts::CHARACTER;
	let grid = Grid::new(rows * columns, rows, columns, width, height);
	let frames = match Sheet::from_bytes(generate_sheet(rows, columns, width, height))
		.and_then(|sheet| sheet.extract(&grid))
	{
		Ok(frames) => frames,
		Err(e) => {
			eprintln!("Warning: could not prepare frames: {e}");
			return;
		}
	};

	group.bench_function("character_frame", |b| {
		b.iter(|| black_box(frames[0].mirrored()));
	});

	group.finish();
}

criterion_group!(benches, bench_extract, bench_mirror);
criterion_main!(benches);
