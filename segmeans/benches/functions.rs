use criterion::{
	black_box, criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, BenchmarkId, Criterion,
	SamplingMode,
};
use palette::Srgb;
use segmeans::LabeledPoint;
use std::time::Duration;

#[allow(clippy::cast_possible_truncation)]
fn synthetic_image(width: u32, height: u32) -> Vec<Srgb<u8>> {
	(0..height)
		.flat_map(|y| {
			(0..width).map(move |x| {
				let r = (x * 255 / width) as u8;
				let g = (y * 255 / height) as u8;
				let b = ((x ^ y) & 0xff) as u8;
				Srgb::new(r, g, b)
			})
		})
		.collect()
}

fn labeled_points(pixels: &[Srgb<u8>], k: u8) -> Vec<LabeledPoint> {
	let stride = pixels.len() / usize::from(k);
	(0..k)
		.flat_map(|class| {
			let start = usize::from(class) * stride;
			pixels[start..(start + 16).min(pixels.len())]
				.iter()
				.map(move |&color| LabeledPoint::new(color, class))
		})
		.collect()
}

fn create_group<'a>(c: &'a mut Criterion, name: &'a str) -> BenchmarkGroup<'a, WallTime> {
	let mut group = c.benchmark_group(name);
	group
		.sample_size(30)
		.noise_threshold(0.05)
		.sampling_mode(SamplingMode::Flat)
		.warm_up_time(Duration::from_millis(500));
	group
}

fn cluster(c: &mut Criterion) {
	let mut group = create_group(c, "cluster");
	group.measurement_time(Duration::from_secs(4));

	for (width, height) in [(480, 270), (1920, 1080)] {
		let pixels = synthetic_image(width, height);
		for k in [2, 4, 8, 16] {
			let points = labeled_points(&pixels, k);
			group.bench_with_input(
				BenchmarkId::new(format!("{width}x{height}"), k),
				&(&pixels, &points),
				|b, &(pixels, points)| {
					b.iter(|| segmeans::cluster(pixels, points, black_box(k), black_box(segmeans::DEFAULT_MAX_ITER)));
				},
			);
		}
	}
}

criterion_group!(benches, cluster);
criterion_main!(benches);
