//! Provides the implementation for seeded k-means

use crate::LabeledPoint;
use palette::Srgb;

/// Per-channel sum of a group of colors
type ChannelSum = [u64; 3];

/// The centroid given to classes without any labeled points
const BLACK: Srgb<u8> = Srgb::new(0, 0, 0);

/// Squared Euclidean distance between two colors in RGB space
fn squared_distance(x: Srgb<u8>, y: Srgb<u8>) -> u32 {
	let dr = u32::from(x.red.abs_diff(y.red));
	let dg = u32::from(x.green.abs_diff(y.green));
	let db = u32::from(x.blue.abs_diff(y.blue));
	dr * dr + dg * dg + db * db
}

/// Add a color to a channel sum
fn add_color(sum: &mut ChannelSum, color: Srgb<u8>) {
	sum[0] += u64::from(color.red);
	sum[1] += u64::from(color.green);
	sum[2] += u64::from(color.blue);
}

/// Remove a color that was previously added to a channel sum
fn remove_color(sum: &mut ChannelSum, color: Srgb<u8>) {
	sum[0] -= u64::from(color.red);
	sum[1] -= u64::from(color.green);
	sum[2] -= u64::from(color.blue);
}

/// The mean of `n` > 0 colors with the given channel sum, rounded half away from zero
fn mean(sum: ChannelSum, n: usize) -> Srgb<u8> {
	debug_assert!(n > 0);
	let n = n as u64;
	// the mean of u8 values cannot be greater than u8::MAX
	#[allow(clippy::cast_possible_truncation)]
	let channel = |s: u64| ((2 * s + n) / (2 * n)) as u8;
	Srgb::new(channel(sum[0]), channel(sum[1]), channel(sum[2]))
}

/// Index of the centroid closest to `color`, where the lowest index wins ties
// centroids.len() <= u8::MAX
#[allow(clippy::cast_possible_truncation)]
fn nearest(color: Srgb<u8>, centroids: &[Srgb<u8>]) -> u8 {
	let mut min_dist = u32::MAX;
	let mut min_center = 0;
	for (i, &centroid) in centroids.iter().enumerate() {
		let dist = squared_distance(color, centroid);
		if dist < min_dist {
			min_dist = dist;
			min_center = i;
		}
	}

	min_center as u8
}

/// A recoverable condition encountered while clustering
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterWarning {
	/// A labeled point referenced a class that does not exist, so it was skipped
	#[error("labeled point {point} has class index {class}, but there are only {class_count} classes")]
	InvalidClassIndex {
		/// Position of the point in the provided slice of labeled points
		point: usize,
		/// The out of range class index
		class: u8,
		/// The number of classes
		class_count: u8,
	},
	/// There were no pixels to cluster
	#[error("no pixels to cluster")]
	NoPixels,
	/// There were no classes to cluster pixels into
	#[error("no classes to cluster pixels into")]
	NoClasses,
	/// No class had any valid labeled point, so every centroid started at black
	#[error("no class has any labeled points, clustering quality depends on labeling each class")]
	NoCentroidSeed,
}

/// Result from running seeded k-means
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResult {
	/// The class index assigned to each pixel
	pub labels: Vec<u8>,
	/// Final centroid color of each class
	pub centroids: Vec<Srgb<u8>>,
	/// Number of pixels assigned to each class
	pub counts: Vec<usize>,
	/// Conditions encountered while clustering
	pub warnings: Vec<ClusterWarning>,
}

impl ClusterResult {
	/// Create a result for `class_count` classes without any pixels
	fn empty(class_count: u8, warnings: Vec<ClusterWarning>) -> Self {
		let k = usize::from(class_count);
		Self {
			labels: Vec::new(),
			centroids: vec![BLACK; k],
			counts: vec![0; k],
			warnings,
		}
	}
}

/// Log a warning and record it for the caller
fn report(warnings: &mut Vec<ClusterWarning>, warning: ClusterWarning) {
	tracing::warn!("{warning}");
	warnings.push(warning);
}

/// Data for each center/centroid
struct CenterData {
	/// The centroid point
	centroid: Vec<Srgb<u8>>,
	/// Channel sum for all pixels in this center
	sum: Vec<ChannelSum>,
	/// Number of pixels in this center
	count: Vec<usize>,
}

impl CenterData {
	/// Create a [`CenterData`] starting at the given centroids
	fn new(centroid: Vec<Srgb<u8>>) -> Self {
		let k = centroid.len();
		Self {
			centroid,
			sum: vec![[0; 3]; k],
			count: vec![0; k],
		}
	}
}

/// Choose the starting centroids as the mean color of each class's labeled points
///
/// Classes without any labeled point start at black.
fn seed_centroids(points: &[LabeledPoint], class_count: u8, warnings: &mut Vec<ClusterWarning>) -> Vec<Srgb<u8>> {
	let k = usize::from(class_count);
	let mut sums = vec![[0; 3]; k];
	let mut counts = vec![0; k];

	for (i, point) in points.iter().enumerate() {
		if point.class >= class_count {
			report(
				warnings,
				ClusterWarning::InvalidClassIndex { point: i, class: point.class, class_count },
			);
			continue;
		}

		let class = usize::from(point.class);
		add_color(&mut sums[class], point.color);
		counts[class] += 1;
	}

	if counts.iter().all(|&n| n == 0) {
		report(warnings, ClusterWarning::NoCentroidSeed);
	}

	let centroids = sums
		.into_iter()
		.zip(&counts)
		.map(|(sum, &n)| if n == 0 { BLACK } else { mean(sum, n) })
		.collect::<Vec<_>>();

	tracing::debug!(
		seeded = counts.iter().filter(|&&n| n > 0).count(),
		classes = k,
		"seeded centroids from labeled points"
	);

	centroids
}

/// Initializes the center sums and counts based off the initial assignments
fn compute_initial_sums(pixels: &[Srgb<u8>], centers: &mut CenterData, assignment: &[u8]) {
	for (&color, &center) in pixels.iter().zip(assignment) {
		let i = usize::from(center);
		add_color(&mut centers.sum[i], color);
		centers.count[i] += 1;
	}
}

/// For each pixel, update its assigned center, returning the number of pixels that moved
#[cfg(not(feature = "threads"))]
fn update_assignments(pixels: &[Srgb<u8>], centers: &mut CenterData, assignment: &mut [u8]) -> usize {
	let mut moved = 0;
	for (&color, center) in pixels.iter().zip(assignment) {
		let min_center = nearest(color, &centers.centroid);

		// Move this pixel to its new center
		if min_center != *center {
			let ci = usize::from(*center);
			remove_color(&mut centers.sum[ci], color);
			centers.count[ci] -= 1;

			let cj = usize::from(min_center);
			add_color(&mut centers.sum[cj], color);
			centers.count[cj] += 1;

			*center = min_center;
			moved += 1;
		}
	}

	moved
}

/// For each pixel, update its assigned center, returning the number of pixels that moved
#[cfg(feature = "threads")]
fn update_assignments(pixels: &[Srgb<u8>], centers: &mut CenterData, assignment: &mut [u8]) -> usize {
	use rayon::prelude::*;

	let k = centers.centroid.len();
	let centroids = &centers.centroid;
	let deltas = assignment
		.par_iter_mut()
		.with_min_len((pixels.len() / rayon::current_num_threads()).max(1))
		.zip(pixels)
		.fold_with(
			(vec![[0_i64; 3]; k], vec![0_isize; k], 0_usize),
			|(mut sums, mut counts, mut moved), (center, &color)| {
				let min_center = nearest(color, centroids);

				// Move this pixel to its new center
				if min_center != *center {
					let rgb = [i64::from(color.red), i64::from(color.green), i64::from(color.blue)];

					let ci = usize::from(*center);
					for (sum, c) in sums[ci].iter_mut().zip(rgb) {
						*sum -= c;
					}
					counts[ci] -= 1;

					let cj = usize::from(min_center);
					for (sum, c) in sums[cj].iter_mut().zip(rgb) {
						*sum += c;
					}
					counts[cj] += 1;

					*center = min_center;
					moved += 1;
				}

				(sums, counts, moved)
			},
		)
		.collect::<Vec<_>>();

	let mut total_moved = 0;
	for (delta_sums, delta_counts, moved) in deltas {
		// Moving pixels out of a center can never remove more than was added to it,
		// so the true results are never negative.
		for (sum, delta_sum) in centers.sum.iter_mut().zip(&delta_sums) {
			for (s, &d) in sum.iter_mut().zip(delta_sum) {
				*s = s.wrapping_add_signed(d);
			}
		}
		for (count, &delta_count) in centers.count.iter_mut().zip(&delta_counts) {
			*count = count.wrapping_add_signed(delta_count);
		}
		total_moved += moved;
	}

	total_moved
}

/// For each center, update its centroid to the mean of its pixels, returning the number of empty centers
///
/// Empty centers keep their previous centroid.
fn update_centroids(centers: &mut CenterData) -> usize {
	let mut empty = 0;
	for ((centroid, &n), &sum) in centers.centroid.iter_mut().zip(&centers.count).zip(&centers.sum) {
		if n == 0 {
			empty += 1;
		} else {
			*centroid = mean(sum, n);
		}
	}

	empty
}

/// Run seeded k-means for exactly `max_iter` iterations
///
/// An empty result is returned if `class_count` = 0 or `pixels` is empty.
pub fn run(pixels: &[Srgb<u8>], points: &[LabeledPoint], class_count: u8, max_iter: u32) -> ClusterResult {
	let mut warnings = Vec::new();

	if class_count == 0 {
		report(&mut warnings, ClusterWarning::NoClasses);
		return ClusterResult::empty(0, warnings);
	}

	if pixels.is_empty() {
		report(&mut warnings, ClusterWarning::NoPixels);
		return ClusterResult::empty(class_count, warnings);
	}

	let mut centers = CenterData::new(seed_centroids(points, class_count, &mut warnings));
	let mut assignment = vec![0; pixels.len()];
	compute_initial_sums(pixels, &mut centers, &assignment);

	for iteration in 0..max_iter {
		let moved = update_assignments(pixels, &mut centers, &mut assignment);
		let empty = update_centroids(&mut centers);
		tracing::trace!(iteration, moved, empty, "k-means iteration");
	}

	if max_iter == 0 {
		// labels still need to refer to the nearest (seeded) centroid
		update_assignments(pixels, &mut centers, &mut assignment);
	}

	ClusterResult {
		labels: assignment,
		centroids: centers.centroid,
		counts: centers.count,
		warnings,
	}
}
