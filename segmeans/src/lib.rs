//! Segment an image by k-means clustering its pixels toward colors seeded from user-labeled points.
//!
//! # Examples
//!
//! ## Label two regions of an image and segment the rest.
//!
//! ```no_run
//! use segmeans::annotation::{Annotations, ClassList, Region};
//! use palette::Srgb;
//!
//! let image = image::open("some image").unwrap().into_rgb8();
//!
//! let mut classes = ClassList::new();
//! let sky = classes.push("sky", Srgb::new(80, 150, 255)).unwrap();
//! let grass = classes.push("grass", Srgb::new(40, 200, 60)).unwrap();
//!
//! let mut annotations = Annotations::new();
//! annotations.label(&image, &classes, sky, Region::Rect { x0: 0, y0: 0, x1: 31, y1: 7 }).unwrap();
//! annotations.label(&image, &classes, grass, Region::Point { x: 10, y: 60 }).unwrap();
//!
//! let result = segmeans::cluster(
//!     segmeans::srgb_pixels(&image),
//!     annotations.points(),
//!     classes.len(),
//!     segmeans::DEFAULT_MAX_ITER,
//! );
//! ```
//!
//! ## Recolor the image and report the area of each class.
//!
//! ```no_run
//! # use segmeans::annotation::{Annotations, ClassList};
//! # let mut image = image::open("some image").unwrap().into_rgb8();
//! # let classes = ClassList::new();
//! # let annotations = Annotations::new();
//! let result = segmeans::cluster(segmeans::srgb_pixels(&image), annotations.points(), classes.len(), 10);
//!
//! for area in segmeans::output::class_areas(&result.labels, &classes) {
//!     println!("{}: {}%", area.name, area.percent_display());
//! }
//!
//! segmeans::output::recolor(segmeans::srgb_pixels_mut(&mut image), &result.labels, &classes).unwrap();
//! ```
//!
//! # Algorithm
//!
//! Each class starts at the mean color of its labeled points.
//! A class without any labeled point starts at black `(0, 0, 0)`.
//! Then, for exactly `max_iter` iterations,
//! every pixel is assigned to the class with the nearest centroid (squared Euclidean distance in RGB)
//! and every centroid is moved to the mean of the pixels assigned to it.
//! A class that receives no pixels in an iteration keeps its previous centroid.
//!
//! There is no randomness and no convergence check, so the same input always gives the same output.
//! When a pixel is equally close to several centroids, the class with the lowest index wins.
//!
//! ## Rounding
//!
//! Centroids are [`Srgb<u8>`] colors. Every mean, both when seeding and after each iteration,
//! is computed exactly from integer sums and then rounded half away from zero.
//! For example, the mean of `(0, 0, 0)` and `(1, 1, 1)` is `(1, 1, 1)`.
//!
//! ## Degenerate input
//!
//! Clustering never fails. Instead, the conditions below are reported through
//! [`ClusterResult::warnings`] and logged as `tracing` warnings:
//! - `class_count` = 0 gives no labels and no centroids.
//! - An empty slice of pixels gives no labels and `class_count` black centroids.
//! - Labeled points with a class index `>= class_count` are skipped.
//! - If no class has any labeled point, clustering still runs from all-black centroids,
//!   which tends to put most pixels into the first class.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]

use image::RgbImage;
use palette::Srgb;

pub mod annotation;
mod kmeans;
pub mod output;

pub use kmeans::{ClusterResult, ClusterWarning};

/// The number of iterations used when the caller has no preference
pub const DEFAULT_MAX_ITER: u32 = 10;

/// A pixel color explicitly tagged by the user with a class index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledPoint {
	/// The color of the labeled pixel
	pub color: Srgb<u8>,
	/// The index of the class this pixel belongs to
	pub class: u8,
}

impl LabeledPoint {
	/// Create a new [`LabeledPoint`]
	#[must_use]
	pub const fn new(color: Srgb<u8>, class: u8) -> Self {
		Self { color, class }
	}
}

/// Clusters `pixels` into `class_count` classes, seeding each class from its labeled points.
///
/// Runs exactly `max_iter` assignment and update steps.
/// See the crate documentation for the details of the algorithm.
#[must_use]
pub fn cluster(pixels: &[Srgb<u8>], points: &[LabeledPoint], class_count: u8, max_iter: u32) -> ClusterResult {
	kmeans::run(pixels, points, class_count, max_iter)
}

/// Views the pixels of an image as a row-major slice of Srgb colors
#[must_use]
pub fn srgb_pixels(image: &RgbImage) -> &[Srgb<u8>] {
	palette::cast::from_component_slice(image.as_raw())
}

/// Views the pixels of an image as a mutable row-major slice of Srgb colors
pub fn srgb_pixels_mut(image: &mut RgbImage) -> &mut [Srgb<u8>] {
	palette::cast::from_component_slice_mut(&mut **image)
}
