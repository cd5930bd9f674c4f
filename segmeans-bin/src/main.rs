//! Label regions of an image with class colors and segment the whole image by seeded k-means clustering.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
	clippy::pedantic,
	clippy::cargo,
	clippy::use_debug,
	clippy::dbg_macro,
	clippy::todo,
	clippy::unimplemented,
	clippy::unwrap_used,
	clippy::unwrap_in_result,
	clippy::unneeded_field_pattern,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::unnecessary_self_imports,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::string_slice,
	missing_docs,
	clippy::missing_docs_in_private_items,
	rustdoc::all,
	clippy::float_cmp_const,
	clippy::lossy_float_literal
)]
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{
	fmt::{self, Display},
	path::Path,
	process::ExitCode,
	time::Instant,
};

use clap::Parser;
use colored::Colorize;
use image::{DynamicImage, RgbImage};
use palette::Srgb;
use segmeans::{
	annotation::{AnnotationError, Annotations, ClassList},
	output::{self, ClassArea, OutputError},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Record the running time of a function and log the elapsed time
macro_rules! time {
	($name: literal, $func_call: expr) => {{
		let start = Instant::now();
		let result = $func_call;
		tracing::info!("{} took {}ms", $name, start.elapsed().as_millis());
		result
	}};
}

/// Error cases for the whole labeling and segmentation run
#[derive(Debug)]
enum AppError {
	/// Failed to read or decode the image file
	ImageLoad(image::ImageError),
	/// Failed to encode or write the recolored image
	ImageSave(image::ImageError),
	/// No classes were given
	NoClasses,
	/// A label referenced a class name that was not given
	UnknownClass(String),
	/// A class or label was invalid
	Annotation(AnnotationError),
	/// The labels could not be rendered
	Output(OutputError),
	/// Failed to build the thread pool
	#[cfg(feature = "threads")]
	ThreadPool(rayon::ThreadPoolBuildError),
}

impl Display for AppError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			AppError::ImageLoad(e) => write!(f, "Failed to load the image file: {e}"),
			AppError::ImageSave(e) => write!(f, "Failed to save the recolored image: {e}"),
			AppError::NoClasses => write!(f, "At least one class must be given with --class"),
			AppError::UnknownClass(name) => write!(f, "No class is named '{name}'"),
			AppError::Annotation(e) => write!(f, "Invalid annotation: {e}"),
			AppError::Output(e) => write!(f, "Failed to render the labels: {e}"),
			#[cfg(feature = "threads")]
			AppError::ThreadPool(e) => write!(f, "Failed to start the thread pool: {e}"),
		}
	}
}

impl From<AnnotationError> for AppError {
	fn from(e: AnnotationError) -> Self {
		AppError::Annotation(e)
	}
}

impl From<OutputError> for AppError {
	fn from(e: OutputError) -> Self {
		AppError::Output(e)
	}
}

fn main() -> ExitCode {
	let options = Options::parse();

	init_tracing(options.verbose);

	let result = run_segment_and_report(&options);

	// Returning Result<_> uses Debug printing instead of Display
	if let Err(e) = result {
		eprintln!("{e}");
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	}
}

/// Install the global tracing subscriber, honoring `RUST_LOG` if it is set
fn init_tracing(verbose: bool) {
	let default_filter = if verbose { "segmeans=info" } else { "segmeans=warn" };
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
		)
		.with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
		.init();
}

/// Builds a thread pool and then runs `segment_and_report`
#[cfg(feature = "threads")]
fn run_segment_and_report(options: &Options) -> Result<(), AppError> {
	let pool = rayon::ThreadPoolBuilder::new()
		.num_threads(usize::from(options.threads))
		.build()
		.map_err(AppError::ThreadPool)?;

	pool.install(|| segment_and_report(options))
}

/// Runs `segment_and_report` on a single thread
#[cfg(not(feature = "threads"))]
fn run_segment_and_report(options: &Options) -> Result<(), AppError> {
	segment_and_report(options)
}

/// Load an image, label and segment it, then print and optionally save the result
fn segment_and_report(options: &Options) -> Result<(), AppError> {
	// Input
	let classes = class_list(&options.classes)?;
	let mut image = time!("Image loading", load_image(&options.image))?.into_rgb8();
	let annotations = annotate(&image, &classes, &options.labels)?;

	// Processing
	let result = time!(
		"Clustering",
		segmeans::cluster(
			segmeans::srgb_pixels(&image),
			annotations.points(),
			classes.len(),
			options.max_iter,
		)
	);

	for (class, centroid) in classes.iter().zip(&result.centroids) {
		tracing::info!(class = %class.name, centroid = %format!("#{centroid:X}"), "final centroid");
	}

	// Output
	let mut areas = output::class_areas(&result.labels, &classes);
	sort_areas(&mut areas, options.sort, options.reverse);
	print_areas(&areas, options.colorize);

	if let Some(path) = &options.output {
		output::recolor(segmeans::srgb_pixels_mut(&mut image), &result.labels, &classes)?;
		time!("Image saving", image.save(path)).map_err(AppError::ImageSave)?;
	}

	Ok(())
}

/// Load the image at the given path
fn load_image(path: &Path) -> Result<DynamicImage, AppError> {
	image::open(path).map_err(AppError::ImageLoad)
}

/// Build the class list in the order the classes were given
fn class_list(classes: &[ClassArg]) -> Result<ClassList, AppError> {
	if classes.is_empty() {
		return Err(AppError::NoClasses);
	}

	let mut list = ClassList::new();
	for class in classes {
		list.push(class.name.as_str(), class.color)?;
	}

	Ok(list)
}

/// Find the index of the class a label refers to
fn resolve_class(classes: &ClassList, class: &ClassRef) -> Result<u8, AppError> {
	match class {
		ClassRef::Index(index) => Ok(*index),
		ClassRef::Name(name) => classes.position(name).ok_or_else(|| AppError::UnknownClass(name.clone())),
	}
}

/// Collect the labeled points of every label in the order they were given
fn annotate(image: &RgbImage, classes: &ClassList, labels: &[LabelArg]) -> Result<Annotations, AppError> {
	let mut annotations = Annotations::new();
	for label in labels {
		let class = resolve_class(classes, &label.class)?;
		annotations.label(image, classes, class, label.region)?;
	}

	if annotations.is_empty() {
		tracing::warn!("No regions were labeled, every class starts at black");
	}

	Ok(annotations)
}

/// Sort the class areas by the given order
fn sort_areas(areas: &mut [ClassArea], sort: SortOutput, reverse: bool) {
	match sort {
		SortOutput::Index => {},
		// stable sort, so ties stay in class index order
		SortOutput::Area => areas.sort_by_key(|area| std::cmp::Reverse(area.count)),
	}

	if reverse {
		areas.reverse();
	}
}

/// Format a class color as a hex code, colorized as requested
fn format_color(color: Srgb<u8>, colorize: Option<ColorizeOutput>) -> String {
	let hex = format!("#{color:X}");
	match colorize {
		Some(ColorizeOutput::Fg) => hex.truecolor(color.red, color.green, color.blue).to_string(),
		Some(ColorizeOutput::Bg) => hex.on_truecolor(color.red, color.green, color.blue).to_string(),
		None => hex,
	}
}

/// Print one line per class with its name, color, and percentage of the image
fn print_areas(areas: &[ClassArea], colorize: Option<ColorizeOutput>) {
	// use char count as supplement for grapheme count
	let name_width = areas.iter().map(|area| area.name.chars().count()).max().unwrap_or(0);

	for area in areas {
		println!(
			"{:name_width$} {} {:>6}%",
			area.name,
			format_color(area.color, colorize),
			area.percent_display(),
		);
	}
}
