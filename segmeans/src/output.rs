//! Rendering and reporting of clustering labels

use crate::annotation::ClassList;
use palette::Srgb;

/// Error cases for rendering labels
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
	/// There is not exactly one label per pixel
	#[error("got {labels} labels for {pixels} pixels")]
	LengthMismatch {
		/// The number of labels
		labels: usize,
		/// The number of pixels
		pixels: usize,
	},
}

/// Recolor each pixel with the color of the class it was labeled with
///
/// Pixels whose label has no class in `classes` are left untouched.
///
/// # Errors
/// Returns an error if `labels` and `pixels` differ in length, in which case no pixel is changed.
pub fn recolor(pixels: &mut [Srgb<u8>], labels: &[u8], classes: &ClassList) -> Result<(), OutputError> {
	if pixels.len() != labels.len() {
		return Err(OutputError::LengthMismatch { labels: labels.len(), pixels: pixels.len() });
	}

	for (pixel, &label) in pixels.iter_mut().zip(labels) {
		if let Some(class) = classes.get(label) {
			*pixel = class.color;
		}
	}

	Ok(())
}

/// The share of the image covered by a class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassArea {
	/// Name of the class
	pub name: String,
	/// Display color of the class
	pub color: Srgb<u8>,
	/// Number of pixels labeled with this class
	pub count: usize,
	/// Percentage of all pixels labeled with this class
	pub percent: f64,
}

impl ClassArea {
	/// The percentage with two decimal places, e.g. `"12.50"`
	#[must_use]
	pub fn percent_display(&self) -> String {
		format!("{:.2}", self.percent)
	}
}

/// Compute the area of each class in `classes`, in class index order
///
/// Percentages are relative to the total number of labels.
/// If there are no labels, every percentage is `0.0`.
#[must_use]
pub fn class_areas(labels: &[u8], classes: &ClassList) -> Vec<ClassArea> {
	let mut counts = vec![0_usize; usize::from(classes.len())];
	for &label in labels {
		if let Some(count) = counts.get_mut(usize::from(label)) {
			*count += 1;
		}
	}

	// (usize as f64) is only inexact for more pixels than any image can hold
	#[allow(clippy::cast_precision_loss)]
	let total = labels.len() as f64;

	classes
		.iter()
		.zip(counts)
		.map(|(class, count)| {
			#[allow(clippy::cast_precision_loss)]
			let percent = if labels.is_empty() { 0.0 } else { 100.0 * count as f64 / total };

			ClassArea {
				name: class.name.clone(),
				color: class.color,
				count,
				percent,
			}
		})
		.collect()
}
