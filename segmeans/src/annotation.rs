//! Classes and labeled regions supplied by the user before clustering
//!
//! A [`ClassList`] holds the user-defined classes in insertion order,
//! so the index returned by [`ClassList::push`] is the class index used by
//! [`LabeledPoint`]s and by the labels of a [`ClusterResult`](crate::ClusterResult).
//!
//! [`Annotations`] collects labeled points one gesture at a time.
//! Each call to [`Annotations::label`] either adds every pixel of its region or, on error, nothing.

use crate::LabeledPoint;
use image::RgbImage;
use palette::Srgb;

/// Error cases for defining classes and labeling regions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
	/// A class was given an empty name
	#[error("class name cannot be empty")]
	EmptyName,
	/// The class list already holds the maximum number of classes
	#[error("cannot define more than {} classes", u8::MAX)]
	TooManyClasses,
	/// A region was labeled with a class that is not in the class list
	#[error("class index {class} does not exist, there are {len} classes")]
	UnknownClass {
		/// The requested class index
		class: u8,
		/// The number of classes in the list
		len: u8,
	},
	/// A region reaches outside of the image
	#[error("pixel ({x}, {y}) is outside of the {width}x{height} image")]
	OutOfBounds {
		/// Column of the offending corner
		x: u32,
		/// Row of the offending corner
		y: u32,
		/// Width of the image
		width: u32,
		/// Height of the image
		height: u32,
	},
}

/// A user-defined category with a display color
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
	/// Display name
	pub name: String,
	/// Color used when rendering pixels of this class
	pub color: Srgb<u8>,
}

/// Ordered list of classes, indexed in insertion order
#[derive(Debug, Clone, Default)]
pub struct ClassList {
	/// Classes in insertion order
	classes: Vec<Class>,
}

impl ClassList {
	/// Create an empty [`ClassList`]
	#[must_use]
	pub const fn new() -> Self {
		Self { classes: Vec::new() }
	}

	/// Add a class, returning its index
	///
	/// # Errors
	/// Returns an error if `name` is blank or the list already has `u8::MAX` classes.
	pub fn push(&mut self, name: impl Into<String>, color: Srgb<u8>) -> Result<u8, AnnotationError> {
		let name = name.into();
		if name.trim().is_empty() {
			return Err(AnnotationError::EmptyName);
		}

		let index = self.len();
		if index == u8::MAX {
			return Err(AnnotationError::TooManyClasses);
		}

		self.classes.push(Class { name, color });
		Ok(index)
	}

	/// The number of classes
	// push keeps the length <= u8::MAX
	#[allow(clippy::cast_possible_truncation)]
	#[must_use]
	pub fn len(&self) -> u8 {
		self.classes.len() as u8
	}

	/// Whether there are no classes
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.classes.is_empty()
	}

	/// The class with the given index
	#[must_use]
	pub fn get(&self, index: u8) -> Option<&Class> {
		self.classes.get(usize::from(index))
	}

	/// The index of the first class with the given name
	#[must_use]
	pub fn position(&self, name: &str) -> Option<u8> {
		self.classes
			.iter()
			.position(|class| class.name == name)
			.and_then(|i| u8::try_from(i).ok())
	}

	/// Iterate over the classes in index order
	pub fn iter(&self) -> std::slice::Iter<'_, Class> {
		self.classes.iter()
	}
}

impl<'a> IntoIterator for &'a ClassList {
	type Item = &'a Class;
	type IntoIter = std::slice::Iter<'a, Class>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// A region of the image selected by a single user gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
	/// A single clicked pixel
	Point {
		/// Column
		x: u32,
		/// Row
		y: u32,
	},
	/// A dragged rectangle, inclusive of both corners which may be given in any order
	Rect {
		/// Column of the first corner
		x0: u32,
		/// Row of the first corner
		y0: u32,
		/// Column of the opposite corner
		x1: u32,
		/// Row of the opposite corner
		y1: u32,
	},
}

impl Region {
	/// Inclusive `(min_x, min_y, max_x, max_y)` bounds
	const fn bounds(self) -> (u32, u32, u32, u32) {
		match self {
			Region::Point { x, y } => (x, y, x, y),
			Region::Rect { x0, y0, x1, y1 } => {
				let (min_x, max_x) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
				let (min_y, max_y) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
				(min_x, min_y, max_x, max_y)
			},
		}
	}

	/// The number of pixels covered by this region
	#[must_use]
	pub fn area(self) -> u64 {
		let (min_x, min_y, max_x, max_y) = self.bounds();
		(u64::from(max_x - min_x) + 1) * (u64::from(max_y - min_y) + 1)
	}
}

/// Labeled points accumulated over multiple gestures
#[derive(Debug, Clone, Default)]
pub struct Annotations {
	/// Committed labeled points in gesture order
	points: Vec<LabeledPoint>,
}

impl Annotations {
	/// Create an empty [`Annotations`]
	#[must_use]
	pub const fn new() -> Self {
		Self { points: Vec::new() }
	}

	/// Label every pixel of `region` in `image` with `class`, returning the number of added points
	///
	/// Points are added in row-major order.
	/// The whole region is validated before anything is added.
	///
	/// # Errors
	/// Returns an error if `class` is not in `classes` or `region` reaches outside of `image`.
	pub fn label(
		&mut self,
		image: &RgbImage,
		classes: &ClassList,
		class: u8,
		region: Region,
	) -> Result<usize, AnnotationError> {
		let batch = labeled_points(image, classes, class, region)?;
		let added = batch.len();
		self.points.extend(batch);

		tracing::debug!(class, added, total = self.points.len(), "labeled region");

		Ok(added)
	}

	/// The committed labeled points
	#[must_use]
	pub fn points(&self) -> &[LabeledPoint] {
		&self.points
	}

	/// The number of committed labeled points
	#[must_use]
	pub fn len(&self) -> usize {
		self.points.len()
	}

	/// Whether no points have been committed
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}
}

/// Collect the labeled points for a single gesture
fn labeled_points(
	image: &RgbImage,
	classes: &ClassList,
	class: u8,
	region: Region,
) -> Result<Vec<LabeledPoint>, AnnotationError> {
	if classes.get(class).is_none() {
		return Err(AnnotationError::UnknownClass { class, len: classes.len() });
	}

	let (width, height) = image.dimensions();
	let (min_x, min_y, max_x, max_y) = region.bounds();
	if max_x >= width || max_y >= height {
		return Err(AnnotationError::OutOfBounds { x: max_x, y: max_y, width, height });
	}

	let points = (min_y..=max_y)
		.flat_map(|y| (min_x..=max_x).map(move |x| (x, y)))
		.map(|(x, y)| {
			let [r, g, b] = image.get_pixel(x, y).0;
			LabeledPoint::new(Srgb::new(r, g, b), class)
		})
		.collect();

	Ok(points)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[allow(clippy::cast_possible_truncation)]
	fn test_image() -> RgbImage {
		RgbImage::from_fn(4, 3, |x, y| image::Rgb([(x * 10) as u8, (y * 10) as u8, 5]))
	}

	fn two_classes() -> ClassList {
		let mut classes = ClassList::new();
		assert_eq!(classes.push("water", Srgb::new(0, 0, 255)), Ok(0));
		assert_eq!(classes.push("land", Srgb::new(0, 255, 0)), Ok(1));
		classes
	}

	#[test]
	fn class_indices_follow_insertion_order() {
		let classes = two_classes();

		assert_eq!(classes.len(), 2);
		assert_eq!(classes.get(1).map(|class| class.name.as_str()), Some("land"));
		assert_eq!(classes.position("water"), Some(0));
		assert_eq!(classes.position("sky"), None);
		assert_eq!(classes.iter().count(), 2);
	}

	#[test]
	fn blank_class_name_is_rejected() {
		let mut classes = ClassList::new();

		assert_eq!(classes.push("", Srgb::new(1, 2, 3)), Err(AnnotationError::EmptyName));
		assert_eq!(classes.push("  ", Srgb::new(1, 2, 3)), Err(AnnotationError::EmptyName));
		assert!(classes.is_empty());
	}

	#[test]
	fn class_list_is_capped() {
		let mut classes = ClassList::new();
		for i in 0..u8::MAX {
			assert_eq!(classes.push(format!("class {i}"), Srgb::new(i, i, i)), Ok(i));
		}

		assert_eq!(classes.push("one too many", Srgb::new(0, 0, 0)), Err(AnnotationError::TooManyClasses));
		assert_eq!(classes.len(), u8::MAX);
	}

	#[test]
	fn point_labels_clicked_pixel() {
		let mut annotations = Annotations::new();

		let added = annotations.label(&test_image(), &two_classes(), 1, Region::Point { x: 2, y: 1 });

		assert_eq!(added, Ok(1));
		assert_eq!(annotations.points(), &[LabeledPoint::new(Srgb::new(20, 10, 5), 1)]);
	}

	#[test]
	fn rect_labels_every_pixel_row_major() {
		let mut annotations = Annotations::new();
		let region = Region::Rect { x0: 2, y0: 2, x1: 1, y1: 1 };

		let added = annotations.label(&test_image(), &two_classes(), 0, region);

		assert_eq!(added, Ok(4));
		assert_eq!(region.area(), 4);
		assert_eq!(
			annotations.points(),
			&[
				LabeledPoint::new(Srgb::new(10, 10, 5), 0),
				LabeledPoint::new(Srgb::new(20, 10, 5), 0),
				LabeledPoint::new(Srgb::new(10, 20, 5), 0),
				LabeledPoint::new(Srgb::new(20, 20, 5), 0),
			]
		);
	}

	#[test]
	fn rejected_gesture_adds_nothing() {
		let image = test_image();
		let classes = two_classes();
		let mut annotations = Annotations::new();
		annotations
			.label(&image, &classes, 0, Region::Point { x: 0, y: 0 })
			.expect("valid point");

		let out_of_bounds = annotations.label(&image, &classes, 1, Region::Rect { x0: 0, y0: 0, x1: 4, y1: 2 });
		let unknown = annotations.label(&image, &classes, 2, Region::Point { x: 0, y: 0 });

		assert_eq!(
			out_of_bounds,
			Err(AnnotationError::OutOfBounds { x: 4, y: 2, width: 4, height: 3 })
		);
		assert_eq!(unknown, Err(AnnotationError::UnknownClass { class: 2, len: 2 }));
		assert_eq!(annotations.len(), 1);
	}

	#[test]
	fn labeled_regions_seed_clustering() {
		let mut image = RgbImage::from_pixel(6, 2, image::Rgb([10, 20, 200]));
		for y in 0..2 {
			for x in 3..6 {
				image.put_pixel(x, y, image::Rgb([30, 180, 40]));
			}
		}

		let classes = two_classes();
		let mut annotations = Annotations::new();
		annotations
			.label(&image, &classes, 0, Region::Point { x: 0, y: 0 })
			.expect("valid point");
		annotations
			.label(&image, &classes, 1, Region::Rect { x0: 4, y0: 0, x1: 5, y1: 1 })
			.expect("valid rect");

		let result = crate::cluster(crate::srgb_pixels(&image), annotations.points(), classes.len(), 3);

		assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1]);
		assert_eq!(result.centroids, vec![Srgb::new(10, 20, 200), Srgb::new(30, 180, 40)]);
	}
}
