//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use palette::Srgb;
use segmeans::annotation::Region;
use std::path::PathBuf;

/// Sort orders for the printed class areas
#[derive(Copy, Clone, ValueEnum)]
pub enum SortOutput {
	/// Ascending class index, i.e. the order the classes were given in
	Index,
	/// Descending number of pixels
	Area,
}

/// Ways to colorize the output text
#[derive(Copy, Clone, ValueEnum)]
pub enum ColorizeOutput {
	/// Foreground
	Fg,
	/// Background
	Bg,
}

/// A class definition given on the command line
#[derive(Clone, Debug, PartialEq)]
pub struct ClassArg {
	/// Display name of the class
	pub name: String,
	/// Color used to render the class
	pub color: Srgb<u8>,
}

/// A reference to a class, either by index or by name
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassRef {
	/// Index in the order the classes were given
	Index(u8),
	/// Name of the class
	Name(String),
}

/// A labeled region given on the command line
#[derive(Clone, Debug, PartialEq)]
pub struct LabelArg {
	/// The class to label the region with
	pub class: ClassRef,
	/// The labeled pixels
	pub region: Region,
}

/// Label regions of an image with classes, then segment the whole image by k-means clustering
/// pixels toward the colors of the labeled regions.
///
/// Prints the percentage of the image covered by each class.
#[derive(Parser)]
#[command(version)]
pub struct Options {
	/// The path to the input image
	pub image: PathBuf,

	/// A class, given as NAME=COLOR where COLOR is a hex code like #ff8800
	///
	/// Classes are numbered from 0 in the order they are given.
	#[arg(short, long = "class", value_name = "NAME=COLOR", value_parser = parse_class)]
	pub classes: Vec<ClassArg>,

	/// A labeled point CLASS:X,Y or rectangle CLASS:X0,Y0,X1,Y1
	///
	/// CLASS is a class index or name. Rectangles include both corners.
	/// Each labeled pixel's color pulls its class's starting color toward it.
	#[arg(short, long = "label", value_name = "CLASS:COORDS", value_parser = parse_label)]
	pub labels: Vec<LabelArg>,

	/// The number of k-means iterations to run
	#[arg(short = 'i', long, default_value_t = segmeans::DEFAULT_MAX_ITER)]
	pub max_iter: u32,

	/// Save the image recolored with the class colors to this path
	#[arg(short, long)]
	pub output: Option<PathBuf>,

	/// The order to print the class areas in
	#[arg(short, long, default_value = "index")]
	pub sort: SortOutput,

	/// Reverse the printed order of the class areas
	#[arg(short, long)]
	pub reverse: bool,

	/// Color the foreground or background of each printed class color
	#[arg(long)]
	pub colorize: Option<ColorizeOutput>,

	/// The number of threads to use, 0 picks one per core
	#[cfg(feature = "threads")]
	#[arg(short, long, default_value_t = 0)]
	pub threads: u8,

	/// Print additional information, such as the time taken by each step
	#[arg(long)]
	pub verbose: bool,
}

/// Parse a class definition in the form `NAME=COLOR`
fn parse_class(s: &str) -> Result<ClassArg, String> {
	let (name, color) = s
		.rsplit_once('=')
		.ok_or_else(|| format!("expected NAME=COLOR, got '{s}'"))?;

	if name.trim().is_empty() {
		return Err("class name cannot be empty".into());
	}

	let color = color
		.trim()
		.parse::<Srgb<u8>>()
		.map_err(|e| format!("invalid color '{color}': {e}"))?;

	Ok(ClassArg { name: name.to_owned(), color })
}

/// Parse a pixel coordinate
fn parse_coordinate(s: &str) -> Result<u32, String> {
	s.trim().parse().map_err(|e| format!("invalid coordinate '{s}': {e}"))
}

/// Parse a labeled region in the form `CLASS:X,Y` or `CLASS:X0,Y0,X1,Y1`
fn parse_label(s: &str) -> Result<LabelArg, String> {
	let (class, coords) = s
		.rsplit_once(':')
		.ok_or_else(|| format!("expected CLASS:X,Y or CLASS:X0,Y0,X1,Y1, got '{s}'"))?;

	let class = match class.parse() {
		Ok(index) => ClassRef::Index(index),
		Err(_) if class.trim().is_empty() => return Err("class cannot be empty".into()),
		Err(_) => ClassRef::Name(class.to_owned()),
	};

	let coords = coords.split(',').map(parse_coordinate).collect::<Result<Vec<_>, _>>()?;
	let region = match coords[..] {
		[x, y] => Region::Point { x, y },
		[x0, y0, x1, y1] => Region::Rect { x0, y0, x1, y1 },
		_ => return Err(format!("expected 2 or 4 coordinates, got {}", coords.len())),
	};

	Ok(LabelArg { class, region })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;

	#[test]
	fn class_with_hex_color() {
		assert_eq!(
			parse_class("water=#0080ff").unwrap(),
			ClassArg { name: "water".to_owned(), color: Srgb::new(0, 128, 255) }
		);
		assert_eq!(parse_class("sand=fc0").unwrap().color, Srgb::new(255, 204, 0));
	}

	#[test]
	fn class_name_may_contain_equals() {
		assert_eq!(parse_class("a=b=#000000").unwrap().name, "a=b");
	}

	#[test]
	fn invalid_classes_are_rejected() {
		assert!(parse_class("water").is_err());
		assert!(parse_class("=#000000").is_err());
		assert!(parse_class("water=#00zz00").is_err());
		assert!(parse_class("water=#00000").is_err());
	}

	#[test]
	fn label_point_by_index() {
		assert_eq!(
			parse_label("1:10,20").unwrap(),
			LabelArg { class: ClassRef::Index(1), region: Region::Point { x: 10, y: 20 } }
		);
	}

	#[test]
	fn label_rect_by_name() {
		assert_eq!(
			parse_label("deep water:0, 5, 30,40").unwrap(),
			LabelArg {
				class: ClassRef::Name("deep water".to_owned()),
				region: Region::Rect { x0: 0, y0: 5, x1: 30, y1: 40 },
			}
		);
	}

	#[test]
	fn invalid_labels_are_rejected() {
		assert!(parse_label("10,20").is_err());
		assert!(parse_label(":10,20").is_err());
		assert!(parse_label("0:10").is_err());
		assert!(parse_label("0:1,2,3").is_err());
		assert!(parse_label("0:-1,2").is_err());
		assert!(parse_label("0:a,b").is_err());
	}
}
