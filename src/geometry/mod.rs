//! Zone geometry: bounding boxes of annotation zones and the image fragments they cut out.

pub mod bbox;
pub mod image;

pub use bbox::{bounding_box, parse_coords, validate_coords, BoundingBox};
pub use image::{fragment_url, ImageInfo, ImageRef, ImageService};
