use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::bbox::BoundingBox;

/// One image of a IIIF manifest: `canvas_idx`-th canvas, `img_idx`-th image on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub manifest_url: String,
    pub canvas_idx: u32,
    pub img_idx: u32,
}

impl ImageRef {
    pub fn new(manifest_url: impl Into<String>, canvas_idx: u32, img_idx: u32) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            canvas_idx,
            img_idx,
        }
    }
}

/// Declared pixel size and IIIF Image API root of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Image API base, without the `/full/...` suffix.
    pub root_url: String,
    pub width: i64,
    pub height: i64,
}

/// Image-info collaborator. Fetching `info.json` happens outside the core.
pub trait ImageService {
    fn image_info(&self, image: &ImageRef) -> Option<ImageInfo>;
}

impl ImageService for BTreeMap<ImageRef, ImageInfo> {
    fn image_info(&self, image: &ImageRef) -> Option<ImageInfo> {
        self.get(image).cloned()
    }
}

/// IIIF Image API URL of the region covered by `bbox`.
pub fn fragment_url(root_url: &str, bbox: &BoundingBox) -> String {
    format!(
        "{}/{},{},{},{}/full/0/default.jpg",
        root_url.trim_end_matches('/'),
        bbox.x,
        bbox.y,
        bbox.width,
        bbox.height
    )
}
