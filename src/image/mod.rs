//! Thumbnail/screenshot hand-off to the host's image pipeline.
//!
//! Resampling is the host's job. The selector only passes the raw capture along
//! and stores the resulting image handles as `Object` slots.

use crate::slot::SharedObject;

/// Raw RGBA8 capture, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawBitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        RawBitmap {
            width,
            height,
            pixels,
        }
    }

    /// Whether `pixels` holds exactly `width * height` RGBA pixels.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.pixels.len() as u64 == self.width as u64 * self.height as u64 * 4
    }
}

/// Images produced from one capture.
#[derive(Debug, Clone)]
pub struct PresetImages {
    pub thumbnail: SharedObject,
    pub screenshot: SharedObject,
}

/// Host image pipeline: small thumbnail plus larger preview from a capture.
pub trait ImagePipeline {
    /// `None` when the capture cannot be converted.
    fn render(&self, bitmap: &RawBitmap) -> Option<PresetImages>;
}
