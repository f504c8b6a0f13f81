use image::{codecs::jpeg::JpegEncoder, ExtendedColorType, RgbImage, RgbaImage};
use thiserror::Error;

use super::ImagePayload;
use crate::camera::VideoStream;

pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("stream has not produced a frame yet")]
    NotReady,
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("jpeg encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Turns the current frame of a live stream into a JPEG payload.
#[derive(Debug, Clone, Copy)]
pub struct FrameCapturer {
    quality: u8,
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameCapturer {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn capture(&self, stream: &dyn VideoStream) -> Result<ImagePayload, CaptureError> {
        let frame = stream.latest_frame().ok_or(CaptureError::NotReady)?;

        if frame.width == 0 || frame.height == 0 {
            return Err(CaptureError::InvalidFrame(format!(
                "{}x{} has no pixels",
                frame.width, frame.height
            )));
        }

        let (width, height) = (frame.width, frame.height);
        let expected = u64::from(width) * u64::from(height) * 4;
        if frame.rgba.len() as u64 != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "{} bytes do not match {width}x{height} RGBA ({expected} bytes)",
                frame.rgba.len()
            )));
        }
        let rgba = RgbaImage::from_raw(width, height, frame.rgba).ok_or_else(|| {
            CaptureError::InvalidFrame(format!("buffer does not match {width}x{height} RGBA"))
        })?;

        // JPEG has no alpha channel; draw onto an opaque raster of the same size.
        let mut raster = RgbImage::new(width, height);
        for (dst, src) in raster.pixels_mut().zip(rgba.pixels()) {
            dst.0 = [src.0[0], src.0[1], src.0[2]];
        }

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode(
            raster.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        )?;

        Ok(ImagePayload::new(
            bytes,
            JPEG_MEDIA_TYPE,
            width,
            height,
            frame.captured_at,
        ))
    }
}
