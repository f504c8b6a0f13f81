pub mod encoder;
pub mod payload;

pub use encoder::{CaptureError, FrameCapturer};
pub use payload::ImagePayload;
