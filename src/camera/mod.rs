pub mod backend;
#[cfg(test)]
pub(crate) mod fake;
pub mod manager;
pub mod still;
pub mod types;

pub use backend::{CameraBackend, VideoStream};
pub use manager::DeviceAccessManager;
pub use still::{PermissionPolicy, StillImageBackend};
pub use types::{
    AcquireOutcome, DeviceError, FacingMode, RawFrame, StreamInfo, StreamRequest, VideoDevice,
};
