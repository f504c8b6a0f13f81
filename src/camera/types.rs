use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::VideoStream;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    /// Rear camera, pointed away from the user.
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

/// A video input reported by the capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    pub id: String,
    pub label: String,
    /// `None` when the platform does not say which way the lens points.
    pub facing: Option<FacingMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub device_id: String,
    pub facing: FacingMode,
}

/// Result of asking the platform for a stream.
pub enum AcquireOutcome {
    Granted(Box<dyn VideoStream>),
    /// User or OS refused camera access.
    Denied,
    /// The requested device is gone.
    Absent,
    Failed(String),
}

impl std::fmt::Debug for AcquireOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquireOutcome::Granted(_) => f.write_str("Granted"),
            AcquireOutcome::Denied => f.write_str("Denied"),
            AcquireOutcome::Absent => f.write_str("Absent"),
            AcquireOutcome::Failed(msg) => f.debug_tuple("Failed").field(msg).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum DeviceError {
    #[error("no camera found on this device")]
    NoDevice,
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera error: {0}")]
    Device(String),
}

/// Metadata of the stream currently held by the device manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub id: Uuid,
    pub device_id: String,
    pub label: String,
    pub facing: Option<FacingMode>,
}

/// One decoded video frame, RGBA8, row-major.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}
