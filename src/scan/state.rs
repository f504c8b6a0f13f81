use chrono::{DateTime, Utc};
use serde::Serialize;

use super::BrowserKind;
use crate::camera::{DeviceError, StreamInfo};
use crate::nutrition::{EstimateSource, NutritionEstimate};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ScanPhase {
    #[default]
    Idle,
    Requesting,
    Live,
    Analyzing,
    Result,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub estimate: NutritionEstimate,
    pub source: EstimateSource,
    pub finished_at: DateTime<Utc>,
}

/// Observable state of one scan session. Only the controller mutates it.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    pub phase: ScanPhase,
    pub camera_available: bool,
    pub permission_denied: bool,
    pub stream: Option<StreamInfo>,
    pub result: Option<ScanResult>,
    pub error: Option<DeviceError>,
    /// Last analysis failed because the service is not configured.
    pub config_error: bool,
    /// Set while the permission instructions should be on screen.
    pub permission_guide: Option<BrowserKind>,
}

impl ScanState {
    pub fn new(camera_available: bool) -> Self {
        Self {
            camera_available,
            ..Self::default()
        }
    }

    pub fn begin_request(&mut self) {
        self.phase = ScanPhase::Requesting;
        self.stream = None;
        self.result = None;
        self.error = None;
        self.config_error = false;
        self.permission_guide = None;
    }

    pub fn go_live(&mut self, stream: StreamInfo) {
        self.phase = ScanPhase::Live;
        self.stream = Some(stream);
        self.camera_available = true;
        self.permission_denied = false;
    }

    pub fn fail(&mut self, error: DeviceError, guide: Option<BrowserKind>) {
        self.phase = ScanPhase::Error;
        self.stream = None;
        self.error = Some(error);
        self.permission_guide = guide;
    }

    pub fn begin_analysis(&mut self) {
        self.phase = ScanPhase::Analyzing;
        self.stream = None;
    }

    pub fn finish(&mut self, estimate: NutritionEstimate, source: EstimateSource) {
        self.phase = ScanPhase::Result;
        self.result = Some(ScanResult {
            estimate,
            source,
            finished_at: Utc::now(),
        });
    }

    pub fn return_to_idle(&mut self) {
        self.phase = ScanPhase::Idle;
        self.stream = None;
        self.error = None;
        self.permission_guide = None;
    }
}
