use anyhow::Result;
use async_trait::async_trait;

use super::types::{AcquireOutcome, RawFrame, StreamRequest, VideoDevice};

/// Platform camera access.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Lists video inputs without prompting for permission.
    async fn enumerate_video_inputs(&self) -> Result<Vec<VideoDevice>>;

    /// Opens a stream on the requested device. May prompt the user.
    async fn open_stream(&self, request: &StreamRequest) -> AcquireOutcome;
}

/// A live, frame-producing capture source.
pub trait VideoStream: Send + Sync {
    /// Most recent frame, or `None` before the first frame has painted or
    /// after the stream was stopped.
    fn latest_frame(&self) -> Option<RawFrame>;

    /// Number of tracks still running.
    fn live_tracks(&self) -> usize;

    /// Stops every track. Calling it on a stopped stream does nothing.
    fn stop(&mut self);
}
