//! Scriptable camera for unit tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use super::backend::{CameraBackend, VideoStream};
use super::types::{AcquireOutcome, FacingMode, RawFrame, StreamRequest, VideoDevice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FakeAnswer {
    Grant,
    /// Grant a stream that has not painted its first frame.
    GrantBlank,
    Deny,
    Absent,
    Fail,
}

/// Shared view of how many fake tracks are still running.
#[derive(Clone, Default)]
pub struct TrackCounter(Arc<AtomicUsize>);

impl TrackCounter {
    pub fn live(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct FakeBackend {
    devices: Mutex<Vec<VideoDevice>>,
    answer: Mutex<FakeAnswer>,
    gate: Option<Arc<Notify>>,
    pub tracks: TrackCounter,
    pub opened: Mutex<Vec<StreamRequest>>,
    pub probe_count: AtomicUsize,
}

impl FakeBackend {
    pub fn new(devices: Vec<VideoDevice>, answer: FakeAnswer) -> Self {
        Self {
            devices: Mutex::new(devices),
            answer: Mutex::new(answer),
            gate: None,
            tracks: TrackCounter::default(),
            opened: Mutex::new(Vec::new()),
            probe_count: AtomicUsize::new(0),
        }
    }

    pub fn rear_camera(answer: FakeAnswer) -> Self {
        Self::new(vec![device("rear", Some(FacingMode::Environment))], answer)
    }

    /// `open_stream` waits for the returned notifier before answering.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn set_answer(&self, answer: FakeAnswer) {
        *self.answer.lock().unwrap() = answer;
    }

    /// Replaces what the next enumeration reports, e.g. a camera unplugged.
    pub fn set_devices(&self, devices: Vec<VideoDevice>) {
        *self.devices.lock().unwrap() = devices;
    }

    pub fn opened_devices(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.device_id.clone())
            .collect()
    }
}

pub fn device(id: &str, facing: Option<FacingMode>) -> VideoDevice {
    VideoDevice {
        id: id.to_string(),
        label: format!("{id} camera"),
        facing,
    }
}

#[async_trait]
impl CameraBackend for FakeBackend {
    async fn enumerate_video_inputs(&self) -> Result<Vec<VideoDevice>> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn open_stream(&self, request: &StreamRequest) -> AcquireOutcome {
        self.opened.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let answer = *self.answer.lock().unwrap();
        match answer {
            FakeAnswer::Grant | FakeAnswer::GrantBlank => {
                self.tracks.0.fetch_add(1, Ordering::SeqCst);
                AcquireOutcome::Granted(Box::new(FakeStream {
                    painted: answer == FakeAnswer::Grant,
                    live: true,
                    tracks: self.tracks.clone(),
                }))
            }
            FakeAnswer::Deny => AcquireOutcome::Denied,
            FakeAnswer::Absent => AcquireOutcome::Absent,
            FakeAnswer::Fail => AcquireOutcome::Failed("device busy".into()),
        }
    }
}

pub struct FakeStream {
    painted: bool,
    live: bool,
    tracks: TrackCounter,
}

impl VideoStream for FakeStream {
    fn latest_frame(&self) -> Option<RawFrame> {
        (self.live && self.painted).then(|| RawFrame {
            width: 8,
            height: 6,
            rgba: vec![128; 8 * 6 * 4],
            captured_at: Utc::now(),
        })
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.tracks.0.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
