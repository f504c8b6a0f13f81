use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    camera::{CameraBackend, DeviceAccessManager, DeviceError, FacingMode},
    capture::FrameCapturer,
    inference::{InferenceError, NutritionAnalyzer},
    nutrition::{self, EstimateSource, UNKNOWN_FOOD},
};

use super::{
    BrowserKind, EventSink, NavigationIntent, NoticeLevel, ScanEvent, ScanPhase, ScanState,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const MSG_CAMERA_STARTED: &str = "Camera started successfully. Point at your food and capture.";
const MSG_ANALYZING: &str = "Analyzing your food...";
const MSG_ANALYZED: &str = "Food analyzed successfully!";
const MSG_ESTIMATED: &str = "API error. Using estimated nutritional data.";
const MSG_CAPTURE_FAILED: &str = "Failed to analyze food. Please try again.";
const MSG_CAMERA_MISSING: &str = "Camera not available. Please restart scanning.";

/// How a scan session talks to the camera.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub facing: FacingMode,
    pub allow_facing_fallback: bool,
    pub jpeg_quality: u8,
    pub browser: BrowserKind,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            allow_facing_fallback: true,
            jpeg_quality: crate::capture::encoder::DEFAULT_JPEG_QUALITY,
            browser: BrowserKind::Default,
        }
    }
}

struct Session {
    state: ScanState,
    /// Token of the acquisition still in flight; new requests wait for it.
    pending: Option<(u64, CancellationToken)>,
    generation: u64,
}

/// Drives one food scan: camera → capture → release → analysis → result.
#[derive(Clone)]
pub struct ScanController {
    session: Arc<Mutex<Session>>,
    devices: Arc<DeviceAccessManager>,
    device_errors: Arc<Mutex<mpsc::UnboundedReceiver<DeviceError>>>,
    capturer: FrameCapturer,
    analyzer: Arc<dyn NutritionAnalyzer>,
    events: Arc<dyn EventSink>,
    state_tx: Arc<watch::Sender<ScanState>>,
    options: ScanOptions,
}

impl ScanController {
    /// Creates the controller and probes for cameras.
    pub async fn mount(
        backend: Arc<dyn CameraBackend>,
        analyzer: Arc<dyn NutritionAnalyzer>,
        events: Arc<dyn EventSink>,
        options: ScanOptions,
    ) -> Self {
        let (devices, device_errors) =
            DeviceAccessManager::mount(backend, options.facing, options.allow_facing_fallback)
                .await;
        let state = ScanState::new(devices.is_available());
        let (state_tx, _) = watch::channel(state.clone());

        let capturer = FrameCapturer::new(options.jpeg_quality);
        log_info!(
            "scan controller mounted (camera available: {}, jpeg quality {})",
            state.camera_available,
            capturer.quality()
        );

        Self {
            session: Arc::new(Mutex::new(Session {
                state,
                pending: None,
                generation: 0,
            })),
            devices: Arc::new(devices),
            device_errors: Arc::new(Mutex::new(device_errors)),
            capturer,
            analyzer,
            events,
            state_tx: Arc::new(state_tx),
            options,
        }
    }

    pub async fn snapshot(&self) -> ScanState {
        self.session.lock().await.state.clone()
    }

    /// Read-only view of every state the session passes through.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// Re-runs the camera probe, e.g. after the user plugged a camera in.
    pub async fn detect_devices(&self) -> ScanState {
        let available = self.devices.probe().await;
        let mut session = self.session.lock().await;
        session.state.camera_available = available;
        self.publish(&session.state);
        session.state.clone()
    }

    /// Idle → Requesting → Live | Error. No-op without a camera, outside
    /// Idle, or while an earlier request is unresolved.
    pub async fn start(&self) -> ScanState {
        self.request_stream(ScanPhase::Idle, false).await
    }

    /// Result → Requesting.
    pub async fn rescan(&self) -> ScanState {
        self.request_stream(ScanPhase::Result, false).await
    }

    /// Error → Requesting, asking for permission again.
    pub async fn retry_permission(&self) -> ScanState {
        {
            let session = self.session.lock().await;
            if session.state.phase != ScanPhase::Error {
                return session.state.clone();
            }
        }
        self.devices.probe().await;
        self.request_stream(ScanPhase::Error, true).await
    }

    async fn request_stream(&self, from: ScanPhase, retry: bool) -> ScanState {
        let (generation, token) = {
            let mut session = self.session.lock().await;

            if !self.devices.is_available() {
                log_warn!("scan start ignored: no camera available");
                session.state.camera_available = false;
                self.publish(&session.state);
                return session.state.clone();
            }
            if session.state.phase != from {
                log_warn!(
                    "scan start ignored in {:?} (expected {:?})",
                    session.state.phase,
                    from
                );
                return session.state.clone();
            }
            if session.pending.is_some() {
                log_warn!("scan start ignored: camera request still pending");
                return session.state.clone();
            }

            session.generation += 1;
            let token = CancellationToken::new();
            session.pending = Some((session.generation, token.clone()));
            session.state.begin_request();
            self.publish(&session.state);
            (session.generation, token)
        };

        let acquired = if retry {
            self.devices.retry(&token).await
        } else {
            self.devices.acquire(self.options.facing, &token).await
        };

        let mut session = self.session.lock().await;
        if matches!(session.pending, Some((g, _)) if g == generation) {
            session.pending = None;
        }

        if token.is_cancelled() || session.state.phase != ScanPhase::Requesting {
            if acquired.is_some() {
                self.devices.release();
            }
            log_info!("camera request {generation} resolved after cancel; ignored");
            return session.state.clone();
        }

        match acquired {
            Some(stream) => {
                session.state.go_live(stream);
                self.publish(&session.state);
                self.notify(NoticeLevel::Success, MSG_CAMERA_STARTED);
            }
            None => {
                let error = self.take_device_error().await.unwrap_or_else(|| {
                    DeviceError::Device("camera request returned no stream".into())
                });
                let guide = match error {
                    DeviceError::PermissionDenied | DeviceError::NoDevice => {
                        Some(self.options.browser)
                    }
                    DeviceError::Device(_) => None,
                };
                session.state.permission_denied = self.devices.is_permission_denied();
                session.state.camera_available = self.devices.is_available();
                session.state.fail(error.clone(), guide);
                self.publish(&session.state);
                self.notify(NoticeLevel::Error, &error.to_string());
            }
        }

        session.state.clone()
    }

    /// Requesting | Live → Idle. A pending request resolves into nothing.
    pub async fn cancel(&self) -> ScanState {
        let mut session = self.session.lock().await;
        match session.state.phase {
            ScanPhase::Requesting => {
                if let Some((_, token)) = &session.pending {
                    token.cancel();
                }
                session.state.return_to_idle();
                self.publish(&session.state);
            }
            ScanPhase::Live => {
                self.devices.release();
                session.state.return_to_idle();
                self.publish(&session.state);
            }
            _ => {}
        }
        session.state.clone()
    }

    /// Live → Analyzing → Result. The frame is taken and the camera released
    /// before the image leaves the process.
    pub async fn capture(&self) -> ScanState {
        let payload = {
            let mut session = self.session.lock().await;
            match session.state.phase {
                ScanPhase::Live => {}
                ScanPhase::Analyzing => {
                    log_info!("capture ignored: analysis already running");
                    return session.state.clone();
                }
                _ => {
                    self.notify(NoticeLevel::Error, MSG_CAMERA_MISSING);
                    return session.state.clone();
                }
            }

            let captured = self
                .devices
                .with_live_stream(|stream| self.capturer.capture(stream));

            match captured {
                Some(Ok(payload)) => {
                    self.devices.release();
                    session.state.begin_analysis();
                    self.publish(&session.state);
                    self.notify(NoticeLevel::Info, MSG_ANALYZING);
                    payload
                }
                Some(Err(err)) => {
                    log_warn!("frame capture failed: {err}");
                    self.notify(NoticeLevel::Error, MSG_CAPTURE_FAILED);
                    return session.state.clone();
                }
                None => {
                    log_warn!("session was live but the camera holds no stream");
                    session.state.return_to_idle();
                    self.publish(&session.state);
                    self.notify(NoticeLevel::Error, MSG_CAMERA_MISSING);
                    return session.state.clone();
                }
            }
        };

        let outcome = self.analyzer.analyze(payload).await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(estimate) => {
                log_info!("analysis identified {}", estimate.food());
                session.state.finish(estimate, EstimateSource::Analyzed);
                self.publish(&session.state);
                self.notify(NoticeLevel::Success, MSG_ANALYZED);
            }
            Err(InferenceError::Configuration(reason)) => {
                log_error!("vision service not configured: {reason}");
                session.state.config_error = true;
                session
                    .state
                    .finish(nutrition::estimate(UNKNOWN_FOOD), EstimateSource::Estimated);
                self.publish(&session.state);
                self.notify(
                    NoticeLevel::Error,
                    &format!(
                        "Food analysis is not configured ({reason}). Showing estimated nutritional data."
                    ),
                );
            }
            Err(err) => {
                log_warn!("analysis failed, using fallback: {err}");
                session
                    .state
                    .finish(nutrition::estimate(UNKNOWN_FOOD), EstimateSource::Estimated);
                self.publish(&session.state);
                self.notify(NoticeLevel::Warning, MSG_ESTIMATED);
            }
        }
        session.state.clone()
    }

    /// Error → Idle.
    pub async fn reset(&self) -> ScanState {
        let mut session = self.session.lock().await;
        if session.state.phase == ScanPhase::Error {
            session.state.return_to_idle();
            self.publish(&session.state);
        }
        session.state.clone()
    }

    /// Re-opens the permission instructions while access is denied.
    pub async fn show_permission_guide(&self) -> ScanState {
        let mut session = self.session.lock().await;
        if session.state.permission_denied {
            session.state.permission_guide = Some(self.options.browser);
            self.publish(&session.state);
        }
        session.state.clone()
    }

    pub async fn back_to_dashboard(&self) {
        self.teardown().await;
        self.events.emit(ScanEvent::Navigate {
            intent: NavigationIntent::Dashboard,
        });
    }

    /// Releases the camera as the view goes away.
    pub async fn teardown(&self) {
        self.cancel().await;
        self.devices.release();
    }

    async fn take_device_error(&self) -> Option<DeviceError> {
        let mut rx = self.device_errors.lock().await;
        let mut last = None;
        while let Ok(error) = rx.try_recv() {
            last = Some(error);
        }
        last
    }

    fn publish(&self, state: &ScanState) {
        self.state_tx.send_replace(state.clone());
        self.events.emit(ScanEvent::StateChanged {
            state: state.clone(),
        });
    }

    fn notify(&self, level: NoticeLevel, message: &str) {
        self.events.emit(ScanEvent::Notice {
            level,
            message: message.to_string(),
        });
    }
}
