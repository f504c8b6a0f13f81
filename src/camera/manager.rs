use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::backend::{CameraBackend, VideoStream};
use super::types::{
    AcquireOutcome, DeviceError, FacingMode, StreamInfo, StreamRequest, VideoDevice,
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

struct HeldStream {
    info: StreamInfo,
    stream: Box<dyn VideoStream>,
}

struct DeviceState {
    available: bool,
    permission_denied: bool,
    facing_preference: FacingMode,
    held: Option<HeldStream>,
}

/// Owns the single camera stream of a scan session.
///
/// Failures never surface as `Err`: `acquire` returns `None` and pushes a
/// [`DeviceError`] onto the channel handed out by [`DeviceAccessManager::mount`].
pub struct DeviceAccessManager {
    backend: Arc<dyn CameraBackend>,
    allow_facing_fallback: bool,
    state: Mutex<DeviceState>,
    errors: mpsc::UnboundedSender<DeviceError>,
}

impl DeviceAccessManager {
    /// Builds the manager and probes for cameras without asking for
    /// permission.
    pub async fn mount(
        backend: Arc<dyn CameraBackend>,
        facing_preference: FacingMode,
        allow_facing_fallback: bool,
    ) -> (Self, mpsc::UnboundedReceiver<DeviceError>) {
        let (errors, error_rx) = mpsc::unbounded_channel();
        let manager = Self {
            backend,
            allow_facing_fallback,
            state: Mutex::new(DeviceState {
                available: false,
                permission_denied: false,
                facing_preference,
                held: None,
            }),
            errors,
        };
        manager.probe().await;
        (manager, error_rx)
    }

    /// Re-runs the capability probe and returns the new availability.
    pub async fn probe(&self) -> bool {
        let available = match self.backend.enumerate_video_inputs().await {
            Ok(devices) => {
                log_info!("camera probe found {} video input(s)", devices.len());
                !devices.is_empty()
            }
            Err(err) => {
                log_warn!("camera probe failed, treating as no camera: {err:#}");
                false
            }
        };
        self.lock().available = available;
        available
    }

    pub async fn acquire(
        &self,
        facing: FacingMode,
        cancel: &CancellationToken,
    ) -> Option<StreamInfo> {
        {
            let mut state = self.lock();
            state.facing_preference = facing;
            if let Some(held) = &state.held {
                return Some(held.info.clone());
            }
        }

        let devices = match self.backend.enumerate_video_inputs().await {
            Ok(devices) => devices,
            Err(err) => {
                self.report(cancel, DeviceError::Device(format!("{err:#}")));
                return None;
            }
        };

        if devices.is_empty() {
            self.lock().available = false;
            self.report(cancel, DeviceError::NoDevice);
            return None;
        }

        let Some(device) = self.select_device(&devices, facing) else {
            log_warn!(
                "no {} camera among {} device(s) and facing fallback is off",
                facing.as_str(),
                devices.len()
            );
            self.report(cancel, DeviceError::NoDevice);
            return None;
        };

        let request = StreamRequest {
            device_id: device.id.clone(),
            facing,
        };

        match self.backend.open_stream(&request).await {
            AcquireOutcome::Granted(mut stream) => {
                if cancel.is_cancelled() {
                    log_info!("stream for {} resolved after cancel; stopping it", device.id);
                    stream.stop();
                    return None;
                }

                let mut state = self.lock();
                if let Some(held) = &state.held {
                    stream.stop();
                    return Some(held.info.clone());
                }

                let info = StreamInfo {
                    id: Uuid::new_v4(),
                    device_id: device.id.clone(),
                    label: device.label.clone(),
                    facing: device.facing,
                };
                log_info!("camera stream {} live on {}", info.id, info.device_id);

                state.available = true;
                state.permission_denied = false;
                state.held = Some(HeldStream {
                    info: info.clone(),
                    stream,
                });
                Some(info)
            }
            AcquireOutcome::Denied => {
                if !cancel.is_cancelled() {
                    self.lock().permission_denied = true;
                }
                self.report(cancel, DeviceError::PermissionDenied);
                None
            }
            AcquireOutcome::Absent => {
                self.report(cancel, DeviceError::NoDevice);
                None
            }
            AcquireOutcome::Failed(message) => {
                self.report(cancel, DeviceError::Device(message));
                None
            }
        }
    }

    /// Clears the denied flag and asks again with the last facing preference.
    pub async fn retry(&self, cancel: &CancellationToken) -> Option<StreamInfo> {
        let facing = {
            let mut state = self.lock();
            state.permission_denied = false;
            state.facing_preference
        };
        self.acquire(facing, cancel).await
    }

    /// Stops every track of the held stream. Safe to call repeatedly.
    pub fn release(&self) {
        let held = self.lock().held.take();
        if let Some(mut held) = held {
            held.stream.stop();
            debug_assert_eq!(held.stream.live_tracks(), 0);
            log_info!("camera stream {} released", held.info.id);
        }
    }

    /// Runs `f` against the held stream, if any, without handing it out.
    pub fn with_live_stream<R>(&self, f: impl FnOnce(&dyn VideoStream) -> R) -> Option<R> {
        let state = self.lock();
        state.held.as_ref().map(|held| f(held.stream.as_ref()))
    }

    pub fn is_available(&self) -> bool {
        self.lock().available
    }

    pub fn is_permission_denied(&self) -> bool {
        self.lock().permission_denied
    }

    pub fn is_live(&self) -> bool {
        self.lock().held.is_some()
    }

    fn select_device<'a>(
        &self,
        devices: &'a [VideoDevice],
        facing: FacingMode,
    ) -> Option<&'a VideoDevice> {
        devices
            .iter()
            .find(|d| d.facing == Some(facing))
            .or_else(|| devices.iter().find(|d| d.facing.is_none()))
            .or_else(|| {
                if self.allow_facing_fallback {
                    devices.first()
                } else {
                    None
                }
            })
    }

    fn report(&self, cancel: &CancellationToken, error: DeviceError) {
        if cancel.is_cancelled() {
            return;
        }
        log_warn!("camera acquisition failed: {error}");
        let _ = self.errors.send(error);
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for DeviceAccessManager {
    fn drop(&mut self) {
        self.release();
    }
}
