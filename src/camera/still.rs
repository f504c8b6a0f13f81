//! Directory-backed camera: every image file in a folder is one "device".
//!
//! File stems starting with `environment` are rear cameras, `user` front
//! cameras; anything else reports an unknown facing. Opening a device decodes
//! the file once and serves it as a single, unchanging frame until stopped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::backend::{CameraBackend, VideoStream};
use super::types::{AcquireOutcome, FacingMode, RawFrame, StreamRequest, VideoDevice};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// How the simulated permission prompt answers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PermissionPolicy {
    #[default]
    Granted,
    Denied,
}

pub struct StillImageBackend {
    dir: PathBuf,
    permission: PermissionPolicy,
}

impl StillImageBackend {
    pub fn new(dir: impl Into<PathBuf>, permission: PermissionPolicy) -> Self {
        Self {
            dir: dir.into(),
            permission,
        }
    }

    fn device_path(&self, device_id: &str) -> PathBuf {
        self.dir.join(device_id)
    }
}

fn facing_from_stem(stem: &str) -> Option<FacingMode> {
    let stem = stem.to_ascii_lowercase();
    if stem.starts_with("environment") {
        Some(FacingMode::Environment)
    } else if stem.starts_with("user") {
        Some(FacingMode::User)
    } else {
        None
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl CameraBackend for StillImageBackend {
    async fn enumerate_video_inputs(&self) -> Result<Vec<VideoDevice>> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            log_warn!("camera directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to list cameras in {}", self.dir.display()))?;

        let mut devices = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_image(&path) {
                continue;
            }
            let (Some(file_name), Some(stem)) = (
                path.file_name().and_then(|n| n.to_str()),
                path.file_stem().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            devices.push(VideoDevice {
                id: file_name.to_string(),
                label: stem.to_string(),
                facing: facing_from_stem(stem),
            });
        }

        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    async fn open_stream(&self, request: &StreamRequest) -> AcquireOutcome {
        if self.permission == PermissionPolicy::Denied {
            return AcquireOutcome::Denied;
        }

        let path = self.device_path(&request.device_id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return AcquireOutcome::Absent;
        }

        let decoded = tokio::task::spawn_blocking(move || image::open(&path)).await;
        let image = match decoded {
            Ok(Ok(image)) => image.to_rgba8(),
            Ok(Err(err)) => return AcquireOutcome::Failed(format!("decode failed: {err}")),
            Err(err) => return AcquireOutcome::Failed(format!("decode task failed: {err}")),
        };

        log_info!(
            "opened still camera {} ({}x{})",
            request.device_id,
            image.width(),
            image.height()
        );

        AcquireOutcome::Granted(Box::new(StillImageStream {
            frame: RawFrame {
                width: image.width(),
                height: image.height(),
                rgba: image.into_raw(),
                captured_at: Utc::now(),
            },
            live: true,
        }))
    }
}

struct StillImageStream {
    frame: RawFrame,
    live: bool,
}

impl VideoStream for StillImageStream {
    fn latest_frame(&self) -> Option<RawFrame> {
        self.live.then(|| RawFrame {
            captured_at: Utc::now(),
            ..self.frame.clone()
        })
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }

    fn stop(&mut self) {
        self.live = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_image(dir: &Path, name: &str) {
        let img = RgbImage::from_pixel(4, 3, Rgb([200, 40, 10]));
        img.save(dir.join(name)).unwrap();
    }

    #[tokio::test]
    async fn enumerates_images_with_facing_from_name() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "user-front.png");
        write_image(dir.path(), "environment.jpg");
        write_image(dir.path(), "webcam.png");
        std::fs::write(dir.path().join("notes.txt"), "not a camera").unwrap();

        let backend = StillImageBackend::new(dir.path(), PermissionPolicy::Granted);
        let devices = backend.enumerate_video_inputs().await.unwrap();

        let summary: Vec<_> = devices.iter().map(|d| (d.id.as_str(), d.facing)).collect();
        assert_eq!(
            summary,
            vec![
                ("environment.jpg", Some(FacingMode::Environment)),
                ("user-front.png", Some(FacingMode::User)),
                ("webcam.png", None),
            ]
        );
    }

    #[tokio::test]
    async fn missing_directory_means_no_devices() {
        let backend =
            StillImageBackend::new("/nonexistent/fitscan/cams", PermissionPolicy::Granted);
        assert!(backend.enumerate_video_inputs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_serves_frame_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "environment.png");
        let backend = StillImageBackend::new(dir.path(), PermissionPolicy::Granted);

        let request = StreamRequest {
            device_id: "environment.png".into(),
            facing: FacingMode::Environment,
        };
        let AcquireOutcome::Granted(mut stream) = backend.open_stream(&request).await else {
            panic!("expected a granted stream");
        };

        let frame = stream.latest_frame().unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.rgba.len(), 4 * 3 * 4);
        assert_eq!(stream.live_tracks(), 1);

        stream.stop();
        assert_eq!(stream.live_tracks(), 0);
        assert!(stream.latest_frame().is_none());
    }

    #[tokio::test]
    async fn denied_policy_and_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "environment.png");

        let request = StreamRequest {
            device_id: "environment.png".into(),
            facing: FacingMode::Environment,
        };
        let denied = StillImageBackend::new(dir.path(), PermissionPolicy::Denied);
        assert!(matches!(denied.open_stream(&request).await, AcquireOutcome::Denied));

        let granted = StillImageBackend::new(dir.path(), PermissionPolicy::Granted);
        let missing = StreamRequest {
            device_id: "gone.png".into(),
            facing: FacingMode::Environment,
        };
        assert!(matches!(granted.open_stream(&missing).await, AcquireOutcome::Absent));
    }

    #[tokio::test]
    async fn undecodable_file_is_a_device_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("environment.jpg"), b"not really a jpeg").unwrap();
        let backend = StillImageBackend::new(dir.path(), PermissionPolicy::Granted);

        let request = StreamRequest {
            device_id: "environment.jpg".into(),
            facing: FacingMode::Environment,
        };
        assert!(matches!(backend.open_stream(&request).await, AcquireOutcome::Failed(_)));
    }
}
