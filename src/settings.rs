use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::camera::{FacingMode, PermissionPolicy};
use crate::capture::encoder::DEFAULT_JPEG_QUALITY;
use crate::inference::InferenceConfig;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraSettings {
    pub preferred_facing: FacingMode,
    /// Use any camera when none faces the preferred way.
    pub allow_facing_fallback: bool,
    pub jpeg_quality: u8,
    /// Folder the still-image camera reads from.
    pub device_dir: PathBuf,
    pub permission: PermissionPolicy,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            preferred_facing: FacingMode::Environment,
            allow_facing_fallback: true,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            device_dir: PathBuf::from("cameras"),
            permission: PermissionPolicy::Granted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    pub camera: CameraSettings,
    pub inference: InferenceConfig,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ScanSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`; a missing or unreadable file yields defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring malformed settings {}: {err}", path.display());
                ScanSettings::default()
            })
        } else {
            ScanSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn camera(&self) -> CameraSettings {
        self.read().camera.clone()
    }

    pub fn inference(&self) -> InferenceConfig {
        self.read().inference.clone()
    }

    pub fn update_camera(&self, settings: CameraSettings) -> Result<()> {
        let mut guard = self.write();
        guard.camera = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &ScanSettings) -> Result<()> {
        let mut data = data.clone();
        // Keys belong in the environment, not on disk.
        data.inference.api_key = None;
        let serialized = serde_json::to_string_pretty(&data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, ScanSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ScanSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("fitscan.json")).unwrap();
        assert_eq!(store.camera(), CameraSettings::default());
        assert_eq!(store.inference(), InferenceConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitscan.json");
        fs::write(
            &path,
            r#"{"camera":{"preferredFacing":"user"},"inference":{"model":"claude-3-5-sonnet-latest","timeoutSecs":5}}"#,
        )
        .unwrap();

        let store = SettingsStore::new(path).unwrap();
        let camera = store.camera();
        assert_eq!(camera.preferred_facing, FacingMode::User);
        assert!(camera.allow_facing_fallback);
        let inference = store.inference();
        assert_eq!(inference.model, "claude-3-5-sonnet-latest");
        assert_eq!(inference.timeout_secs, 5);
        assert_eq!(inference.max_tokens, 1024);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitscan.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.camera(), CameraSettings::default());
    }

    #[test]
    fn update_persists_without_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitscan.json");
        fs::write(&path, r#"{"inference":{"apiKey":"sk-secret"}}"#).unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.inference().credential(), Some("sk-secret"));

        let camera = CameraSettings {
            jpeg_quality: 60,
            permission: PermissionPolicy::Denied,
            ..CameraSettings::default()
        };
        store.update_camera(camera.clone()).unwrap();
        assert_eq!(store.camera(), camera);

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("sk-secret"));
        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.camera(), camera);
        assert_eq!(reloaded.inference().api_key, None);
    }
}
