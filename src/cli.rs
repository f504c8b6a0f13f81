use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::camera::{FacingMode, PermissionPolicy};
use crate::settings::CameraSettings;

#[derive(Debug, Parser)]
#[command(name = "fitscan", version, about = "Scan a food photo and estimate its nutrition")]
pub struct Cli {
    /// Settings file (JSON).
    #[arg(long, global = true, default_value = "fitscan.json")]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the cameras found in the camera directory.
    Devices(CameraArgs),
    /// Open a camera, capture one frame and analyze it.
    Scan {
        #[command(flatten)]
        camera: CameraArgs,
        /// User agent used to pick permission instructions.
        #[arg(long, default_value = "")]
        user_agent: String,
        /// Write the camera options back to the settings file.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FacingArg {
    Environment,
    User,
}

impl From<FacingArg> for FacingMode {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Environment => FacingMode::Environment,
            FacingArg::User => FacingMode::User,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct CameraArgs {
    /// Folder of still images acting as cameras.
    #[arg(long)]
    pub camera_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub facing: Option<FacingArg>,
    /// Only accept a camera facing the requested way.
    #[arg(long)]
    pub strict_facing: bool,
    /// Answer the permission prompt with "deny".
    #[arg(long)]
    pub deny_permission: bool,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,
}

impl CameraArgs {
    /// Applies the flags that were given on top of `base`.
    pub fn apply(&self, mut base: CameraSettings) -> CameraSettings {
        if let Some(dir) = &self.camera_dir {
            base.device_dir = dir.clone();
        }
        if let Some(facing) = self.facing {
            base.preferred_facing = facing.into();
        }
        if self.strict_facing {
            base.allow_facing_fallback = false;
        }
        if self.deny_permission {
            base.permission = PermissionPolicy::Denied;
        }
        if let Some(quality) = self.jpeg_quality {
            base.jpeg_quality = quality;
        }
        base
    }
}
