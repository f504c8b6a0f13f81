pub mod camera;
pub mod capture;
mod cli;
pub mod inference;
pub mod nutrition;
pub mod scan;
pub mod settings;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use camera::{CameraBackend, StillImageBackend};
use cli::{Cli, Command};
use inference::{InferenceConfig, VisionClient};
use nutrition::EstimateSource;
use scan::{BrowserKind, LogSink, ScanController, ScanOptions, ScanPhase};
use settings::{CameraSettings, SettingsStore};

const API_KEY_ENV: &str = "FITSCAN_API_KEY";

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let store = SettingsStore::new(cli.settings.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command {
        Command::Devices(camera) => {
            let settings = camera.apply(store.camera());
            runtime.block_on(list_devices(&settings))
        }
        Command::Scan {
            camera,
            user_agent,
            save,
        } => {
            let settings = camera.apply(store.camera());
            if save {
                store.update_camera(settings.clone())?;
                info!("camera settings saved to {}", cli.settings.display());
            }
            let inference = resolve_credential(store.inference());
            let browser = BrowserKind::from_user_agent(&user_agent);
            runtime.block_on(scan_once(settings, inference, browser))
        }
    }
}

/// The only place the environment is consulted for the key.
fn resolve_credential(config: InferenceConfig) -> InferenceConfig {
    if config.credential().is_some() {
        return config;
    }
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => config.with_api_key(key),
        _ => {
            warn!("{API_KEY_ENV} is not set; results will be estimated locally");
            config
        }
    }
}

async fn list_devices(settings: &CameraSettings) -> Result<()> {
    let backend = StillImageBackend::new(&settings.device_dir, settings.permission);
    let devices = backend.enumerate_video_inputs().await?;

    if devices.is_empty() {
        println!("No cameras in {}", settings.device_dir.display());
        return Ok(());
    }

    for device in devices {
        let facing = device.facing.map(|f| f.as_str()).unwrap_or("unknown");
        println!("{:<32} {:<12} {}", device.id, facing, device.label);
    }
    Ok(())
}

async fn scan_once(
    settings: CameraSettings,
    inference: InferenceConfig,
    browser: BrowserKind,
) -> Result<()> {
    let backend = Arc::new(StillImageBackend::new(
        &settings.device_dir,
        settings.permission,
    ));
    let client = VisionClient::new(inference)?;
    info!(
        "using model {} at {}",
        client.config().model,
        client.config().endpoint
    );

    let controller = ScanController::mount(
        backend,
        Arc::new(client),
        Arc::new(LogSink),
        ScanOptions {
            facing: settings.preferred_facing,
            allow_facing_fallback: settings.allow_facing_fallback,
            jpeg_quality: settings.jpeg_quality,
            browser,
        },
    )
    .await;

    let state = controller.snapshot().await;
    if !state.camera_available {
        println!(
            "No camera detected in {}. Add an image named environment.jpg or user.jpg.",
            settings.device_dir.display()
        );
        return Ok(());
    }

    let state = controller.start().await;
    if state.phase != ScanPhase::Live {
        if let Some(error) = &state.error {
            println!("Camera unavailable: {error}");
        }
        if let Some(guide) = state.permission_guide {
            println!(
                "Enable camera access in {} settings, then retry.",
                guide.as_str()
            );
        }
        controller.teardown().await;
        return Ok(());
    }

    let state = controller.capture().await;
    controller.teardown().await;

    let Some(result) = state.result else {
        println!("Capture failed; no result.");
        return Ok(());
    };

    let label = match result.source {
        EstimateSource::Analyzed => "Analyzed",
        EstimateSource::Estimated => "Estimated",
    };
    println!("{} [{}]", result.estimate.food(), label);
    println!("  Calories: {} kcal", result.estimate.calories());
    println!("  Protein:  {}g", result.estimate.protein());
    println!("  Carbs:    {}g", result.estimate.carbs());
    println!("  Fat:      {}g", result.estimate.fat());
    if state.config_error {
        println!("Set {API_KEY_ENV} or inference.apiKey to analyze real photos.");
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
