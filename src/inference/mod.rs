//! Remote vision model client.
//!
//! - config.rs: endpoint, model and credential settings
//! - wire.rs: request/response bodies of the messages API
//! - extract.rs: pulls the nutrition JSON out of the model's reply text
//! - client.rs: `VisionClient` and the `NutritionAnalyzer` seam

pub mod client;
pub mod config;
pub mod extract;
mod wire;

pub use client::{InferenceError, NutritionAnalyzer, VisionClient};
pub use config::InferenceConfig;
pub use extract::{extract_json_block, parse_estimate};
