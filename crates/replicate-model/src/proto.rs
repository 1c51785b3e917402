use serde::{Deserialize, Serialize};

use crate::ReplicateConfig;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionRequest {
    version: String,
    input: PredictionInput,
}

/// The generation parameters are fixed: square output, a fixed step
/// count, guidance scale and sampler. Only the prompt varies.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionInput {
    prompt: String,
    image_dimensions: &'static str,
    num_inference_steps: u32,
    num_outputs: u32,
    guidance_scale: f32,
    scheduler: &'static str,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
    pub urls: PredictionUrls,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PredictionUrls {
    pub get: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    prompt: &str,
    config: &ReplicateConfig,
) -> PredictionRequest {
    PredictionRequest {
        version: config.version.clone(),
        input: PredictionInput {
            prompt: prompt.to_owned(),
            image_dimensions: "512x512",
            num_inference_steps: 12,
            num_outputs: 1,
            guidance_scale: 3.5,
            scheduler: "K_EULER",
        },
    }
}
