use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Per-model metadata document (`<model>/metadata.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub num_latents: u32,
    pub expansion: f64,
    pub source_model: String,
    pub d_in: u32,
    pub repo: String,
}

impl ModelMetadata {
    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        serde_json::from_str(text).map_err(|e| FormatError::Json(e.to_string()))
    }
}
