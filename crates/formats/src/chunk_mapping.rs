use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use foundation::ids::FeatureId;

use crate::error::FormatError;

/// Maps a feature id to the sample-chunk file holding its activating text
/// samples (`<model>/chunk_mapping.json`).
///
/// Samples are grouped into chunk files so the detail panel never has to
/// load the full sample set at once.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChunkMapping {
    map: BTreeMap<u32, u32>,
}

impl ChunkMapping {
    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        serde_json::from_str(text).map_err(|e| FormatError::Json(e.to_string()))
    }

    pub fn chunk_for(&self, id: FeatureId) -> Option<u32> {
        self.map.get(&id.0).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
