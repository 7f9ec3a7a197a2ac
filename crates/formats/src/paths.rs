//! Resource path scheme for per-model data files.
//!
//! All of a model's data lives under `<base>/<model>/`:
//! the feature table, the metadata document, the chunk mapping, and the
//! sample chunk files.

pub fn features_path(base: &str, model: &str) -> String {
    format!("{}/{}/features.parquet", trim_base(base), model)
}

pub fn metadata_path(base: &str, model: &str) -> String {
    format!("{}/{}/metadata.json", trim_base(base), model)
}

pub fn chunk_mapping_path(base: &str, model: &str) -> String {
    format!("{}/{}/chunk_mapping.json", trim_base(base), model)
}

pub fn sample_chunk_path(base: &str, model: &str, chunk: u32) -> String {
    format!("{}/{}/samples/chunk_{}.parquet", trim_base(base), model, chunk)
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}
