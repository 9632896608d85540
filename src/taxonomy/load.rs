use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use super::parse::parse_raw_tree;
use super::tree::{LoadOptions, Taxonomy, normalize};

pub fn load_taxonomy(path: &Path, options: &LoadOptions) -> Result<Taxonomy> {
    let started = Instant::now();

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read taxonomy file {}", path.display()))?;
    let tree = parse_raw_tree(&raw)
        .with_context(|| format!("failed to parse taxonomy file {}", path.display()))?;
    let taxonomy = normalize(tree, options)
        .with_context(|| format!("malformed hierarchy in {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = taxonomy.len(),
        leaves = taxonomy.leaf_count(),
        max_depth = taxonomy.max_depth(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "taxonomy loaded"
    );

    Ok(taxonomy)
}
