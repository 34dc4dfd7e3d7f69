// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Manifest acquisition: fetch the raw table of contents, cut out the
//! catalog section, and persist it.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::http_client::HttpClient;
use crate::types::{HarvestError, HarvestResult, ManifestNode};

/// The catalog section of a manifest, ready to be walked.
#[derive(Debug, Clone)]
pub struct NormalizedManifest {
    /// Compact JSON of the section's children with sorted object keys.
    pub canonical: Vec<u8>,
    /// Top-level branches of the catalog, in manifest order.
    pub branches: Vec<ManifestNode>,
}

/// Retrieve the raw manifest bytes.
///
/// The request is made once. Any failure is fatal to the run, so nothing is
/// retried here.
pub async fn fetch_manifest(client: &HttpClient, url: &str) -> HarvestResult<Vec<u8>> {
    info!("fetching manifest from {url}");
    let resp = client
        .get_once(url)
        .await
        .map_err(|e| HarvestError::Fetch(format!("{url}: {e}")))?;

    if !resp.is_success() {
        return Err(HarvestError::Fetch(format!(
            "{url}: HTTP status {}",
            resp.status
        )));
    }

    debug!("manifest is {} bytes", resp.body.len());
    Ok(resp.body)
}

/// Extract `items[section_index].children` from the raw manifest.
///
/// A bare top-level array of sections is accepted in place of the
/// `{"items": [...]}` wrapper.
pub fn normalize(raw: &[u8], section_index: usize) -> HarvestResult<NormalizedManifest> {
    let root: Value = serde_json::from_slice(raw)
        .map_err(|e| HarvestError::Shape(format!("manifest is not JSON: {e}")))?;

    let sections = match &root {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| HarvestError::Shape("manifest has no `items` array".to_string()))?,
        _ => {
            return Err(HarvestError::Shape(
                "manifest is neither an object nor an array".to_string(),
            ))
        }
    };

    let section = sections.get(section_index).ok_or_else(|| {
        HarvestError::Shape(format!(
            "manifest has {} sections, expected at least {}",
            sections.len(),
            section_index + 1
        ))
    })?;

    let children = section.get("children").ok_or_else(|| {
        HarvestError::Shape(format!("section {section_index} has no `children`"))
    })?;
    if !children.is_array() {
        return Err(HarvestError::Shape(format!(
            "section {section_index} `children` is not an array"
        )));
    }

    from_section(children.clone())
}

/// Parse an already normalized document, as written by [`ManifestStore`].
pub fn parse_normalized(canonical: &[u8]) -> HarvestResult<NormalizedManifest> {
    let value: Value = serde_json::from_slice(canonical)
        .map_err(|e| HarvestError::Shape(format!("stored manifest is not JSON: {e}")))?;
    if !value.is_array() {
        return Err(HarvestError::Shape(
            "stored manifest is not an array".to_string(),
        ));
    }
    from_section(value)
}

fn from_section(children: Value) -> HarvestResult<NormalizedManifest> {
    let canonical = serde_json::to_vec(&children)
        .map_err(|e| HarvestError::Shape(format!("cannot serialize catalog: {e}")))?;
    let branches: Vec<ManifestNode> = serde_json::from_value(children)
        .map_err(|e| HarvestError::Shape(format!("catalog nodes are malformed: {e}")))?;

    Ok(NormalizedManifest {
        canonical,
        branches,
    })
}

/// Local copy of the normalized manifest.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the canonical document, replacing any previous copy.
    pub async fn save(&self, canonical: &[u8]) -> HarvestResult<()> {
        let target = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HarvestError::persist(&target, e))?;
        }
        tokio::fs::write(&self.path, canonical)
            .await
            .map_err(|e| HarvestError::persist(&target, e))?;
        info!("stored manifest at {target}");
        Ok(())
    }

    /// Read back a previously stored manifest.
    pub async fn load(&self) -> HarvestResult<NormalizedManifest> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            HarvestError::Fetch(format!("cannot read {}: {e}", self.path.display()))
        })?;
        parse_normalized(&bytes)
    }
}
