// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Maps resolved documents onto a directory tree mirroring their URLs.
//!
//! `<base>/microsoft.compute/2023-03-01/virtualmachines` becomes
//! `<root>/microsoft.compute/2023-03-01/virtualmachines.<ext>`. Segments are
//! kept in their percent-encoded form, so two distinct URLs never share a
//! path.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::types::{Artifact, HarvestError, HarvestResult, ResolvedSpec};

/// Writes resolved documents under a fixed root directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    base: Url,
    extension: String,
}

impl ArtifactWriter {
    pub fn new(
        root: impl Into<PathBuf>,
        base_url: &str,
        extension: impl Into<String>,
    ) -> HarvestResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| HarvestError::Config(format!("base_url {base_url:?}: {e}")))?;
        if !base.path().ends_with('/') {
            return Err(HarvestError::Config(format!(
                "base_url {base_url:?} must end with '/'"
            )));
        }
        Ok(Self {
            root: root.into(),
            base,
            extension: extension.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path for a document taken from `source_url`.
    pub fn artifact_path(&self, source_url: &str) -> HarvestResult<PathBuf> {
        let reject = |reason: &str| HarvestError::persist(source_url, reason);

        let url = Url::parse(source_url).map_err(|e| HarvestError::persist(source_url, e))?;
        if url.query().is_some() || url.fragment().is_some() {
            return Err(reject("url carries a query or fragment"));
        }
        if url.scheme() != self.base.scheme()
            || url.host_str() != self.base.host_str()
            || url.port_or_known_default() != self.base.port_or_known_default()
        {
            return Err(reject("url is not under the catalog base"));
        }

        let relative = url
            .path()
            .strip_prefix(self.base.path())
            .ok_or_else(|| reject("url is not under the catalog base"))?;

        let segments: Vec<&str> = relative.split('/').collect();
        let Some((name, dirs)) = segments.split_last() else {
            return Err(reject("url has no path below the base"));
        };
        if name.is_empty() {
            return Err(reject("url has no trailing segment"));
        }
        if dirs.iter().any(|d| d.is_empty()) {
            return Err(reject("url has an empty path segment"));
        }

        let mut path = self.root.clone();
        path.extend(dirs);
        path.push(format!("{name}.{}", self.extension));
        Ok(path)
    }

    /// Write `spec` to its mapped path, creating directories as needed.
    pub async fn write(&self, spec: &ResolvedSpec) -> HarvestResult<Artifact> {
        if spec.content.is_empty() {
            return Err(HarvestError::persist(
                &spec.source_url,
                "document can't be empty",
            ));
        }
        if spec.source_url.is_empty() {
            return Err(HarvestError::persist("<empty url>", "url can't be empty"));
        }

        let path = self.artifact_path(&spec.source_url)?;
        let target = path.display().to_string();

        if let Some(parent) = path.parent() {
            // create_dir_all tolerates directories created concurrently by other branches.
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HarvestError::persist(&target, e))?;
        }

        let bytes = spec.content.as_bytes().to_vec();
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| HarvestError::persist(&target, e))?;
        debug!("wrote {} bytes to {target}", bytes.len());

        Ok(Artifact { path, bytes })
    }
}
