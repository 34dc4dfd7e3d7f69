// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end run: manifest acquisition, storage, and fan-out.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::HarvestConfig;
use crate::harvest::Harvester;
use crate::http_client::HttpClient;
use crate::manifest::{self, ManifestStore, NormalizedManifest};
use crate::report::HarvestReport;
use crate::resolver::{HttpSpecResolver, SpecResolver};
use crate::types::HarvestResult;
use crate::walker::VersionPolicy;
use crate::writer::ArtifactWriter;

/// Fetch and normalize the remote manifest.
pub async fn acquire_manifest(
    config: &HarvestConfig,
    client: &HttpClient,
) -> HarvestResult<NormalizedManifest> {
    let raw = manifest::fetch_manifest(client, &config.manifest_url).await?;
    manifest::normalize(&raw, config.section_index)
}

/// Build the harvester described by `config` around `resolver`.
pub fn build_harvester(
    config: &HarvestConfig,
    resolver: Arc<dyn SpecResolver>,
) -> HarvestResult<Harvester> {
    let writer = ArtifactWriter::new(&config.output_dir, &config.base_url, &config.extension)?;
    let harvester = Harvester::new(resolver, writer, VersionPolicy::new(config.keep_versions));
    Ok(match config.max_in_flight {
        Some(limit) => harvester.with_max_in_flight(limit),
        None => harvester,
    })
}

/// Fetch, normalize, store and mirror the whole catalog over HTTP.
pub async fn harvest(config: &HarvestConfig) -> HarvestResult<HarvestReport> {
    config.validate()?;
    let client = HttpClient::new(config.timeout_ms);
    let resolver = HttpSpecResolver::new(client.clone(), &config.base_url, &config.code_selector)?;
    harvest_with(config, &client, Arc::new(resolver)).await
}

/// Same as [`harvest`] with a caller-supplied resolver.
pub async fn harvest_with(
    config: &HarvestConfig,
    client: &HttpClient,
    resolver: Arc<dyn SpecResolver>,
) -> HarvestResult<HarvestReport> {
    let started_at = Utc::now();
    let clock = Instant::now();

    let harvester = build_harvester(config, resolver)?;
    let manifest = acquire_manifest(config, client).await?;
    let store = ManifestStore::new(&config.manifest_path);

    let NormalizedManifest {
        canonical,
        branches,
    } = manifest;
    let (stored, branches) = tokio::join!(store.save(&canonical), harvester.run(branches));
    stored?;

    let mut report = HarvestReport::new(started_at);
    report.manifest_path = Some(store.path().to_path_buf());
    report.branches = branches;
    report.duration_ms = clock.elapsed().as_millis() as u64;
    log_summary(&report);
    Ok(report)
}

/// Replay the stored manifest instead of fetching a fresh one.
pub async fn harvest_stored(config: &HarvestConfig) -> HarvestResult<HarvestReport> {
    config.validate()?;
    let client = HttpClient::new(config.timeout_ms);
    let resolver = HttpSpecResolver::new(client, &config.base_url, &config.code_selector)?;
    harvest_stored_with(config, Arc::new(resolver)).await
}

/// Same as [`harvest_stored`] with a caller-supplied resolver.
pub async fn harvest_stored_with(
    config: &HarvestConfig,
    resolver: Arc<dyn SpecResolver>,
) -> HarvestResult<HarvestReport> {
    let started_at = Utc::now();
    let clock = Instant::now();

    let harvester = build_harvester(config, resolver)?;
    let store = ManifestStore::new(&config.manifest_path);
    let manifest = store.load().await?;
    info!(
        "replaying {} branches from {}",
        manifest.branches.len(),
        store.path().display()
    );

    let mut report = HarvestReport::new(started_at);
    report.manifest_path = Some(store.path().to_path_buf());
    report.branches = harvester.run(manifest.branches).await;
    report.duration_ms = clock.elapsed().as_millis() as u64;
    log_summary(&report);
    Ok(report)
}

fn log_summary(report: &HarvestReport) {
    let skipped = report.skipped();
    info!(
        "harvest finished in {} ms: {} written, {} skipped",
        report.duration_ms,
        report.written(),
        skipped.len()
    );
    for branch in report.failed_branches() {
        warn!(
            "branch {} aborted: {}",
            branch.title,
            branch.aborted.as_deref().unwrap_or_default()
        );
    }
}
