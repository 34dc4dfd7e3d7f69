// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Fan-out over the catalog's top-level branches.
//!
//! Each branch gets its own task which walks the branch and resolves then
//! persists its leaves one after another, in manifest order. Nothing is
//! shared between tasks except the resolver, the writer and the optional
//! in-flight limit. A failing leaf is recorded and the walk moves on.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::report::{BranchReport, LeafOutcome};
use crate::resolver::SpecResolver;
use crate::types::{Artifact, HarvestError, HarvestResult, ManifestNode};
use crate::walker::{self, Leaf, VersionPolicy};
use crate::writer::ArtifactWriter;

/// Runs one traversal per branch and joins them.
#[derive(Clone)]
pub struct Harvester {
    resolver: Arc<dyn SpecResolver>,
    writer: ArtifactWriter,
    policy: VersionPolicy,
    limiter: Option<Arc<Semaphore>>,
}

impl Harvester {
    pub fn new(
        resolver: Arc<dyn SpecResolver>,
        writer: ArtifactWriter,
        policy: VersionPolicy,
    ) -> Self {
        Self {
            resolver,
            writer,
            policy,
            limiter: None,
        }
    }

    /// Cap the number of resolutions in flight across all branches.
    ///
    /// Without this every branch issues requests as fast as it walks.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    pub fn policy(&self) -> &VersionPolicy {
        &self.policy
    }

    /// Spawn a task per branch and wait for all of them.
    ///
    /// Reports come back in branch order regardless of completion order.
    pub async fn run(&self, branches: Vec<ManifestNode>) -> Vec<BranchReport> {
        info!("harvesting {} branches", branches.len());

        let handles: Vec<_> = branches
            .into_iter()
            .map(|branch| {
                let title = branch.title.clone();
                let harvester = self.clone();
                let handle = tokio::spawn(async move { harvester.harvest_branch(branch).await });
                (title, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (title, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("branch {title} aborted: {e}");
                    let mut report = BranchReport::new(title);
                    report.aborted = Some(e.to_string());
                    reports.push(report);
                }
            }
        }
        reports
    }

    /// Walk one branch and process its leaves sequentially.
    pub async fn harvest_branch(&self, branch: ManifestNode) -> BranchReport {
        let leaves = walker::walk(&branch, &self.policy);
        info!("branch {}: {} leaves", branch.title, leaves.len());

        let mut report = BranchReport::new(branch.title);
        for leaf in leaves {
            let outcome = match self.process_leaf(&leaf).await {
                Ok(artifact) => LeafOutcome::written(leaf.href, artifact.path),
                Err(e) => {
                    warn!("skipping {} ({}): {e}", leaf.href, leaf.trail_display());
                    LeafOutcome::skipped(leaf.href, e)
                }
            };
            report.leaves.push(outcome);
        }

        let written = report.leaves.iter().filter(|l| l.is_written()).count();
        info!(
            "branch {} done: {written} written, {} skipped",
            report.title,
            report.leaves.len() - written
        );
        report
    }

    async fn process_leaf(&self, leaf: &Leaf) -> HarvestResult<Artifact> {
        let spec = {
            let _permit = match &self.limiter {
                Some(limiter) => Some(
                    limiter
                        .acquire()
                        .await
                        .map_err(|e| HarvestError::resolution(&leaf.href, e))?,
                ),
                None => None,
            };
            self.resolver.resolve(&leaf.href).await?
        };

        if spec.content.trim().is_empty() {
            return Err(HarvestError::resolution(
                &leaf.href,
                "resolver returned an empty document",
            ));
        }
        if spec.source_url.is_empty() {
            return Err(HarvestError::resolution(
                &leaf.href,
                "resolver returned an empty url",
            ));
        }

        self.writer.write(&spec).await
    }
}
