// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Outcome of a harvest run, one entry per visited leaf.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to a single leaf.
#[derive(Debug, Clone, Serialize)]
pub struct LeafOutcome {
    pub href: String,
    /// Written artifact, when the leaf succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Why the leaf was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LeafOutcome {
    pub fn written(href: impl Into<String>, path: PathBuf) -> Self {
        Self {
            href: href.into(),
            path: Some(path),
            error: None,
        }
    }

    pub fn skipped(href: impl Into<String>, error: impl ToString) -> Self {
        Self {
            href: href.into(),
            path: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_written(&self) -> bool {
        self.path.is_some()
    }
}

/// Outcomes of one top-level branch, in manifest order.
#[derive(Debug, Clone, Serialize)]
pub struct BranchReport {
    pub title: String,
    pub leaves: Vec<LeafOutcome>,
    /// Set when the branch task died before finishing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl BranchReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            leaves: Vec::new(),
            aborted: None,
        }
    }
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
    pub branches: Vec<BranchReport>,
}

impl HarvestReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            duration_ms: 0,
            manifest_path: None,
            branches: Vec::new(),
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafOutcome> {
        self.branches.iter().flat_map(|b| b.leaves.iter())
    }

    /// Number of artifacts written.
    pub fn written(&self) -> usize {
        self.leaves().filter(|l| l.is_written()).count()
    }

    /// Leaves that were skipped, with their causes.
    pub fn skipped(&self) -> Vec<&LeafOutcome> {
        self.leaves().filter(|l| !l.is_written()).collect()
    }

    pub fn failed_branches(&self) -> Vec<&BranchReport> {
        self.branches.iter().filter(|b| b.aborted.is_some()).collect()
    }
}
