// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! tocharvest: mirror a remote table-of-contents catalog to disk.
//!
//! The catalog manifest is fetched and cut down to its resource section,
//! each top-level branch is walked in its own task, and every leaf page is
//! resolved to its embedded document and written under a directory tree
//! that mirrors the page URL.

pub mod config;
pub mod harvest;
pub mod http_client;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod types;
pub mod walker;
pub mod writer;

pub use config::HarvestConfig;
pub use harvest::Harvester;
pub use http_client::HttpClient;
pub use manifest::{ManifestStore, NormalizedManifest};
pub use pipeline::{harvest, harvest_stored};
pub use report::{BranchReport, HarvestReport, LeafOutcome};
pub use resolver::{HttpSpecResolver, SpecResolver};
pub use types::*;
pub use walker::{Leaf, VersionPolicy};
pub use writer::ArtifactWriter;
