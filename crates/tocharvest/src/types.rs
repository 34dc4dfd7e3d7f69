// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data types for the catalog tree, resolved documents and errors.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// A node in the table-of-contents tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestNode {
    #[serde(rename = "toc_title", default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<ManifestNode>,
}

// Upstream emits explicit nulls for some absent fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ManifestNode {
    /// Build a container node.
    pub fn container(title: impl Into<String>, children: Vec<ManifestNode>) -> Self {
        Self {
            title: title.into(),
            href: None,
            children,
        }
    }

    /// Build a leaf node.
    pub fn leaf(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: Some(href.into()),
            children: Vec::new(),
        }
    }

    /// The href, if present and not blank.
    pub fn resolvable_href(&self) -> Option<&str> {
        self.href
            .as_deref()
            .map(str::trim)
            .filter(|href| !href.is_empty())
    }

    /// Whether this node has children to recurse into.
    pub fn is_container(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The outcome of resolving one leaf against the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpec {
    /// Extracted document text.
    pub content: String,
    /// Absolute URL the document was taken from.
    pub source_url: String,
}

/// A persisted resolved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Errors that can occur while harvesting the catalog.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    /// The manifest could not be retrieved.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The manifest does not have the expected structure.
    #[error("Shape error: {0}")]
    Shape(String),

    /// A leaf's page was unreachable or had no embedded document.
    #[error("Resolution error for {href}: {reason}")]
    Resolution { href: String, reason: String },

    /// An artifact could not be written.
    #[error("Persist error for {target}: {reason}")]
    Persist { target: String, reason: String },

    #[error("Invalid config: {0}")]
    Config(String),
}

impl HarvestError {
    pub fn resolution(href: impl Into<String>, reason: impl ToString) -> Self {
        HarvestError::Resolution {
            href: href.into(),
            reason: reason.to_string(),
        }
    }

    pub fn persist(target: impl Into<String>, reason: impl ToString) -> Self {
        HarvestError::Persist {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error ends the whole run rather than a single leaf.
    pub fn is_fatal(&self) -> bool {
        match self {
            HarvestError::Fetch(_) | HarvestError::Shape(_) | HarvestError::Config(_) => true,
            HarvestError::Resolution { .. } | HarvestError::Persist { .. } => false,
        }
    }
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;
