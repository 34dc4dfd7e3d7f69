// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration loading and resolution.
//!
//! Every setting has a fixed default pointing at the public Azure template
//! catalog. `TOCHARVEST_*` environment variables override the defaults and
//! command-line flags override both.

use std::path::PathBuf;

use crate::types::{HarvestError, HarvestResult};

/// Remote location of the table of contents.
pub const DEFAULT_MANIFEST_URL: &str = "https://docs.microsoft.com/en-us/azure/templates/toc.json";

/// Base every leaf href is joined against.
pub const DEFAULT_BASE_URL: &str = "https://docs.microsoft.com/en-us/azure/templates/";

/// Root directory of the mirrored artifact tree.
pub const DEFAULT_OUTPUT_DIR: &str = "azure_templates";

/// Where the normalized manifest is stored.
pub const DEFAULT_MANIFEST_PATH: &str = "toc.json";

/// Extension appended to every artifact file name.
pub const DEFAULT_EXTENSION: &str = "json";

/// Element holding the embedded document on each page.
pub const DEFAULT_CODE_SELECTOR: &str = "code.lang-json";

/// Index of the catalog section among the manifest's top-level items.
pub const DEFAULT_SECTION_INDEX: usize = 1;

/// Number of most recent versions visited per version list.
pub const DEFAULT_KEEP_VERSIONS: usize = 2;

/// Per-request HTTP timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const ENV_PREFIX: &str = "TOCHARVEST_";

/// Settings for one harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub manifest_url: String,
    pub base_url: String,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub extension: String,
    pub code_selector: String,
    pub section_index: usize,
    /// Versions kept per version list; zero keeps all of them.
    pub keep_versions: usize,
    /// Upper bound on concurrent page resolutions. `None` is unbounded.
    pub max_in_flight: Option<usize>,
    pub timeout_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            extension: DEFAULT_EXTENSION.to_string(),
            code_selector: DEFAULT_CODE_SELECTOR.to_string(),
            section_index: DEFAULT_SECTION_INDEX,
            keep_versions: DEFAULT_KEEP_VERSIONS,
            max_in_flight: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl HarvestConfig {
    /// Defaults overlaid with `TOCHARVEST_*` environment variables.
    pub fn from_env() -> HarvestResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed by full variable name.
    pub fn from_lookup<F>(lookup: F) -> HarvestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(v) = var("MANIFEST_URL") {
            config.manifest_url = v;
        }
        if let Some(v) = var("BASE_URL") {
            config.base_url = v;
        }
        if let Some(v) = var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(v);
        }
        if let Some(v) = var("MANIFEST_PATH") {
            config.manifest_path = PathBuf::from(v);
        }
        if let Some(v) = var("KEEP_VERSIONS") {
            config.keep_versions = parse_number("KEEP_VERSIONS", &v)?;
        }
        if let Some(v) = var("MAX_IN_FLIGHT") {
            config.max_in_flight = Some(parse_number("MAX_IN_FLIGHT", &v)?);
        }
        if let Some(v) = var("TIMEOUT_MS") {
            config.timeout_ms = parse_number("TIMEOUT_MS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the settings that cannot be fixed up later.
    pub fn validate(&self) -> HarvestResult<()> {
        let urls = [
            ("manifest_url", &self.manifest_url),
            ("base_url", &self.base_url),
        ];
        for (name, value) in urls {
            url::Url::parse(value)
                .map_err(|e| HarvestError::Config(format!("{name} {value:?}: {e}")))?;
        }
        if !self.base_url.ends_with('/') {
            return Err(HarvestError::Config(format!(
                "base_url {:?} must end with '/'",
                self.base_url
            )));
        }
        if self.max_in_flight == Some(0) {
            return Err(HarvestError::Config(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.extension.is_empty() || self.extension.contains(['/', '\\']) {
            return Err(HarvestError::Config(format!(
                "invalid extension {:?}",
                self.extension
            )));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> HarvestResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| HarvestError::Config(format!("{ENV_PREFIX}{name}={value:?}: {e}")))
}
