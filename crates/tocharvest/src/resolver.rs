// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Leaf resolution: turn a catalog href into the document embedded in its page.
//!
//! `SpecResolver` is the seam between the traversal and the network. The
//! default [`HttpSpecResolver`] fetches the page over HTTP and pulls the text
//! of the last element matching a CSS selector (`code.lang-json` on the
//! Azure template reference).

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::http_client::HttpClient;
use crate::types::{HarvestError, HarvestResult, ResolvedSpec};

/// Resolves a relative catalog path to its embedded document.
#[async_trait]
pub trait SpecResolver: Send + Sync {
    /// Fetch the page behind `relative_path` and extract its document.
    async fn resolve(&self, relative_path: &str) -> HarvestResult<ResolvedSpec>;
}

/// Resolver that reads pages over HTTP.
pub struct HttpSpecResolver {
    client: HttpClient,
    base: Url,
    selector: String,
}

impl HttpSpecResolver {
    pub fn new(client: HttpClient, base_url: &str, selector: &str) -> HarvestResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| HarvestError::Config(format!("base_url {base_url:?}: {e}")))?;
        parse_selector(selector)?;
        Ok(Self {
            client,
            base,
            selector: selector.to_string(),
        })
    }

    /// Join `relative_path` onto the base. Absolute hrefs are refused so a
    /// stray link cannot pull a page from another site.
    pub fn page_url(&self, relative_path: &str) -> HarvestResult<Url> {
        if Url::parse(relative_path).is_ok() || relative_path.starts_with("//") {
            return Err(HarvestError::resolution(
                relative_path,
                "href is absolute, expected a path relative to the base",
            ));
        }
        let trimmed = relative_path.trim_start_matches('/');
        self.base
            .join(trimmed)
            .map_err(|e| HarvestError::resolution(relative_path, e))
    }
}

#[async_trait]
impl SpecResolver for HttpSpecResolver {
    async fn resolve(&self, relative_path: &str) -> HarvestResult<ResolvedSpec> {
        let url = self.page_url(relative_path)?;
        debug!("resolving {relative_path} via {url}");

        let resp = self
            .client
            .get(url.as_str())
            .await
            .map_err(|e| HarvestError::resolution(relative_path, e))?;
        if !resp.is_success() {
            return Err(HarvestError::resolution(
                relative_path,
                format!("HTTP status {} from {url}", resp.status),
            ));
        }

        let selector = parse_selector(&self.selector)?;
        let content = extract_document(&resp.text(), &selector).ok_or_else(|| {
            HarvestError::resolution(relative_path, "page has no embedded document")
        })?;

        Ok(ResolvedSpec {
            content,
            source_url: canonical_url(url),
        })
    }
}

fn parse_selector(source: &str) -> HarvestResult<Selector> {
    Selector::parse(source).map_err(|e| HarvestError::Config(format!("selector {source:?}: {e}")))
}

/// Text of the last element matching `selector`, if it is not blank.
///
/// Reference pages may carry several matching blocks; the last one in
/// document order is the document.
pub fn extract_document(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);
    let element = document.select(selector).last()?;
    let text: String = element.text().collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

// The document is identified by its path; view parameters don't change it.
fn canonical_url(mut url: Url) -> String {
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> HttpSpecResolver {
        HttpSpecResolver::new(
            HttpClient::new(1_000),
            "https://docs.example.com/en-us/azure/templates/",
            "code.lang-json",
        )
        .unwrap()
    }

    fn code_selector() -> Selector {
        Selector::parse("code.lang-json").unwrap()
    }

    #[test]
    fn test_extract_last_block() {
        let html = r#"<html><body>
            <pre><code class="lang-json">{"first": 1}</code></pre>
            <pre><code class="lang-bicep">resource x</code></pre>
            <pre><code class="lang-json">{
  "type": "Microsoft.Compute/virtualMachines",
  "apiVersion": "2023-03-01"
}</code></pre>
            <pre><code class="lang-bicep">resource y</code></pre>
        </body></html>"#;

        let doc = extract_document(html, &code_selector()).unwrap();
        assert!(doc.starts_with('{'));
        assert!(doc.contains("\"apiVersion\": \"2023-03-01\""));
        assert!(!doc.contains("first"));
        assert!(!doc.contains("resource"));
    }

    #[test]
    fn test_extract_decodes_entities() {
        let html = r#"<code class="lang-json">{"name": "&lt;string&gt;"}</code>"#;
        assert_eq!(
            extract_document(html, &code_selector()).unwrap(),
            r#"{"name": "<string>"}"#
        );
    }

    #[test]
    fn test_extract_missing_or_blank() {
        assert!(extract_document("<p>nothing here</p>", &code_selector()).is_none());
        assert!(extract_document(r#"<code class="lang-json">  </code>"#, &code_selector()).is_none());
    }

    #[test]
    fn test_page_url_joins_against_base() {
        let r = resolver();
        assert_eq!(
            r.page_url("microsoft.compute/2023-03-01/virtualmachines").unwrap().as_str(),
            "https://docs.example.com/en-us/azure/templates/microsoft.compute/2023-03-01/virtualmachines"
        );
        assert_eq!(
            r.page_url("/microsoft.web/sites").unwrap().as_str(),
            "https://docs.example.com/en-us/azure/templates/microsoft.web/sites"
        );
    }

    #[test]
    fn test_page_url_refuses_absolute_hrefs() {
        let r = resolver();
        assert!(r.page_url("https://evil.example/x").is_err());
        assert!(r.page_url("//evil.example/x").is_err());
    }

    #[test]
    fn test_canonical_url_drops_query_and_fragment() {
        let url = Url::parse("https://docs.example.com/t/a/b?pivots=arm#format").unwrap();
        assert_eq!(canonical_url(url), "https://docs.example.com/t/a/b");
    }

    #[test]
    fn test_bad_selector_is_config_error() {
        let err = HttpSpecResolver::new(HttpClient::new(1_000), "https://x.example/", "[[")
            .err()
            .unwrap();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
