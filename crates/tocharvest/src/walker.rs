// Copyright 2026 tocharvest contributors
// SPDX-License-Identifier: Apache-2.0

//! Depth-first traversal of the catalog tree.
//!
//! The catalog lists every API version of a resource type, newest first.
//! Only the first few versions are worth mirroring, so the walker trims the
//! version entries of any child list, at whatever depth it appears. A branch
//! root without recognisable versions is trimmed by position.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::ManifestNode;

/// Titles of container nodes whose children are API versions.
const VERSION_LIST_TITLES: &[&str] = &["versions", "api versions"];

fn api_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\d{4}-\d{2}-\d{2}(-(preview|privatepreview|beta|alpha))?$")
            .expect("api version pattern is valid")
    })
}

/// How many entries of a version list are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Number of leading versions kept. Zero keeps every version.
    pub keep: usize,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            keep: crate::config::DEFAULT_KEEP_VERSIONS,
        }
    }
}

impl VersionPolicy {
    pub fn new(keep: usize) -> Self {
        Self { keep }
    }

    /// A policy that never trims.
    pub fn unlimited() -> Self {
        Self { keep: 0 }
    }

    /// Whether `node` is a container named after the version axis.
    pub fn is_version_container(&self, node: &ManifestNode) -> bool {
        let title = node.title.trim().to_ascii_lowercase();
        VERSION_LIST_TITLES.contains(&title.as_str())
    }

    /// The children of `node` the walker descends into. `depth` is zero for
    /// the node the walk started from.
    ///
    /// A version container, or a walk root with no dated children, is cut to
    /// its first `keep` children. Elsewhere only children whose titles are
    /// API versions count against `keep`; the rest are always visited.
    pub fn children_to_visit<'a>(
        &self,
        node: &'a ManifestNode,
        depth: usize,
    ) -> Vec<&'a ManifestNode> {
        if self.keep == 0 {
            return node.children.iter().collect();
        }

        let dated = node.children.iter().any(|c| looks_like_version(&c.title));
        if self.is_version_container(node) || (depth == 0 && !dated) {
            return node.children.iter().take(self.keep).collect();
        }
        if !dated {
            return node.children.iter().collect();
        }

        let mut versions = 0;
        node.children
            .iter()
            .filter(|c| {
                if !looks_like_version(&c.title) {
                    return true;
                }
                versions += 1;
                versions <= self.keep
            })
            .collect()
    }
}

/// Whether a title reads like an API version (`2023-03-01`, `2021-06-01-preview`).
pub fn looks_like_version(title: &str) -> bool {
    api_version_pattern().is_match(title.trim())
}

/// A resolvable node found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub href: String,
    /// Titles from the walked root down to this node.
    pub trail: Vec<String>,
}

impl Leaf {
    pub fn trail_display(&self) -> String {
        self.trail.join(" > ")
    }
}

/// Visit every leaf under `root` in depth-first manifest order.
///
/// A node's own href is reported before any of its descendants.
pub fn walk_with<F>(root: &ManifestNode, policy: &VersionPolicy, mut visit: F)
where
    F: FnMut(Leaf),
{
    let mut trail = Vec::new();
    visit_node(root, policy, &mut trail, &mut visit);
}

/// Collect every leaf under `root` in depth-first manifest order.
pub fn walk(root: &ManifestNode, policy: &VersionPolicy) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    walk_with(root, policy, |leaf| leaves.push(leaf));
    leaves
}

fn visit_node<F>(
    node: &ManifestNode,
    policy: &VersionPolicy,
    trail: &mut Vec<String>,
    visit: &mut F,
) where
    F: FnMut(Leaf),
{
    trail.push(node.title.clone());

    if let Some(href) = node.resolvable_href() {
        visit(Leaf {
            href: href.to_string(),
            trail: trail.clone(),
        });
    }

    let depth = trail.len() - 1;
    for child in policy.children_to_visit(node, depth) {
        visit_node(child, policy, trail, visit);
    }

    trail.pop();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hrefs(leaves: &[Leaf]) -> Vec<&str> {
        leaves.iter().map(|l| l.href.as_str()).collect()
    }

    fn versions(dates: &[&str]) -> Vec<ManifestNode> {
        dates
            .iter()
            .map(|d| {
                ManifestNode::container(
                    *d,
                    vec![ManifestNode::leaf("virtualMachines", format!("compute/{d}/vm"))],
                )
            })
            .collect()
    }

    #[test]
    fn test_versions_container_keeps_first_two() {
        let root: ManifestNode = serde_json::from_str(
            r#"{"toc_title":"Root","children":[{"toc_title":"Versions","children":[{"href":"a/b"},{"href":"a/c"},{"href":"a/d"}]}]}"#,
        )
        .unwrap();

        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(hrefs(&leaves), vec!["a/b", "a/c"]);
    }

    #[test]
    fn test_dated_children_are_trimmed() {
        let root = ManifestNode::container(
            "Microsoft.Compute",
            versions(&["2023-03-01", "2022-11-01", "2022-08-01", "2021-07-01"]),
        );
        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(
            hrefs(&leaves),
            vec!["compute/2023-03-01/vm", "compute/2022-11-01/vm"]
        );
    }

    #[test]
    fn test_policy_applies_at_every_depth() {
        let inner = ManifestNode::container(
            "Extensions",
            versions(&["2024-01-01-preview", "2023-06-01", "2022-01-01"]),
        );
        let root = ManifestNode::container(
            "Provider",
            vec![ManifestNode::container(
                "Group",
                vec![ManifestNode::container("Nested", vec![inner])],
            )],
        );

        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(
            hrefs(&leaves),
            vec!["compute/2024-01-01-preview/vm", "compute/2023-06-01/vm"]
        );
    }

    #[test]
    fn test_non_version_lists_are_not_trimmed() {
        let version = ManifestNode::container(
            "2023-03-01",
            vec![
                ManifestNode::leaf("availabilitySets", "c/as"),
                ManifestNode::leaf("disks", "c/disks"),
                ManifestNode::leaf("virtualMachines", "c/vm"),
            ],
        );
        let root = ManifestNode::container("Microsoft.Compute", vec![version]);
        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(leaves.len(), 3);
    }

    #[test]
    fn test_mixed_list_trims_only_versions() {
        let mut children = vec![ManifestNode::leaf("Overview", "compute/overview")];
        children.extend(versions(&["2023-01-01", "2022-01-01", "2021-01-01"]));
        let root = ManifestNode::container(
            "Catalog",
            vec![ManifestNode::container("Microsoft.Compute", children)],
        );

        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(
            hrefs(&leaves),
            vec![
                "compute/overview",
                "compute/2023-01-01/vm",
                "compute/2022-01-01/vm"
            ]
        );
    }

    #[test]
    fn test_branch_root_without_dates_is_trimmed_by_position() {
        let root = ManifestNode::container(
            "Microsoft.Storage",
            vec![
                ManifestNode::container("v3", vec![ManifestNode::leaf("accounts", "s/v3/a")]),
                ManifestNode::container("v2", vec![ManifestNode::leaf("accounts", "s/v2/a")]),
                ManifestNode::container("v1", vec![ManifestNode::leaf("accounts", "s/v1/a")]),
            ],
        );

        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(hrefs(&leaves), vec!["s/v3/a", "s/v2/a"]);
        assert_eq!(walk(&root, &VersionPolicy::unlimited()).len(), 3);
    }

    #[test]
    fn test_href_and_children_are_both_followed() {
        let mut node = ManifestNode::leaf("virtualMachines", "c/vm");
        node.children = vec![
            ManifestNode::leaf("extensions", "c/vm/extensions"),
            ManifestNode::container("empty", Vec::new()),
        ];
        let root = ManifestNode::container("Root", vec![node]);

        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(hrefs(&leaves), vec!["c/vm", "c/vm/extensions"]);
    }

    #[test]
    fn test_dead_end_yields_nothing() {
        let root = ManifestNode::container("Root", vec![ManifestNode::default()]);
        assert!(walk(&root, &VersionPolicy::default()).is_empty());
    }

    #[test]
    fn test_unlimited_policy_keeps_all() {
        let root = ManifestNode::container(
            "Versions",
            versions(&["2023-01-01", "2022-01-01", "2021-01-01"]),
        );
        assert_eq!(walk(&root, &VersionPolicy::unlimited()).len(), 3);
    }

    #[test]
    fn test_trail_tracks_titles() {
        let root = ManifestNode::container(
            "Microsoft.Web",
            vec![ManifestNode::container(
                "2022-09-01",
                vec![ManifestNode::leaf("sites", "web/sites")],
            )],
        );
        let leaves = walk(&root, &VersionPolicy::default());
        assert_eq!(leaves[0].trail_display(), "Microsoft.Web > 2022-09-01 > sites");
    }

    #[test]
    fn test_version_detection() {
        assert!(looks_like_version("2023-03-01"));
        assert!(looks_like_version(" 2021-06-01-preview "));
        assert!(!looks_like_version("All resources"));
        assert!(!looks_like_version("2023-03"));
    }

    #[test]
    fn test_deep_tree_does_not_hit_depth_ceiling() {
        let mut node = ManifestNode::leaf("bottom", "deep/leaf");
        for depth in 0..64 {
            node = ManifestNode::container(format!("level-{depth}"), vec![node]);
        }
        assert_eq!(hrefs(&walk(&node, &VersionPolicy::default())), vec!["deep/leaf"]);
    }
}
