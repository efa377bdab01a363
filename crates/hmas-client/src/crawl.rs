//! Breadth-first discovery of every workspace and artifact reachable from a
//! root.
//!
//! The walk follows `hmas:contains` and `hmas:hosts` links (the latter also
//! through a platform's resource profile). A crawl-scoped visited set makes
//! cyclic containment terminate; `max_depth` and `max_nodes` bound the walk.

use std::collections::{BTreeSet, HashSet, VecDeque};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use hmas_config::CrawlConfig;
use hmas_core::graph::vocab::{self, strip_fragment};
use hmas_core::{Graph, Node};

use crate::client::HypermediaClient;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

impl From<&CrawlConfig> for CrawlLimits {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_nodes: config.max_nodes,
        }
    }
}

/// Everything a crawl discovered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub workspaces: BTreeSet<String>,
    pub artifacts: BTreeSet<String>,
    /// Whether a ceiling cut the walk short
    pub truncated: bool,
}

impl HypermediaClient {
    /// Crawl from `root` until every reachable node is visited, a ceiling is
    /// hit, or `cancel` fires. Only an unreachable root fails the crawl.
    pub async fn crawl(&self, root: &str, cancel: &CancellationToken) -> Result<CrawlReport, ClientError> {
        let limits = self.limits;
        let mut report = CrawlReport::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((root.to_string(), 0));
        visited.insert(strip_fragment(root).to_string());

        while let Some((uri, depth)) = queue.pop_front() {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(root = %root, visited = visited.len(), "crawl cancelled");
                    return Err(ClientError::Cancelled);
                }
                fetched = self.fetch_graph(&uri) => fetched,
            };

            let graph = match fetched {
                Ok(graph) => graph,
                Err(err) if depth == 0 => {
                    return Err(ClientError::RootUnreachable {
                        url: uri,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    tracing::debug!(uri = %uri, error = %err, "node unreachable, skipping");
                    continue;
                }
            };

            let node = Node::iri(uri.as_str());
            if graph.has_type(&node, vocab::HMAS_WORKSPACE) {
                report.workspaces.insert(uri.clone());
            } else if graph.has_type(&node, vocab::HMAS_ARTIFACT) {
                report.artifacts.insert(uri.clone());
            }

            let links = links_of(&graph, &node);
            if links.is_empty() {
                continue;
            }
            if depth >= limits.max_depth {
                tracing::debug!(uri = %uri, depth, "max crawl depth reached, not descending");
                report.truncated = true;
                continue;
            }
            for child in links {
                if visited.len() >= limits.max_nodes {
                    tracing::warn!(root = %root, max_nodes = limits.max_nodes, "crawl node ceiling reached");
                    report.truncated = true;
                    break;
                }
                if visited.insert(strip_fragment(&child).to_string()) {
                    queue.push_back((child, depth + 1));
                }
            }
        }

        tracing::info!(
            root = %root,
            workspaces = report.workspaces.len(),
            artifacts = report.artifacts.len(),
            truncated = report.truncated,
            "crawl finished"
        );
        Ok(report)
    }
}

/// Outgoing containment links of `node`, including the hosted workspaces of
/// a platform `node` is the profile of.
fn links_of(graph: &Graph, node: &Node) -> Vec<String> {
    let mut subjects = vec![node];
    subjects.extend(graph.objects(node, vocab::HMAS_IS_PROFILE_OF));

    let mut links = Vec::new();
    for subject in subjects {
        for predicate in [vocab::HMAS_CONTAINS, vocab::HMAS_HOSTS] {
            links.extend(
                graph
                    .objects(subject, predicate)
                    .filter_map(Node::as_iri)
                    .map(str::to_string),
            );
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryTransport, RetryPolicy};
    use std::sync::Arc;

    fn workspace(uri: &str, children: &[&str]) -> String {
        let mut doc = format!("<{}> a <{}>", uri, vocab::HMAS_WORKSPACE);
        for child in children {
            doc.push_str(&format!(" ; <{}> <{}>", vocab::HMAS_CONTAINS, child));
        }
        doc.push_str(" .\n");
        doc
    }

    fn artifact(uri: &str) -> String {
        format!("<{}> a <{}> .\n", uri, vocab::HMAS_ARTIFACT)
    }

    const PLATFORM: &str = r#"
@prefix hmas: <https://purl.org/hmas/> .
<http://h/> a hmas:ResourceProfile ; hmas:isProfileOf <http://h/#platform> .
<http://h/#platform> a hmas:HypermediaMASPlatform ; hmas:hosts <http://h/workspaces/home0#workspace> .
"#;

    const HOME: &str = "http://h/workspaces/home0#workspace";
    const ROOM: &str = "http://h/workspaces/home0/room#workspace";
    const LAMP: &str = "http://h/workspaces/home0/room/artifacts/lamp#artifact";
    const FAN: &str = "http://h/workspaces/home0/artifacts/fan#artifact";

    fn transport(home_children: &[&str]) -> MemoryTransport {
        MemoryTransport::new()
            .turtle("http://h/", PLATFORM)
            .turtle("http://h/workspaces/home0", workspace(HOME, home_children))
            // room points back at home: containment cycle
            .turtle("http://h/workspaces/home0/room", workspace(ROOM, &[LAMP, HOME]))
            .turtle("http://h/workspaces/home0/room/artifacts/lamp", artifact(LAMP))
            .turtle("http://h/workspaces/home0/artifacts/fan", artifact(FAN))
    }

    fn client(transport: MemoryTransport) -> HypermediaClient {
        HypermediaClient::new(Arc::new(transport)).with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_crawl_from_platform_terminates_on_cycle() {
        let report = client(transport(&[ROOM, FAN]))
            .crawl("http://h/", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            report.workspaces,
            [HOME, ROOM].into_iter().map(String::from).collect::<BTreeSet<_>>()
        );
        assert_eq!(
            report.artifacts,
            [LAMP, FAN].into_iter().map(String::from).collect::<BTreeSet<_>>()
        );
        assert!(!report.truncated);
    }

    #[tokio::test]
    async fn test_crawl_order_independent() {
        let token = CancellationToken::new();
        let a = client(transport(&[ROOM, FAN])).crawl(HOME, &token).await.unwrap();
        let b = client(transport(&[FAN, ROOM])).crawl(HOME, &token).await.unwrap();
        assert_eq!(a.artifacts, b.artifacts);
        assert_eq!(a.workspaces, b.workspaces);
    }

    #[tokio::test]
    async fn test_unreachable_child_is_skipped() {
        let transport = MemoryTransport::new()
            .turtle("http://h/workspaces/home0", workspace(HOME, &[ROOM, FAN]))
            .turtle("http://h/workspaces/home0/room", workspace(ROOM, &[LAMP]))
            .turtle("http://h/workspaces/home0/room/artifacts/lamp", artifact(LAMP));
        let report = client(transport).crawl(HOME, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.artifacts.len(), 1);
        assert!(report.artifacts.contains(LAMP));
    }

    #[tokio::test]
    async fn test_unreachable_root_fails() {
        let err = client(MemoryTransport::new())
            .crawl(HOME, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RootUnreachable { .. }));
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_cancelled_crawl() {
        let token = CancellationToken::new();
        token.cancel();
        let err = client(transport(&[ROOM])).crawl(HOME, &token).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[tokio::test]
    async fn test_depth_ceiling_truncates() {
        let report = client(transport(&[ROOM, FAN]))
            .with_limits(CrawlLimits {
                max_depth: 1,
                max_nodes: 100,
            })
            .crawl(HOME, &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.truncated);
        assert!(report.artifacts.contains(FAN));
        assert!(!report.artifacts.contains(LAMP));
    }

    #[tokio::test]
    async fn test_node_ceiling_truncates() {
        let report = client(transport(&[ROOM, FAN]))
            .with_limits(CrawlLimits {
                max_depth: 10,
                max_nodes: 2,
            })
            .crawl(HOME, &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.truncated);
        assert_eq!(report.workspaces.len() + report.artifacts.len(), 2);
    }
}
