//! Hypermedia client: fetches discovery documents, lists workspace children
//! and affordances, reads properties and invokes actions.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;

use hmas_config::HmasConfig;
use hmas_core::graph::vocab::{self, strip_fragment};
use hmas_core::model::contained;
use hmas_core::naming::camel_to_snake;
use hmas_core::{ArtifactDescription, Constraint, Graph, Node};

use crate::crawl::CrawlLimits;
use crate::error::{error_message, ClientError};
use crate::transport::{HttpResponse, HttpTransport, RetryPolicy, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AffordanceKind {
    Property,
    Action,
}

/// One affordance of an artifact with its resolved target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Affordance {
    pub kind: AffordanceKind,
    pub name: String,
    pub url: String,
    pub schema: Option<Constraint>,
}

/// Children of a workspace, classified by their declared type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Children {
    pub workspaces: Vec<String>,
    pub artifacts: Vec<String>,
}

enum Request<'a> {
    Get(&'a str),
    Post(&'a str, &'a Value),
}

impl Request<'_> {
    fn url(&self) -> &str {
        match self {
            Request::Get(url) | Request::Post(url, _) => url,
        }
    }

    fn is_idempotent(&self) -> bool {
        matches!(self, Request::Get(_))
    }
}

pub struct HypermediaClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    pub(crate) limits: CrawlLimits,
}

impl HypermediaClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            limits: CrawlLimits::default(),
        }
    }

    /// HTTP client configured from the `client` and `crawl` sections.
    pub fn from_config(config: &HmasConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config.client.timeout())?;
        Ok(Self::new(Arc::new(transport))
            .with_retry(RetryPolicy::from(&config.client))
            .with_limits(CrawlLimits::from(&config.crawl)))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_limits(mut self, limits: CrawlLimits) -> Self {
        self.limits = limits;
        self
    }

    async fn send(&self, request: Request<'_>) -> Result<HttpResponse, ClientError> {
        let url = request.url();
        let max_retries = if request.is_idempotent() || self.retry.retry_actions {
            self.retry.max_retries
        } else {
            0
        };
        let mut retries_used = 0u32;
        loop {
            let outcome = match &request {
                Request::Get(url) => self.transport.get(url).await,
                Request::Post(url, body) => self.transport.post_json(url, body).await,
            };

            let retryable = match &outcome {
                Ok(response) if response.is_success() => return outcome,
                Ok(response) => self.retry.should_retry(response.status),
                Err(ClientError::Transport { .. }) => true,
                Err(_) => false,
            };
            if !retryable || retries_used >= max_retries {
                return outcome.and_then(|response| {
                    if response.is_success() {
                        Ok(response)
                    } else {
                        Err(ClientError::Http {
                            status: response.status,
                            message: error_message(&response.body),
                            url: url.to_string(),
                        })
                    }
                });
            }

            let delay = self.retry.backoff(retries_used);
            retries_used += 1;
            tracing::warn!(
                url = %url,
                status = outcome.as_ref().ok().map(|r| r.status),
                retry_attempt = retries_used,
                retry_in_ms = delay.as_millis() as u64,
                "retrying request after transient failure"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Fetch and parse the Turtle document behind `uri` (fragment dropped).
    pub async fn fetch_graph(&self, uri: &str) -> Result<Graph, ClientError> {
        let url = strip_fragment(uri);
        let response = self.send(Request::Get(url)).await?;
        Graph::from_turtle(&response.body).map_err(|e| ClientError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Children of a workspace. Each child is fetched to learn its type;
    /// children that cannot be fetched are left out.
    pub async fn list_children(&self, workspace_uri: &str) -> Result<Children, ClientError> {
        let graph = self.fetch_graph(workspace_uri).await?;
        let uris = contained(&graph, workspace_uri);
        let fetched = join_all(uris.iter().map(|uri| self.fetch_graph(uri))).await;

        let mut children = Children::default();
        for (uri, result) in uris.into_iter().zip(fetched) {
            match result {
                Ok(child) => {
                    let node = Node::iri(uri.as_str());
                    if child.has_type(&node, vocab::HMAS_WORKSPACE) {
                        children.workspaces.push(uri);
                    } else if child.has_type(&node, vocab::HMAS_ARTIFACT) {
                        children.artifacts.push(uri);
                    }
                }
                Err(err) => {
                    tracing::debug!(child = %uri, error = %err, "child unreachable, skipping");
                }
            }
        }
        Ok(children)
    }

    pub async fn list_workspaces(&self, workspace_uri: &str) -> Result<Vec<String>, ClientError> {
        Ok(self.list_children(workspace_uri).await?.workspaces)
    }

    pub async fn list_artifacts(&self, workspace_uri: &str) -> Result<Vec<String>, ClientError> {
        Ok(self.list_children(workspace_uri).await?.artifacts)
    }

    pub async fn describe_artifact(&self, artifact_uri: &str) -> Result<ArtifactDescription, ClientError> {
        let graph = self.fetch_graph(artifact_uri).await?;
        Ok(ArtifactDescription::from_graph(&graph, artifact_uri))
    }

    /// `td:title` of an artifact.
    pub async fn artifact_title(&self, artifact_uri: &str) -> Result<Option<String>, ClientError> {
        Ok(self.describe_artifact(artifact_uri).await?.title)
    }

    pub async fn list_properties(&self, artifact_uri: &str) -> Result<Vec<Affordance>, ClientError> {
        let description = self.describe_artifact(artifact_uri).await?;
        Ok(property_affordances(&description))
    }

    pub async fn list_actions(&self, artifact_uri: &str) -> Result<Vec<Affordance>, ClientError> {
        let description = self.describe_artifact(artifact_uri).await?;
        Ok(action_affordances(&description))
    }

    /// Properties then actions, one entry per affordance with a target.
    pub async fn list_affordances(&self, artifact_uri: &str) -> Result<Vec<Affordance>, ClientError> {
        let description = self.describe_artifact(artifact_uri).await?;
        let mut out = property_affordances(&description);
        out.extend(action_affordances(&description));
        Ok(out)
    }

    /// GET a property URL. JSON bodies are decoded, anything else comes back
    /// as a string.
    pub async fn read_property(&self, url: &str) -> Result<Value, ClientError> {
        let response = self.send(Request::Get(url)).await?;
        Ok(decode_body(response.body))
    }

    /// Read a property addressed by artifact URI and affordance name.
    pub async fn read_property_by_name(&self, artifact_uri: &str, name: &str) -> Result<Value, ClientError> {
        self.read_property(&property_url(artifact_uri, name)).await
    }

    /// POST `payload` to an action URL.
    pub async fn invoke_action(&self, url: &str, payload: &Value) -> Result<Value, ClientError> {
        let response = self.send(Request::Post(url, payload)).await?;
        Ok(decode_body(response.body))
    }

    pub async fn invoke_action_by_name(
        &self,
        artifact_uri: &str,
        name: &str,
        payload: &Value,
    ) -> Result<Value, ClientError> {
        self.invoke_action(&action_url(artifact_uri, name), payload).await
    }
}

/// `<artifact>/properties/<snake_name>`
pub fn property_url(artifact_uri: &str, name: &str) -> String {
    format!("{}/properties/{}", strip_fragment(artifact_uri), camel_to_snake(name))
}

/// `<artifact>/<snake_name>`
pub fn action_url(artifact_uri: &str, name: &str) -> String {
    format!("{}/{}", strip_fragment(artifact_uri), camel_to_snake(name))
}

fn decode_body(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

fn property_affordances(description: &ArtifactDescription) -> Vec<Affordance> {
    description
        .properties
        .iter()
        .filter_map(|p| {
            Some(Affordance {
                kind: AffordanceKind::Property,
                name: p.name.clone(),
                url: p.target.clone()?,
                schema: p.output.clone(),
            })
        })
        .collect()
}

fn action_affordances(description: &ArtifactDescription) -> Vec<Affordance> {
    description
        .actions
        .iter()
        .filter_map(|a| {
            Some(Affordance {
                kind: AffordanceKind::Action,
                name: a.name.clone(),
                url: a.target.clone()?,
                schema: a.input.clone(),
            })
        })
        .collect()
}
