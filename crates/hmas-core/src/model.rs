//! Typed views over the affordance graph: artifacts, their property and
//! action affordances, and workspace containment.

use serde::Serialize;

use crate::graph::{vocab, Graph, Node};
use crate::schema::{parse_schema, Constraint, ParameterSpec, SchemaKind};

/// Readable property of an artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyAffordance {
    pub name: String,
    pub target: Option<String>,
    /// Declared output schema, if any
    pub output: Option<Constraint>,
}

impl PropertyAffordance {
    /// Output kind used to shape property reads. Absent schemas read as objects.
    pub fn output_kind(&self) -> SchemaKind {
        self.output
            .as_ref()
            .map(|c| c.kind)
            .unwrap_or(SchemaKind::Object)
    }
}

/// Invocable action of an artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionAffordance {
    pub name: String,
    pub target: Option<String>,
    pub input: Option<Constraint>,
}

impl ActionAffordance {
    pub fn parameters(&self) -> &[ParameterSpec] {
        self.input
            .as_ref()
            .map(|c| c.properties.as_slice())
            .unwrap_or(&[])
    }
}

/// Artifact as declared in a TD document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactDescription {
    pub uri: String,
    /// Local names of the `ex:` types in document order, e.g. `["Light"]`
    pub type_tags: Vec<String>,
    pub title: Option<String>,
    pub workspace: Option<String>,
    pub properties: Vec<PropertyAffordance>,
    pub actions: Vec<ActionAffordance>,
}

impl ArtifactDescription {
    pub fn from_graph(graph: &Graph, uri: &str) -> Self {
        let node = Node::iri(uri);
        let type_tags = graph
            .types(&node)
            .filter_map(|t| t.strip_prefix(vocab::EX))
            .map(str::to_string)
            .collect();

        let properties = graph
            .objects(&node, vocab::TD_HAS_PROPERTY_AFFORDANCE)
            .filter_map(|aff| {
                let Some(name) = affordance_name(graph, aff) else {
                    tracing::warn!(artifact = %uri, "skipping unnamed property affordance");
                    return None;
                };
                Some(PropertyAffordance {
                    target: form_target(graph, aff),
                    output: graph
                        .object(aff, vocab::TD_HAS_OUTPUT_SCHEMA)
                        .map(|s| parse_schema(graph, s)),
                    name,
                })
            })
            .collect();

        let actions = graph
            .objects(&node, vocab::TD_HAS_ACTION_AFFORDANCE)
            .filter_map(|aff| {
                let Some(name) = affordance_name(graph, aff) else {
                    tracing::warn!(artifact = %uri, "skipping unnamed action affordance");
                    return None;
                };
                Some(ActionAffordance {
                    target: form_target(graph, aff),
                    input: graph
                        .object(aff, vocab::TD_HAS_INPUT_SCHEMA)
                        .map(|s| parse_schema(graph, s)),
                    name,
                })
            })
            .collect();

        Self {
            uri: uri.to_string(),
            type_tags,
            title: graph.literal(&node, vocab::TD_TITLE).map(str::to_string),
            workspace: graph
                .object(&node, vocab::HMAS_IS_CONTAINED_IN)
                .and_then(Node::as_iri)
                .map(str::to_string),
            properties,
            actions,
        }
    }

    /// Names of all declared actions
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.name.as_str())
    }

    pub fn property(&self, name: &str) -> Option<&PropertyAffordance> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn action(&self, name: &str) -> Option<&ActionAffordance> {
        self.actions.iter().find(|a| a.name == name)
    }
}

/// `td:name`, falling back to `td:title`.
pub fn affordance_name(graph: &Graph, affordance: &Node) -> Option<String> {
    graph
        .literal(affordance, vocab::TD_NAME)
        .or_else(|| graph.literal(affordance, vocab::TD_TITLE))
        .map(str::to_string)
}

/// Target of the first form carrying one.
pub fn form_target(graph: &Graph, affordance: &Node) -> Option<String> {
    graph
        .objects(affordance, vocab::TD_HAS_FORM)
        .find_map(|form| match graph.object(form, vocab::HCTL_HAS_TARGET)? {
            Node::Iri(iri) => Some(iri.clone()),
            Node::Literal(lit) => Some(lit.lexical.clone()),
            Node::Blank(_) => None,
        })
}

pub fn is_workspace(graph: &Graph, uri: &str) -> bool {
    graph.has_type(&Node::iri(uri), vocab::HMAS_WORKSPACE)
}

/// Artifacts are typed `hmas:Artifact` or carry `td:` affordances.
pub fn is_artifact(graph: &Graph, uri: &str) -> bool {
    let node = Node::iri(uri);
    graph.has_type(&node, vocab::HMAS_ARTIFACT)
        || graph.object(&node, vocab::TD_HAS_PROPERTY_AFFORDANCE).is_some()
        || graph.object(&node, vocab::TD_HAS_ACTION_AFFORDANCE).is_some()
}

/// URIs listed under `hmas:contains`.
pub fn contained(graph: &Graph, workspace: &str) -> Vec<String> {
    graph
        .objects(&Node::iri(workspace), vocab::HMAS_CONTAINS)
        .filter_map(Node::as_iri)
        .map(str::to_string)
        .collect()
}
