//! Simulator context: owns the route tables, the device store and the
//! workspace structure of every loaded root, and implements property reads,
//! action dispatch, reset and goal checks on top of them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::device::{Device, DeviceKindRegistry, GoalStatus};
use crate::error::{DispatchError, LoadError};
use crate::graph::{vocab, Graph, Node};
use crate::model::{is_workspace, ArtifactDescription};
use crate::naming::camel_to_snake;
use crate::routes::RouteTable;
use crate::schema::SchemaKind;
use crate::store::{DeviceStore, StoreError};
use crate::validate::validate;
use crate::value::{PropertyMap, PropertyValue};

/// Successful action response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub status: String,
    pub message: String,
}

impl ActionOutcome {
    fn success(action: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: format!("Action '{}' executed successfully", action),
        }
    }
}

/// Workspace known to the simulator
#[derive(Debug, Clone, Default)]
pub(crate) struct WorkspaceEntry {
    pub title: Option<String>,
    pub contains: BTreeSet<String>,
}

/// One loaded root (a home, or the blocksworld)
#[derive(Debug, Clone, Default)]
pub(crate) struct RootEntry {
    pub workspaces: Vec<String>,
    pub artifacts: Vec<String>,
}

/// Result of a GET on the simulator's path space
#[derive(Debug, Clone)]
pub enum Resource {
    /// JSON body (property value or goal report)
    Json(Value),
    /// Turtle discovery document
    Turtle(String),
}

pub struct Simulator {
    pub(crate) base_url: String,
    pub(crate) routes: RouteTable,
    pub(crate) store: DeviceStore,
    pub(crate) roots: BTreeMap<String, RootEntry>,
    pub(crate) workspaces: BTreeMap<String, WorkspaceEntry>,
    pub(crate) artifact_graphs: HashMap<String, Graph>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("base_url", &self.base_url)
            .field("roots", &self.roots.keys().collect::<Vec<_>>())
            .field("devices", &self.store.len())
            .field("property_routes", &self.routes.property_count())
            .field("action_routes", &self.routes.action_count())
            .finish()
    }
}

impl Simulator {
    pub fn builder(base_url: impl Into<String>, kinds: DeviceKindRegistry) -> SimulatorBuilder {
        SimulatorBuilder::new(base_url, kinds)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn store(&self) -> &DeviceStore {
        &self.store
    }

    pub fn root_ids(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(|k| k.as_str())
    }

    /// Read the property routed at `path`.
    ///
    /// Object-kind properties come back wrapped as `{"value": v}`, every other
    /// kind bare.
    pub fn read_property(&self, path: &str) -> Result<Value, DispatchError> {
        let route = self
            .routes
            .property(path)
            .ok_or_else(|| DispatchError::RouteNotFound(format!("Property endpoint not found: {}", path)))?;
        let (value, whole_state) = self
            .store
            .read(&route.artifact_uri, |device| {
                (
                    device.read(&route.property),
                    device.reads_whole_state(&route.property),
                )
            })
            .map_err(|e| divergence(&route.artifact_uri, e))?;
        let value = Value::from(
            value.ok_or_else(|| DispatchError::PropertyNotFound(route.property.clone()))?,
        );

        Ok(match route.output_kind {
            SchemaKind::Object if !whole_state => serde_json::json!({ "value": value }),
            _ => value,
        })
    }

    /// Validate and run the action routed at `path`.
    pub fn dispatch(&self, path: &str, payload: &Value) -> Result<ActionOutcome, DispatchError> {
        let route = self
            .routes
            .action(path)
            .ok_or_else(|| DispatchError::RouteNotFound(format!("Action endpoint not found: {}", path)))?;
        let payload = payload_map(payload)?;

        let result = self
            .store
            .write(&route.artifact_uri, |device| {
                if !device.is_enabled(&route.action) {
                    return Err(DispatchError::ActionNotAvailable(route.action.clone()));
                }
                let params = validate(&route.parameters, &payload)?;
                device.apply(&route.action, &params)
            })
            .map_err(|e| divergence(&route.artifact_uri, e))?;

        match &result {
            Ok(()) => tracing::debug!(
                artifact = %route.artifact_uri,
                action = %route.action,
                "action dispatched"
            ),
            Err(err) => tracing::debug!(
                artifact = %route.artifact_uri,
                action = %route.action,
                code = err.code().as_str(),
                error = %err,
                "action rejected"
            ),
        }
        result.map(|()| ActionOutcome::success(&route.action))
    }

    /// Restore every device of `root_id` to its load-time snapshot. Returns
    /// the number of devices reset.
    pub fn reset(&self, root_id: &str) -> Result<usize, DispatchError> {
        let root = self
            .roots
            .get(root_id)
            .ok_or_else(|| DispatchError::NotFound(format!("Home not found: {}", root_id)))?;
        let mut count = 0;
        for uri in &root.artifacts {
            self.store
                .write(uri, Device::reset)
                .map_err(|e| divergence(uri, e))?;
            count += 1;
        }
        tracing::info!(root = %root_id, devices_reset = count, "reset to initial state");
        Ok(count)
    }

    /// Goal report for the artifact whose URI is `artifact_uri`.
    pub fn goal_status(&self, artifact_uri: &str) -> Result<GoalStatus, DispatchError> {
        self.store
            .read(artifact_uri, Device::goal_status)
            .map_err(|_| DispatchError::NotFound(format!("Artifact not found: {}", artifact_uri)))?
            .ok_or_else(|| {
                DispatchError::NotFound(format!("No goal state defined for artifact: {}", artifact_uri))
            })
    }

    /// Resolve a GET on `path`: property route, discovery document or goal
    /// report, in that order.
    pub fn get(&self, path: &str) -> Result<Resource, DispatchError> {
        if self.routes.property(path).is_some() {
            return self.read_property(path).map(Resource::Json);
        }
        if let Some(doc) = self.discovery_document(path) {
            return Ok(Resource::Turtle(doc));
        }
        if let Some(artifact_path) = path.strip_suffix("/goal") {
            let uri = self.artifact_uri_for(artifact_path);
            if self.store.contains(&uri) {
                let status = self.goal_status(&uri)?;
                let body = serde_json::to_value(status)
                    .map_err(|e| DispatchError::InternalError(e.to_string()))?;
                return Ok(Resource::Json(body));
            }
        }
        Err(DispatchError::RouteNotFound(format!("Resource not found: {}", path)))
    }

    pub(crate) fn artifact_uri_for(&self, path: &str) -> String {
        format!("{}{}#artifact", self.base_url, path)
    }

    pub(crate) fn workspace_uri_for(&self, path: &str) -> String {
        format!("{}{}#workspace", self.base_url, path)
    }
}

fn payload_map(payload: &Value) -> Result<PropertyMap, DispatchError> {
    match PropertyValue::from(payload.clone()) {
        PropertyValue::Object(map) => Ok(map),
        PropertyValue::Null => Ok(PropertyMap::new()),
        other => Err(DispatchError::InvalidRequest(format!(
            "Request body must be a JSON object, got {}",
            other.type_name()
        ))),
    }
}

fn divergence(artifact_uri: &str, err: StoreError) -> DispatchError {
    tracing::error!(artifact = %artifact_uri, error = %err, "route table and device store diverged");
    DispatchError::InternalError(format!("Device not found for artifact: {}", artifact_uri))
}

/// Builds a [`Simulator`] root by root.
pub struct SimulatorBuilder {
    base_url: String,
    kinds: DeviceKindRegistry,
    strict_handlers: bool,
    routes: RouteTable,
    store: DeviceStore,
    roots: BTreeMap<String, RootEntry>,
    workspaces: BTreeMap<String, WorkspaceEntry>,
    artifact_graphs: HashMap<String, Graph>,
}

impl SimulatorBuilder {
    pub fn new(base_url: impl Into<String>, kinds: DeviceKindRegistry) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            kinds,
            strict_handlers: true,
            routes: RouteTable::new(),
            store: DeviceStore::new(),
            roots: BTreeMap::new(),
            workspaces: BTreeMap::new(),
            artifact_graphs: HashMap::new(),
        }
    }

    /// When set (the default), an enabled action with no handler in its
    /// device kind fails the load. Otherwise it is logged and answers 500
    /// when invoked.
    pub fn strict_handlers(mut self, strict: bool) -> Self {
        self.strict_handlers = strict;
        self
    }

    /// Load one root from its TD graph, per-artifact initial states and
    /// optional goals. Returns the number of devices created.
    pub fn add_root(
        &mut self,
        root_id: &str,
        graph: &Graph,
        states: &HashMap<String, PropertyMap>,
        goals: &HashMap<String, PropertyMap>,
    ) -> Result<usize, LoadError> {
        let mut root = RootEntry::default();
        let workspace_type = Node::iri(vocab::HMAS_WORKSPACE);

        let mut nested = BTreeSet::new();
        for ws in graph.subjects_with(vocab::RDF_TYPE, &workspace_type) {
            let Some(uri) = ws.as_iri() else { continue };
            let entry = self.workspaces.entry(uri.to_string()).or_default();
            if let Some(title) = graph.literal(ws, vocab::TD_TITLE) {
                entry.title = Some(title.to_string());
            }
            for child in graph.objects(ws, vocab::HMAS_CONTAINS).filter_map(Node::as_iri) {
                entry.contains.insert(child.to_string());
                if is_workspace(graph, child) {
                    nested.insert(child.to_string());
                }
            }
            if graph.object(ws, vocab::HMAS_IS_CONTAINED_IN).is_some() {
                nested.insert(uri.to_string());
            }
            root.workspaces.push(uri.to_string());
        }
        root.workspaces.retain(|ws| !nested.contains(ws));

        let mut created = 0;
        for uri in artifact_uris(graph) {
            let description = ArtifactDescription::from_graph(graph, &uri);
            let Some(kind) = description
                .type_tags
                .iter()
                .find_map(|tag| self.kinds.get(tag))
            else {
                tracing::warn!(
                    artifact = %uri,
                    type_tags = ?description.type_tags,
                    "no device kind registered for artifact, skipping"
                );
                continue;
            };

            let enabled: BTreeSet<String> = description.action_names().map(str::to_string).collect();
            let snapshot = states.get(&uri).cloned().unwrap_or_default();
            let (device, unmapped) = Device::new(uri.clone(), kind.clone(), snapshot, enabled);
            if let Some(action) = unmapped.first() {
                if self.strict_handlers {
                    return Err(LoadError::MissingHandler {
                        kind: kind.name().to_string(),
                        action: action.clone(),
                        artifact: uri,
                    });
                }
                tracing::warn!(
                    artifact = %uri,
                    kind = %kind.name(),
                    actions = ?unmapped,
                    handler = %camel_to_snake(action),
                    "actions without handlers will fail when invoked"
                );
            }

            if let Some(ws) = &description.workspace {
                self.workspaces
                    .entry(ws.clone())
                    .or_default()
                    .contains
                    .insert(uri.clone());
            }

            self.routes.compile_artifact(&description, &self.base_url);
            self.artifact_graphs.insert(
                uri.clone(),
                graph.extract_subgraph(&Node::iri(uri.as_str()), &[vocab::HMAS_CONTAINS]),
            );
            if !self.store.insert(device.with_goal(goals.get(&uri).cloned())) {
                tracing::warn!(artifact = %uri, "artifact loaded twice, later definition wins");
            }
            root.artifacts.push(uri);
            created += 1;
        }

        tracing::info!(
            root = %root_id,
            devices = created,
            workspaces = root.workspaces.len(),
            "root loaded"
        );
        self.roots.insert(root_id.to_string(), root);
        Ok(created)
    }

    pub fn build(self) -> Simulator {
        tracing::info!(
            devices = self.store.len(),
            property_routes = self.routes.property_count(),
            action_routes = self.routes.action_count(),
            "simulator ready"
        );
        Simulator {
            base_url: self.base_url,
            routes: self.routes,
            store: self.store,
            roots: self.roots,
            workspaces: self.workspaces,
            artifact_graphs: self.artifact_graphs,
        }
    }
}

/// Artifacts of a graph: `hmas:Artifact` typed nodes and non-workspace
/// nodes placed in a workspace, in document order.
fn artifact_uris(graph: &Graph) -> Vec<String> {
    let artifact_type = Node::iri(vocab::HMAS_ARTIFACT);
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let typed = graph
        .subjects_with(vocab::RDF_TYPE, &artifact_type)
        .cloned()
        .collect::<Vec<_>>();
    let placed = graph
        .subjects_having(vocab::HMAS_IS_CONTAINED_IN)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    for node in typed.into_iter().chain(placed) {
        let Some(uri) = node.as_iri() else { continue };
        if is_workspace(graph, uri) || !seen.insert(uri.to_string()) {
            continue;
        }
        out.push(uri.to_string());
    }
    out
}
