//! Route compilation: affordance targets -> lookup tables keyed by path.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::ArtifactDescription;
use crate::schema::{ParameterSpec, SchemaKind};

/// Property read route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRoute {
    pub artifact_uri: String,
    pub property: String,
    pub output_kind: SchemaKind,
}

/// Action invocation route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRoute {
    pub artifact_uri: String,
    pub action: String,
    pub parameters: Vec<ParameterSpec>,
}

/// Path -> descriptor tables. Built at load time, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    properties: HashMap<String, PropertyRoute>,
    actions: HashMap<String, ActionRoute>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every affordance of `artifact`. Returns the number of
    /// routes inserted.
    ///
    /// A path registered twice keeps the later descriptor.
    pub fn compile_artifact(&mut self, artifact: &ArtifactDescription, base_url: &str) -> usize {
        let mut inserted = 0;
        for prop in &artifact.properties {
            let Some(target) = &prop.target else {
                tracing::warn!(
                    artifact = %artifact.uri,
                    property = %prop.name,
                    "property affordance has no target, skipping"
                );
                continue;
            };
            let path = strip_base(target, base_url);
            let route = PropertyRoute {
                artifact_uri: artifact.uri.clone(),
                property: prop.name.clone(),
                output_kind: prop.output_kind(),
            };
            if let Some(previous) = self.properties.insert(path.clone(), route) {
                tracing::warn!(
                    path = %path,
                    replaced = %previous.artifact_uri,
                    "duplicate property route, later affordance wins"
                );
            }
            inserted += 1;
        }

        for action in &artifact.actions {
            let Some(target) = &action.target else {
                tracing::warn!(
                    artifact = %artifact.uri,
                    action = %action.name,
                    "action affordance has no target, skipping"
                );
                continue;
            };
            let path = strip_base(target, base_url);
            let route = ActionRoute {
                artifact_uri: artifact.uri.clone(),
                action: action.name.clone(),
                parameters: action.parameters().to_vec(),
            };
            if let Some(previous) = self.actions.insert(path.clone(), route) {
                tracing::warn!(
                    path = %path,
                    replaced = %previous.artifact_uri,
                    "duplicate action route, later affordance wins"
                );
            }
            inserted += 1;
        }
        inserted
    }

    pub fn property(&self, path: &str) -> Option<&PropertyRoute> {
        self.properties.get(path)
    }

    pub fn action(&self, path: &str) -> Option<&ActionRoute> {
        self.actions.get(path)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn property_routes(&self) -> impl Iterator<Item = (&str, &PropertyRoute)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn action_routes(&self) -> impl Iterator<Item = (&str, &ActionRoute)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Path part of `url` relative to the deployment base. URLs outside the
/// base are kept as-is.
pub fn strip_base(url: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match url.strip_prefix(base) {
        Some(rest) if rest.is_empty() => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => url.to_string(),
    }
}
