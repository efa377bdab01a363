//! Runtime devices and the device-kind registry.
//!
//! A device kind is data: a named table of action handlers keyed by their
//! `snake_case` identifier, plus optional read and goal hooks. Each
//! [`Device`] resolves its enabled actions against its kind once, when it is
//! created, so dispatch never looks handlers up by string at call time.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::error::DispatchError;
use crate::naming::camel_to_snake;
use crate::value::{PropertyMap, PropertyValue};

/// Validated action parameters
pub type Params = PropertyMap;

/// State-mutating action handler. Runs against a scratch copy of the state;
/// the copy is committed only if the handler returns `Ok`.
pub type ActionHandler = Arc<dyn Fn(&mut PropertyMap, &Params) -> Result<(), HandlerError> + Send + Sync>;

/// Partial-goal check: `(current, goal) -> reached`.
pub type GoalCheck = Arc<dyn Fn(&PropertyMap, &PropertyMap) -> bool + Send + Sync>;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Domain rule rejected the call
    #[error("{0}")]
    Precondition(String),
    /// Parameter the handler needs is absent or has the wrong shape
    #[error("Invalid parameters: {message}")]
    BadParameter { parameter: String, message: String },
}

/// Fetch a parameter.
pub fn param<'a>(params: &'a Params, name: &str) -> Result<&'a PropertyValue, HandlerError> {
    params
        .get(name)
        .ok_or_else(|| HandlerError::BadParameter {
            parameter: name.to_string(),
            message: format!("missing '{}'", name),
        })
}

/// Fetch a string parameter.
pub fn param_str<'a>(params: &'a Params, name: &str) -> Result<&'a str, HandlerError> {
    param(params, name)?
        .as_str()
        .ok_or_else(|| HandlerError::BadParameter {
            parameter: name.to_string(),
            message: format!("'{}' must be a string", name),
        })
}

/// Handler table for one kind of device
#[derive(Clone)]
pub struct DeviceKind {
    name: String,
    handlers: HashMap<String, ActionHandler>,
    whole_state_property: Option<String>,
    goal_check: Option<GoalCheck>,
}

impl std::fmt::Debug for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<&String> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("DeviceKind")
            .field("name", &self.name)
            .field("handlers", &handlers)
            .field("whole_state_property", &self.whole_state_property)
            .field("goal_check", &self.goal_check.is_some())
            .finish()
    }
}

impl DeviceKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
            whole_state_property: None,
            goal_check: None,
        }
    }

    /// Register a handler under its `snake_case` identifier.
    pub fn handler<F>(mut self, id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut PropertyMap, &Params) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(id.into(), Arc::new(f));
        self
    }

    /// Reads of `name` return the entire state map instead of one key.
    pub fn whole_state_property(mut self, name: impl Into<String>) -> Self {
        self.whole_state_property = Some(name.into());
        self
    }

    pub fn goal_check<F>(mut self, f: F) -> Self
    where
        F: Fn(&PropertyMap, &PropertyMap) -> bool + Send + Sync + 'static,
    {
        self.goal_check = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler for a TD action name (`turnOn` resolves `turn_on`).
    pub fn resolve(&self, action_name: &str) -> Option<ActionHandler> {
        self.handlers.get(&camel_to_snake(action_name)).cloned()
    }

    pub fn handler_ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|k| k.as_str())
    }
}

/// Registry of device kinds keyed by type tag
#[derive(Debug, Clone, Default)]
pub struct DeviceKindRegistry {
    kinds: HashMap<String, Arc<DeviceKind>>,
}

impl DeviceKindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: DeviceKind) {
        self.kinds.insert(kind.name().to_string(), Arc::new(kind));
    }

    pub fn get(&self, name: &str) -> Option<Arc<DeviceKind>> {
        self.kinds.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kinds.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Goal evaluation result
#[derive(Debug, Clone, Serialize)]
pub struct GoalStatus {
    pub artifact_uri: String,
    pub goal_reached: bool,
    pub current_state: PropertyMap,
    pub goal_state: PropertyMap,
}

/// One simulated artifact instance
#[derive(Clone)]
pub struct Device {
    artifact_uri: String,
    kind: Arc<DeviceKind>,
    state: PropertyMap,
    snapshot: PropertyMap,
    enabled_actions: BTreeSet<String>,
    handlers: HashMap<String, ActionHandler>,
    goal: Option<PropertyMap>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("artifact_uri", &self.artifact_uri)
            .field("kind", &self.kind.name())
            .field("state", &self.state)
            .field("enabled_actions", &self.enabled_actions)
            .finish()
    }
}

impl Device {
    /// Create a device. Returns the enabled actions the kind has no handler
    /// for alongside the device; those stay enabled but cannot be invoked.
    pub fn new(
        artifact_uri: impl Into<String>,
        kind: Arc<DeviceKind>,
        snapshot: PropertyMap,
        enabled_actions: BTreeSet<String>,
    ) -> (Self, Vec<String>) {
        let mut handlers = HashMap::new();
        let mut unmapped = Vec::new();
        for action in &enabled_actions {
            match kind.resolve(action) {
                Some(h) => {
                    handlers.insert(action.clone(), h);
                }
                None => unmapped.push(action.clone()),
            }
        }
        let device = Self {
            artifact_uri: artifact_uri.into(),
            kind,
            state: snapshot.clone(),
            snapshot,
            enabled_actions,
            handlers,
            goal: None,
        };
        (device, unmapped)
    }

    pub fn with_goal(mut self, goal: Option<PropertyMap>) -> Self {
        self.goal = goal;
        self
    }

    pub fn artifact_uri(&self) -> &str {
        &self.artifact_uri
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub fn state(&self) -> &PropertyMap {
        &self.state
    }

    pub fn enabled_actions(&self) -> &BTreeSet<String> {
        &self.enabled_actions
    }

    pub fn is_enabled(&self, action: &str) -> bool {
        self.enabled_actions.contains(action)
    }

    /// Withdraw an action from this instance without touching its kind.
    #[cfg(test)]
    pub(crate) fn disable_action(&mut self, action: &str) -> bool {
        self.enabled_actions.remove(action)
    }

    /// Re-enable a previously withdrawn action. Only actions the kind can
    /// handle are accepted.
    #[cfg(test)]
    pub(crate) fn enable_action(&mut self, action: &str) -> bool {
        match self.kind.resolve(action) {
            Some(handler) => {
                self.handlers.insert(action.to_string(), handler);
                self.enabled_actions.insert(action.to_string())
            }
            None => false,
        }
    }

    /// Whether reads of `name` return the whole state map.
    pub fn reads_whole_state(&self, name: &str) -> bool {
        self.kind.whole_state_property.as_deref() == Some(name)
    }

    /// Read one property. Never mutates.
    pub fn read(&self, name: &str) -> Option<PropertyValue> {
        if self.reads_whole_state(name) {
            return Some(PropertyValue::Object(self.state.clone()));
        }
        self.state.get(name).cloned()
    }

    /// Run `action` with already-validated parameters. The state is replaced
    /// only when the handler succeeds.
    pub fn apply(&mut self, action: &str, params: &Params) -> Result<(), DispatchError> {
        let handler = self.handlers.get(action).ok_or_else(|| {
            DispatchError::InternalError(format!(
                "Method '{}' not implemented for device kind {}",
                camel_to_snake(action),
                self.kind.name()
            ))
        })?;
        let mut scratch = self.state.clone();
        match handler(&mut scratch, params) {
            Ok(()) => {
                self.state = scratch;
                Ok(())
            }
            Err(HandlerError::Precondition(msg)) => Err(DispatchError::PreconditionViolation(msg)),
            Err(HandlerError::BadParameter { parameter, message }) => Err(DispatchError::InvalidType {
                parameter,
                message: format!("Invalid parameters: {}", message),
            }),
        }
    }

    /// Overwrite the state with the load-time snapshot.
    pub fn reset(&mut self) {
        self.state = self.snapshot.clone();
    }

    pub fn goal_status(&self) -> Option<GoalStatus> {
        let goal = self.goal.as_ref()?;
        let check = self.kind.goal_check.as_ref()?;
        Some(GoalStatus {
            artifact_uri: self.artifact_uri.clone(),
            goal_reached: check(&self.state, goal),
            current_state: self.state.clone(),
            goal_state: goal.clone(),
        })
    }
}
