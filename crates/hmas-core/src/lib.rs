//! # HMAS Core
//!
//! Core model and deterministic logic for simulating Thing Description
//! driven devices.
//!
//! This crate contains:
//! - The affordance graph model and its Turtle codec
//! - The JSON-schema subset parser used by server and client
//! - Route compilation, parameter validation and action dispatch
//! - The per-artifact device store and the simulator context tying them together
//! - Discovery documents (platform / workspace / artifact)
//!
//! This crate does NOT care about:
//! - Which HTTP framework serves the routes
//! - Which concrete device kinds exist (see `hmas-devices`)
//! - Where TD documents and state snapshots are loaded from

pub mod device;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod model;
pub mod naming;
pub mod routes;
pub mod schema;
pub mod store;
pub mod validate;
pub mod value;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::device::{
        param, param_str, ActionHandler, Device, DeviceKind, DeviceKindRegistry, GoalStatus,
        HandlerError, Params,
    };
    pub use crate::dispatch::{ActionOutcome, Resource, Simulator, SimulatorBuilder};
    pub use crate::error::{DispatchError, ErrorCode, LoadError};
    pub use crate::graph::{vocab, Graph, GraphError, Literal, Node, Triple};
    pub use crate::model::{ActionAffordance, ArtifactDescription, PropertyAffordance};
    pub use crate::routes::{ActionRoute, PropertyRoute, RouteTable};
    pub use crate::schema::{parse_schema, Bound, Constraint, SchemaKind};
    pub use crate::store::DeviceStore;
    pub use crate::validate::{validate, ParameterSpec};
    pub use crate::value::{PropertyMap, PropertyValue};
}

// Re-export key types at crate root
pub use device::{Device, DeviceKind, DeviceKindRegistry, GoalStatus, HandlerError, Params};
pub use dispatch::{ActionOutcome, Resource, Simulator, SimulatorBuilder};
pub use error::{DispatchError, ErrorCode, LoadError};
pub use graph::{Graph, GraphError, Node};
pub use model::ArtifactDescription;
pub use routes::RouteTable;
pub use schema::{Constraint, SchemaKind};
pub use store::DeviceStore;
pub use value::{PropertyMap, PropertyValue};
