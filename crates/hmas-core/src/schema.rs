//! JSON-schema subset carried by TD affordances.
//!
//! Only the constraints TD documents actually use are modelled: primitive
//! kind, enum literals, numeric bounds, array item schema, object members
//! and their `required` markers. Unrecognised schema types degrade to an
//! unconstrained string so newer documents still load.

use serde::Serialize;

use crate::graph::{vocab, Graph, Node};

const MAX_SCHEMA_DEPTH: usize = 8;

/// Primitive kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    /// Maps a `js:*Schema` type IRI to a kind.
    pub fn from_type_iri(iri: &str) -> Option<Self> {
        if !iri.starts_with(vocab::JS) {
            return None;
        }
        match vocab::local_name(iri) {
            "StringSchema" => Some(SchemaKind::String),
            "IntegerSchema" => Some(SchemaKind::Integer),
            "NumberSchema" => Some(SchemaKind::Number),
            "BooleanSchema" => Some(SchemaKind::Boolean),
            "ArraySchema" => Some(SchemaKind::Array),
            "ObjectSchema" => Some(SchemaKind::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array => "array",
            SchemaKind::Object => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SchemaKind::Integer | SchemaKind::Number)
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric bound, typed after the declaring schema kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl Bound {
    fn parse(lexical: &str, kind: SchemaKind) -> Option<Self> {
        let lexical = lexical.trim();
        if kind != SchemaKind::Number {
            if let Ok(i) = lexical.parse::<i64>() {
                return Some(Bound::Int(i));
            }
        }
        lexical.parse::<f64>().ok().map(Bound::Float)
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Bound::Int(i) => *i as f64,
            Bound::Float(f) => *f,
        }
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Int(i) => write!(f, "{}", i),
            Bound::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Parsed constraint record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub kind: SchemaKind,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Constraint>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ParameterSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Default for Constraint {
    fn default() -> Self {
        Self::of_kind(SchemaKind::String)
    }
}

impl Constraint {
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            items: None,
            properties: Vec::new(),
            required: Vec::new(),
        }
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_range(mut self, minimum: Option<Bound>, maximum: Option<Bound>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn with_items(mut self, items: Constraint) -> Self {
        self.items = Some(Box::new(items));
        self
    }
}

/// A named member of an object schema (an action parameter)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    pub constraint: Constraint,
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            constraint,
            required: true,
        }
    }
}

/// Parse the schema rooted at `node`.
pub fn parse_schema(graph: &Graph, node: &Node) -> Constraint {
    parse_at_depth(graph, node, 0)
}

fn parse_at_depth(graph: &Graph, node: &Node, depth: usize) -> Constraint {
    let kind = graph
        .types(node)
        .find_map(SchemaKind::from_type_iri)
        .unwrap_or(SchemaKind::String);
    let mut constraint = Constraint::of_kind(kind);

    constraint.enum_values = graph
        .literals(node, vocab::JS_ENUM)
        .map(str::to_string)
        .collect();
    constraint.minimum = graph
        .literal(node, vocab::JS_MINIMUM)
        .and_then(|l| Bound::parse(l, kind));
    constraint.maximum = graph
        .literal(node, vocab::JS_MAXIMUM)
        .and_then(|l| Bound::parse(l, kind));

    if depth >= MAX_SCHEMA_DEPTH {
        return constraint;
    }

    match kind {
        SchemaKind::Array => {
            constraint.items = graph
                .object(node, vocab::JS_ITEMS)
                .map(|items| Box::new(parse_at_depth(graph, items, depth + 1)));
        }
        SchemaKind::Object => {
            constraint.required = graph
                .literals(node, vocab::JS_REQUIRED)
                .map(str::to_string)
                .collect();
            constraint.properties = parse_members(graph, node, &constraint.required, depth);
        }
        _ => {}
    }
    constraint
}

fn parse_members(graph: &Graph, node: &Node, required: &[String], depth: usize) -> Vec<ParameterSpec> {
    graph
        .objects(node, vocab::JS_PROPERTIES)
        .filter_map(|member| {
            let name = graph.literal(member, vocab::JS_PROPERTY_NAME)?.to_string();
            // With no `required` list every member is required.
            let is_required = required.is_empty() || required.contains(&name);
            Some(ParameterSpec {
                constraint: parse_at_depth(graph, member, depth + 1),
                required: is_required,
                name,
            })
        })
        .collect()
}

/// Ordered parameter list of an action's input schema.
pub fn parse_parameters(graph: &Graph, input_schema: &Node) -> Vec<ParameterSpec> {
    parse_schema(graph, input_schema).properties
}
