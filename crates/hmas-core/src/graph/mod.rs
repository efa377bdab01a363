//! Affordance graph model.
//!
//! A small labelled directed graph holding exactly what TD documents need:
//! IRI / blank / literal nodes and predicate-labelled edges. Triples keep
//! their insertion order so that parameter lists and enum literals come out
//! in document order.

pub mod turtle;
pub mod vocab;

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

/// Graph level errors
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("turtle parse error: {0}")]
    Parse(String),
    #[error("unsupported term in document: {0}")]
    UnsupportedTerm(String),
}

/// RDF literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), vocab::XSD_INTEGER)
    }

    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), vocab::XSD_BOOLEAN)
    }
}

/// Graph node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Node {
    pub fn iri(value: impl Into<String>) -> Self {
        Node::Iri(value.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Node::Blank(id.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Literal(Literal::plain(value))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{}>", iri),
            Node::Blank(id) => write!(f, "_:{}", id),
            Node::Literal(lit) => write!(f, "\"{}\"", lit.lexical),
        }
    }
}

/// One statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Node,
    pub predicate: String,
    pub object: Node,
}

/// Insertion-ordered set of triples with a subject index.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    by_subject: HashMap<Node, Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a Turtle document.
    pub fn from_turtle(text: &str) -> Result<Self, GraphError> {
        turtle::parse(text)
    }

    /// Serialise as Turtle.
    pub fn to_turtle(&self) -> String {
        turtle::serialize(self)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Insert a triple. Returns false if it was already present.
    pub fn insert(&mut self, subject: Node, predicate: impl Into<String>, object: Node) -> bool {
        let triple = Triple {
            subject,
            predicate: predicate.into(),
            object,
        };
        if self.seen.contains(&triple) {
            return false;
        }
        let idx = self.triples.len();
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(idx);
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Triples whose subject is `subject`, in insertion order.
    pub fn triples_of<'a>(&'a self, subject: &Node) -> impl Iterator<Item = &'a Triple> + 'a {
        self.by_subject
            .get(subject)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |idx| &self.triples[*idx])
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &'a self,
        subject: &Node,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.triples_of(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// First object of `(subject, predicate, ?)`.
    pub fn object(&self, subject: &Node, predicate: &str) -> Option<&Node> {
        self.triples_of(subject)
            .find(|t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Lexical forms of all literal objects of `(subject, predicate, ?)`.
    pub fn literals<'a>(
        &'a self,
        subject: &Node,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.objects(subject, predicate)
            .filter_map(|o| o.as_literal().map(|l| l.lexical.as_str()))
    }

    /// First literal object of `(subject, predicate, ?)`.
    pub fn literal(&self, subject: &Node, predicate: &str) -> Option<&str> {
        self.triples_of(subject)
            .filter(|t| t.predicate == predicate)
            .find_map(|t| t.object.as_literal().map(|l| l.lexical.as_str()))
    }

    /// Subjects of `(?, predicate, object)`.
    pub fn subjects_with<'a>(
        &'a self,
        predicate: &'a str,
        object: &'a Node,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.predicate == predicate && &t.object == object)
            .map(|t| &t.subject)
    }

    /// Subjects having `predicate` with any object, deduplicated, in order.
    pub fn subjects_having(&self, predicate: &str) -> Vec<&Node> {
        let mut seen = HashSet::new();
        self.triples
            .iter()
            .filter(|t| t.predicate == predicate)
            .map(|t| &t.subject)
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// IRIs declared via `rdf:type`.
    pub fn types<'a>(&'a self, subject: &Node) -> impl Iterator<Item = &'a str> + 'a {
        self.objects(subject, vocab::RDF_TYPE)
            .filter_map(|o| o.as_iri())
    }

    pub fn has_type(&self, subject: &Node, type_iri: &str) -> bool {
        self.types(subject).any(|t| t == type_iri)
    }

    /// Copy every triple reachable from `root` by following non-literal
    /// objects, except through the predicates in `skip`.
    pub fn extract_subgraph(&self, root: &Node, skip: &[&str]) -> Graph {
        let mut out = Graph::new();
        let mut visited: HashSet<&Node> = HashSet::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            for triple in self.triples_of(node) {
                out.insert(
                    triple.subject.clone(),
                    triple.predicate.clone(),
                    triple.object.clone(),
                );
                if !triple.object.is_literal() && !skip.contains(&triple.predicate.as_str()) {
                    stack.push(&triple.object);
                }
            }
        }
        out
    }
}
