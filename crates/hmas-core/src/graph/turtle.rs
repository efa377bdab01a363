//! Turtle codec for [`Graph`].
//!
//! Parsing delegates to `sophia_turtle`; serialisation is hand-written and
//! emits one subject block per node with the well-known prefixes declared.

use std::collections::HashMap;
use std::fmt::Write;

use sophia_api::source::TripleSource;
use sophia_api::term::{SimpleTerm, Term, TermKind};
use sophia_turtle::parser::turtle as turtle_parser;

use super::{vocab, Graph, GraphError, Literal, Node};

/// Parse a Turtle document into a [`Graph`].
pub fn parse(text: &str) -> Result<Graph, GraphError> {
    let triples: Vec<[SimpleTerm<'static>; 3]> = turtle_parser::parse_str(text)
        .collect_triples()
        .map_err(|e| GraphError::Parse(e.to_string()))?;

    let mut graph = Graph::new();
    for [s, p, o] in &triples {
        let predicate = match p.iri() {
            Some(iri) => iri.as_str().to_string(),
            None => return Err(GraphError::UnsupportedTerm(format!("{:?}", p.kind()))),
        };
        graph.insert(convert_term(s)?, predicate, convert_term(o)?);
    }
    Ok(graph)
}

fn convert_term(term: &SimpleTerm<'static>) -> Result<Node, GraphError> {
    match term.kind() {
        TermKind::Iri => term
            .iri()
            .map(|iri| Node::Iri(iri.as_str().to_string()))
            .ok_or_else(|| GraphError::UnsupportedTerm("iri".into())),
        TermKind::BlankNode => term
            .bnode_id()
            .map(|id| Node::Blank(id.as_str().to_string()))
            .ok_or_else(|| GraphError::UnsupportedTerm("blank node".into())),
        TermKind::Literal => {
            let lexical = term
                .lexical_form()
                .map(|l| l.to_string())
                .unwrap_or_default();
            let language = term.language_tag().map(|tag| tag.as_str().to_string());
            let datatype = term
                .datatype()
                .map(|dt| dt.as_str().to_string())
                .filter(|dt| language.is_none() && dt != vocab::XSD_STRING);
            Ok(Node::Literal(Literal {
                lexical,
                datatype,
                language,
            }))
        }
        other => Err(GraphError::UnsupportedTerm(format!("{:?}", other))),
    }
}

/// Serialise a [`Graph`] as Turtle.
#[must_use]
pub fn serialize(graph: &Graph) -> String {
    let mut out = String::new();
    for (prefix, ns) in vocab::PREFIXES {
        let _ = writeln!(out, "@prefix {}: <{}> .", prefix, ns);
    }

    let mut blank_labels: HashMap<&str, String> = HashMap::new();
    let mut subjects: Vec<&Node> = Vec::new();
    for triple in graph.iter() {
        if !subjects.contains(&&triple.subject) {
            subjects.push(&triple.subject);
        }
    }

    for subject in subjects {
        out.push('\n');
        out.push_str(&render_node(subject, &mut blank_labels));
        let mut first = true;
        for triple in graph.triples_of(subject) {
            out.push_str(if first { "\n    " } else { " ;\n    " });
            first = false;
            if triple.predicate == vocab::RDF_TYPE {
                out.push('a');
            } else {
                out.push_str(&render_iri(&triple.predicate));
            }
            out.push(' ');
            out.push_str(&render_node(&triple.object, &mut blank_labels));
        }
        out.push_str(" .\n");
    }
    out
}

fn render_node<'g>(node: &'g Node, blank_labels: &mut HashMap<&'g str, String>) -> String {
    match node {
        Node::Iri(iri) => render_iri(iri),
        Node::Blank(id) => {
            let next = blank_labels.len();
            let label = blank_labels
                .entry(id.as_str())
                .or_insert_with(|| format!("b{}", next));
            format!("_:{}", label)
        }
        Node::Literal(lit) => render_literal(lit),
    }
}

fn render_iri(iri: &str) -> String {
    for (prefix, ns) in vocab::PREFIXES {
        if let Some(local) = iri.strip_prefix(ns) {
            if is_simple_local(local) {
                return format!("{}:{}", prefix, local);
            }
        }
    }
    format!("<{}>", iri)
}

fn is_simple_local(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn render_literal(lit: &Literal) -> String {
    let quoted = format!("\"{}\"", turtle_string(&lit.lexical));
    if let Some(lang) = &lit.language {
        return format!("{}@{}", quoted, lang);
    }
    match lit.datatype.as_deref() {
        None => quoted,
        Some(vocab::XSD_INTEGER) if lit.lexical.parse::<i64>().is_ok() => lit.lexical.clone(),
        Some(vocab::XSD_BOOLEAN) if lit.lexical == "true" || lit.lexical == "false" => {
            lit.lexical.clone()
        }
        Some(dt) => format!("{}^^{}", quoted, render_iri(dt)),
    }
}

/// Escapes a string for use inside a Turtle double-quoted literal.
fn turtle_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAMP: &str = r#"
@prefix td: <https://www.w3.org/2019/wot/td#> .
@prefix hmas: <https://purl.org/hmas/> .
@prefix hctl: <https://www.w3.org/2019/wot/hypermedia#> .
@prefix js: <https://www.w3.org/2019/wot/json-schema#> .
@prefix ex: <http://example.org/> .

<http://localhost:8080/workspaces/home0/kitchen/artifacts/lamp#artifact>
    a ex:Light, hmas:Artifact, td:Thing ;
    td:title "Lamp" ;
    td:hasPropertyAffordance [
        td:name "brightness" ;
        td:hasForm [ hctl:hasTarget <http://localhost:8080/workspaces/home0/kitchen/artifacts/lamp/properties/brightness> ] ;
        td:hasOutputSchema [ a js:IntegerSchema ; js:minimum 0 ; js:maximum 100 ]
    ] .
"#;

    #[test]
    fn test_parse_lamp() {
        let g = parse(LAMP).unwrap();
        let art = Node::iri("http://localhost:8080/workspaces/home0/kitchen/artifacts/lamp#artifact");
        assert!(g.has_type(&art, "http://example.org/Light"));
        assert_eq!(g.literal(&art, vocab::TD_TITLE), Some("Lamp"));

        let prop = g.object(&art, vocab::TD_HAS_PROPERTY_AFFORDANCE).unwrap();
        assert!(matches!(prop, Node::Blank(_)));
        let schema = g.object(prop, vocab::TD_HAS_OUTPUT_SCHEMA).unwrap();
        let min = g.object(schema, vocab::JS_MINIMUM).unwrap().as_literal().unwrap();
        assert_eq!(min.lexical, "0");
        assert_eq!(min.datatype.as_deref(), Some(vocab::XSD_INTEGER));
    }

    #[test]
    fn test_plain_string_has_no_datatype() {
        let g = parse(LAMP).unwrap();
        let art = Node::iri("http://localhost:8080/workspaces/home0/kitchen/artifacts/lamp#artifact");
        let title = g.object(&art, vocab::TD_TITLE).unwrap().as_literal().unwrap();
        assert_eq!(title.datatype, None);
    }

    #[test]
    fn test_parse_error() {
        let err = parse("<a> <b> .").unwrap_err();
        assert!(matches!(err, GraphError::Parse(_)));
    }

    #[test]
    fn test_serialize_reparses_to_same_graph() {
        let g = parse(LAMP).unwrap();
        let text = serialize(&g);
        assert!(text.contains("@prefix td: <https://www.w3.org/2019/wot/td#> ."));
        assert!(text.contains("td:title \"Lamp\""));
        assert!(text.contains("js:minimum 0"));

        let back = parse(&text).unwrap();
        assert_eq!(back.len(), g.len());
        let art = Node::iri("http://localhost:8080/workspaces/home0/kitchen/artifacts/lamp#artifact");
        assert!(back.has_type(&art, vocab::TD_THING));
    }

    #[test]
    fn test_literal_escaping() {
        let mut g = Graph::new();
        g.insert(Node::iri("http://x/a"), vocab::TD_TITLE, Node::string("say \"hi\"\n"));
        let text = serialize(&g);
        assert!(text.contains(r#""say \"hi\"\n""#));
        let back = parse(&text).unwrap();
        assert_eq!(back.literal(&Node::iri("http://x/a"), vocab::TD_TITLE), Some("say \"hi\"\n"));
    }
}
