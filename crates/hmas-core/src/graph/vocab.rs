//! Namespace and term IRIs for the vocabularies used by TD documents.

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const TD: &str = "https://www.w3.org/2019/wot/td#";
pub const HMAS: &str = "https://purl.org/hmas/";
pub const HCTL: &str = "https://www.w3.org/2019/wot/hypermedia#";
pub const HTV: &str = "http://www.w3.org/2011/http#";
pub const JS: &str = "https://www.w3.org/2019/wot/json-schema#";
pub const EX: &str = "http://example.org/";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const TD_THING: &str = "https://www.w3.org/2019/wot/td#Thing";
pub const TD_NAME: &str = "https://www.w3.org/2019/wot/td#name";
pub const TD_TITLE: &str = "https://www.w3.org/2019/wot/td#title";
pub const TD_HAS_PROPERTY_AFFORDANCE: &str = "https://www.w3.org/2019/wot/td#hasPropertyAffordance";
pub const TD_HAS_ACTION_AFFORDANCE: &str = "https://www.w3.org/2019/wot/td#hasActionAffordance";
pub const TD_HAS_FORM: &str = "https://www.w3.org/2019/wot/td#hasForm";
pub const TD_HAS_INPUT_SCHEMA: &str = "https://www.w3.org/2019/wot/td#hasInputSchema";
pub const TD_HAS_OUTPUT_SCHEMA: &str = "https://www.w3.org/2019/wot/td#hasOutputSchema";
pub const TD_PROPERTY_AFFORDANCE: &str = "https://www.w3.org/2019/wot/td#PropertyAffordance";
pub const TD_ACTION_AFFORDANCE: &str = "https://www.w3.org/2019/wot/td#ActionAffordance";

pub const HMAS_WORKSPACE: &str = "https://purl.org/hmas/Workspace";
pub const HMAS_ARTIFACT: &str = "https://purl.org/hmas/Artifact";
pub const HMAS_CONTAINS: &str = "https://purl.org/hmas/contains";
pub const HMAS_IS_CONTAINED_IN: &str = "https://purl.org/hmas/isContainedIn";
pub const HMAS_HOSTS: &str = "https://purl.org/hmas/hosts";
pub const HMAS_PLATFORM: &str = "https://purl.org/hmas/HypermediaMASPlatform";
pub const HMAS_RESOURCE_PROFILE: &str = "https://purl.org/hmas/ResourceProfile";
pub const HMAS_IS_PROFILE_OF: &str = "https://purl.org/hmas/isProfileOf";

pub const HCTL_HAS_TARGET: &str = "https://www.w3.org/2019/wot/hypermedia#hasTarget";

pub const JS_PROPERTIES: &str = "https://www.w3.org/2019/wot/json-schema#properties";
pub const JS_PROPERTY_NAME: &str = "https://www.w3.org/2019/wot/json-schema#propertyName";
pub const JS_REQUIRED: &str = "https://www.w3.org/2019/wot/json-schema#required";
pub const JS_ENUM: &str = "https://www.w3.org/2019/wot/json-schema#enum";
pub const JS_MINIMUM: &str = "https://www.w3.org/2019/wot/json-schema#minimum";
pub const JS_MAXIMUM: &str = "https://www.w3.org/2019/wot/json-schema#maximum";
pub const JS_ITEMS: &str = "https://www.w3.org/2019/wot/json-schema#items";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Prefixes emitted when serialising Turtle, in declaration order.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("xsd", XSD),
    ("td", TD),
    ("hmas", HMAS),
    ("hctl", HCTL),
    ("htv", HTV),
    ("js", JS),
    ("ex", EX),
];

/// Local name of an IRI: the part after the last `#` or `/`.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

/// Strips the fragment from an IRI.
pub fn strip_fragment(iri: &str) -> &str {
    iri.split('#').next().unwrap_or(iri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(TD_NAME), "name");
        assert_eq!(local_name(HMAS_WORKSPACE), "Workspace");
        assert_eq!(local_name("plain"), "plain");
    }

    #[test]
    fn test_strip_fragment() {
        assert_eq!(
            strip_fragment("http://localhost:8080/workspaces/home0#workspace"),
            "http://localhost:8080/workspaces/home0"
        );
        assert_eq!(strip_fragment("http://x/y"), "http://x/y");
    }
}
