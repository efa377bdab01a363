//! Discovery documents served to hypermedia clients.
//!
//! - Platform: a `hmas:ResourceProfile` of the platform, which `hmas:hosts`
//!   every top-level workspace
//! - Workspace: its type, title and `hmas:contains` children
//! - Artifact: the artifact's own sub-graph, as loaded

use crate::dispatch::Simulator;
use crate::graph::{vocab, Graph, Node};

impl Simulator {
    /// Platform document served at the root.
    pub fn platform_document(&self) -> String {
        let profile = Node::iri(format!("{}/", self.base_url));
        let platform = Node::iri(format!("{}/#platform", self.base_url));

        let mut g = Graph::new();
        g.insert(profile.clone(), vocab::RDF_TYPE, Node::iri(vocab::HMAS_RESOURCE_PROFILE));
        g.insert(profile, vocab::HMAS_IS_PROFILE_OF, platform.clone());
        g.insert(platform.clone(), vocab::RDF_TYPE, Node::iri(vocab::HMAS_PLATFORM));
        g.insert(platform.clone(), vocab::RDF_TYPE, Node::iri(vocab::TD_THING));
        for root in self.roots.values() {
            for ws in &root.workspaces {
                g.insert(platform.clone(), vocab::HMAS_HOSTS, Node::iri(ws.as_str()));
            }
        }
        g.to_turtle()
    }

    /// Workspace document, if `workspace_uri` is known.
    pub fn workspace_document(&self, workspace_uri: &str) -> Option<String> {
        let entry = self.workspaces.get(workspace_uri)?;
        let ws = Node::iri(workspace_uri);

        let mut g = Graph::new();
        g.insert(ws.clone(), vocab::RDF_TYPE, Node::iri(vocab::HMAS_WORKSPACE));
        g.insert(ws.clone(), vocab::RDF_TYPE, Node::iri(vocab::TD_THING));
        if let Some(title) = &entry.title {
            g.insert(ws.clone(), vocab::TD_TITLE, Node::string(title.as_str()));
        }
        for child in &entry.contains {
            g.insert(ws.clone(), vocab::HMAS_CONTAINS, Node::iri(child.as_str()));
        }
        Some(g.to_turtle())
    }

    /// Artifact document, if `artifact_uri` is known.
    pub fn artifact_document(&self, artifact_uri: &str) -> Option<String> {
        self.artifact_graphs.get(artifact_uri).map(Graph::to_turtle)
    }

    /// Discovery document addressed by a request path.
    pub fn discovery_document(&self, path: &str) -> Option<String> {
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Some(self.platform_document());
        }
        self.workspace_document(&self.workspace_uri_for(path))
            .or_else(|| self.artifact_document(&self.artifact_uri_for(path)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::device::{DeviceKind, DeviceKindRegistry};
    use crate::dispatch::Simulator;
    use crate::graph::{vocab, Graph, Node};

    const DOC: &str = r#"
@prefix td: <https://www.w3.org/2019/wot/td#> .
@prefix hmas: <https://purl.org/hmas/> .
@prefix hctl: <https://www.w3.org/2019/wot/hypermedia#> .
@prefix ex: <http://example.org/> .

<http://localhost:8080/workspaces/home3#workspace> a hmas:Workspace, td:Thing ;
    td:title "Home 3" ;
    hmas:contains <http://localhost:8080/workspaces/home3/garage#workspace> .

<http://localhost:8080/workspaces/home3/garage#workspace> a hmas:Workspace, td:Thing ;
    hmas:contains <http://localhost:8080/workspaces/home3/garage/artifacts/door#artifact> .

<http://localhost:8080/workspaces/home3/garage/artifacts/door#artifact>
    a ex:GarageDoor, hmas:Artifact, td:Thing ;
    td:title "Door" ;
    hmas:isContainedIn <http://localhost:8080/workspaces/home3/garage#workspace> ;
    td:hasActionAffordance [
        td:name "open" ;
        td:hasForm [ hctl:hasTarget <http://localhost:8080/workspaces/home3/garage/artifacts/door/open> ]
    ] .
"#;

    fn simulator() -> Simulator {
        let mut kinds = DeviceKindRegistry::new();
        kinds.register(DeviceKind::new("GarageDoor").handler("open", |s, _| {
            s.insert("state".into(), "open".into());
            Ok(())
        }));
        let graph = Graph::from_turtle(DOC).unwrap();
        let mut builder = Simulator::builder("http://localhost:8080/", kinds);
        builder
            .add_root("3", &graph, &HashMap::new(), &HashMap::new())
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_platform_hosts_top_level_workspace_only() {
        let sim = simulator();
        let g = Graph::from_turtle(&sim.platform_document()).unwrap();
        let platform = Node::iri("http://localhost:8080/#platform");
        assert!(g.has_type(&platform, vocab::HMAS_PLATFORM));
        let hosted: Vec<&Node> = g.objects(&platform, vocab::HMAS_HOSTS).collect();
        assert_eq!(hosted, vec![&Node::iri("http://localhost:8080/workspaces/home3#workspace")]);
        let profile = Node::iri("http://localhost:8080/");
        assert_eq!(g.object(&profile, vocab::HMAS_IS_PROFILE_OF), Some(&platform));
    }

    #[test]
    fn test_workspace_document() {
        let sim = simulator();
        let doc = sim.discovery_document("/workspaces/home3/garage").unwrap();
        let g = Graph::from_turtle(&doc).unwrap();
        let ws = Node::iri("http://localhost:8080/workspaces/home3/garage#workspace");
        assert!(g.has_type(&ws, vocab::HMAS_WORKSPACE));
        let children: Vec<&Node> = g.objects(&ws, vocab::HMAS_CONTAINS).collect();
        assert_eq!(
            children,
            vec![&Node::iri("http://localhost:8080/workspaces/home3/garage/artifacts/door#artifact")]
        );

        let home = Graph::from_turtle(&sim.discovery_document("/workspaces/home3").unwrap()).unwrap();
        let home_ws = Node::iri("http://localhost:8080/workspaces/home3#workspace");
        assert_eq!(home.literal(&home_ws, vocab::TD_TITLE), Some("Home 3"));
    }

    #[test]
    fn test_artifact_document_excludes_siblings() {
        let sim = simulator();
        let doc = sim
            .discovery_document("/workspaces/home3/garage/artifacts/door")
            .unwrap();
        let g = Graph::from_turtle(&doc).unwrap();
        let door = Node::iri("http://localhost:8080/workspaces/home3/garage/artifacts/door#artifact");
        assert!(g.has_type(&door, vocab::HMAS_ARTIFACT));
        assert!(g.object(&door, vocab::TD_HAS_ACTION_AFFORDANCE).is_some());
        let home_ws = Node::iri("http://localhost:8080/workspaces/home3#workspace");
        assert!(g.object(&home_ws, vocab::HMAS_CONTAINS).is_none());
    }

    #[test]
    fn test_unknown_path() {
        let sim = simulator();
        assert!(sim.discovery_document("/workspaces/home4").is_none());
        assert!(sim.discovery_document("/").is_some());
    }
}
