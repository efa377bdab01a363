//! Dataset loading.
//!
//! HomeBench: every `home_<id>.ttl` in the data directory that has a sibling
//! `home_<id>_state.json`, in file-name order, each loaded as root `<id>`.
//! Blocksworld: `blocksworld.ttl`, `blocksworld_state.json` and an optional
//! `blocksworld_goals.json`, loaded as root [`BLOCKSWORLD_ROOT`].
//!
//! State and goal files map artifact URIs to JSON objects.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use hmas_core::value::map_from_json;
use hmas_core::{Graph, LoadError, PropertyMap, Simulator};

use crate::blocksworld::{blocksworld_kinds, BLOCKSWORLD_ROOT};
use crate::homebench::homebench_kinds;

const BLOCKSWORLD_TD: &str = "blocksworld.ttl";
const BLOCKSWORLD_STATE: &str = "blocksworld_state.json";
const BLOCKSWORLD_GOALS: &str = "blocksworld_goals.json";

/// Load every home found in `dir`.
pub fn load_homes(dir: &Path, base_url: &str, strict_handlers: bool) -> Result<Simulator, LoadError> {
    let homes = discover_homes(dir)?;
    if homes.is_empty() {
        return Err(LoadError::Empty(format!(
            "no home_<id>.ttl with a matching state file in {}",
            dir.display()
        )));
    }

    let mut builder = Simulator::builder(base_url, homebench_kinds()).strict_handlers(strict_handlers);
    for home in &homes {
        let graph = read_graph(&home.description)?;
        let states = read_object_map(&home.state)?;
        builder.add_root(&home.id, &graph, &states, &HashMap::new())?;
    }
    Ok(builder.build())
}

/// Load the blocksworld from `dir`.
pub fn load_blocksworld(dir: &Path, base_url: &str, strict_handlers: bool) -> Result<Simulator, LoadError> {
    let graph = read_graph(&dir.join(BLOCKSWORLD_TD))?;
    let states = read_object_map(&dir.join(BLOCKSWORLD_STATE))?;
    let goals_path = dir.join(BLOCKSWORLD_GOALS);
    let goals = if goals_path.is_file() {
        read_object_map(&goals_path)?
    } else {
        tracing::debug!(path = %goals_path.display(), "no goals file, goal checks disabled");
        HashMap::new()
    };

    let mut builder =
        Simulator::builder(base_url, blocksworld_kinds()).strict_handlers(strict_handlers);
    builder.add_root(BLOCKSWORLD_ROOT, &graph, &states, &goals)?;
    Ok(builder.build())
}

#[derive(Debug)]
struct HomeFiles {
    id: String,
    description: PathBuf,
    state: PathBuf,
}

fn discover_homes(dir: &Path) -> Result<Vec<HomeFiles>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut homes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let file_name = entry.file_name();
        let Some(id) = file_name
            .to_str()
            .and_then(|name| name.strip_prefix("home_"))
            .and_then(|rest| rest.strip_suffix(".ttl"))
        else {
            continue;
        };
        let state = dir.join(format!("home_{}_state.json", id));
        if !state.is_file() {
            tracing::debug!(home = %id, "description without state file, skipping");
            continue;
        }
        homes.push(HomeFiles {
            id: id.to_string(),
            description: entry.path(),
            state,
        });
    }
    homes.sort_by(|a, b| a.description.cmp(&b.description));
    Ok(homes)
}

fn read_graph(path: &Path) -> Result<Graph, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Graph::from_turtle(&text).map_err(|source| LoadError::Graph {
        path: path.to_path_buf(),
        source,
    })
}

fn read_object_map(path: &Path) -> Result<HashMap<String, PropertyMap>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: HashMap<String, serde_json::Value> =
        serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    raw.into_iter()
        .map(|(uri, value)| match map_from_json(value) {
            Some(map) => Ok((uri, map)),
            None => Err(LoadError::InvalidState(format!(
                "{}: entry for {} is not a JSON object",
                path.display(),
                uri
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmas_core::DispatchError;
    use serde_json::json;

    const BASE: &str = "http://localhost:8080";

    const HOME_TD: &str = r#"
@prefix td: <https://www.w3.org/2019/wot/td#> .
@prefix hmas: <https://purl.org/hmas/> .
@prefix hctl: <https://www.w3.org/2019/wot/hypermedia#> .
@prefix js: <https://www.w3.org/2019/wot/json-schema#> .
@prefix ex: <http://example.org/> .

<http://localhost:8080/workspaces/home1#workspace> a hmas:Workspace, td:Thing ;
    td:title "Home 1" ;
    hmas:contains <http://localhost:8080/workspaces/home1/hall#workspace> .

<http://localhost:8080/workspaces/home1/hall#workspace> a hmas:Workspace, td:Thing ;
    hmas:isContainedIn <http://localhost:8080/workspaces/home1#workspace> ;
    hmas:contains <http://localhost:8080/workspaces/home1/hall/artifacts/light#artifact> .

<http://localhost:8080/workspaces/home1/hall/artifacts/light#artifact>
    a ex:Light, hmas:Artifact, td:Thing ;
    hmas:isContainedIn <http://localhost:8080/workspaces/home1/hall#workspace> ;
    td:hasPropertyAffordance [
        td:name "state" ;
        td:hasForm [ hctl:hasTarget <http://localhost:8080/workspaces/home1/hall/artifacts/light/properties/state> ] ;
        td:hasOutputSchema [ a js:StringSchema ; js:enum "on", "off" ]
    ] ;
    td:hasActionAffordance [
        td:name "turnOn" ;
        td:hasForm [ hctl:hasTarget <http://localhost:8080/workspaces/home1/hall/artifacts/light/turn_on> ]
    ] .
"#;

    const LIGHT: &str = "http://localhost:8080/workspaces/home1/hall/artifacts/light#artifact";

    const WORLD_TD: &str = r#"
@prefix td: <https://www.w3.org/2019/wot/td#> .
@prefix hmas: <https://purl.org/hmas/> .
@prefix hctl: <https://www.w3.org/2019/wot/hypermedia#> .
@prefix js: <https://www.w3.org/2019/wot/json-schema#> .
@prefix ex: <http://example.org/> .

<http://localhost:8080/workspaces/blocksworld#workspace> a hmas:Workspace, td:Thing ;
    hmas:contains <http://localhost:8080/workspaces/blocksworld/artifacts/table#artifact> .

<http://localhost:8080/workspaces/blocksworld/artifacts/table#artifact>
    a ex:BlocksWorldSim, hmas:Artifact, td:Thing ;
    hmas:isContainedIn <http://localhost:8080/workspaces/blocksworld#workspace> ;
    td:hasPropertyAffordance [
        td:name "state" ;
        td:hasForm [ hctl:hasTarget <http://localhost:8080/workspaces/blocksworld/artifacts/table/properties/state> ] ;
        td:hasOutputSchema [ a js:ObjectSchema ]
    ] ;
    td:hasActionAffordance [
        td:name "pickup" ;
        td:hasForm [ hctl:hasTarget <http://localhost:8080/workspaces/blocksworld/artifacts/table/pickup> ] ;
        td:hasInputSchema [ a js:ObjectSchema ;
            js:properties [ a js:StringSchema ; js:propertyName "target_block" ] ;
            js:required "target_block" ]
    ], [
        td:name "stack" ;
        td:hasForm [ hctl:hasTarget <http://localhost:8080/workspaces/blocksworld/artifacts/table/stack> ] ;
        td:hasInputSchema [ a js:ObjectSchema ;
            js:properties [ a js:StringSchema ; js:propertyName "target_block" ],
                          [ a js:StringSchema ; js:propertyName "to_block" ] ;
            js:required "target_block", "to_block" ]
    ] .
"#;

    const TABLE: &str = "http://localhost:8080/workspaces/blocksworld/artifacts/table#artifact";

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn blocksworld_dir(with_goals: bool) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), BLOCKSWORLD_TD, WORLD_TD);
        let state = json!({
            TABLE: {
                "blocks": [
                    {"name": "a", "properties": {"clear": true, "ontable": true}},
                    {"name": "b", "properties": {"clear": true, "ontable": true}}
                ],
                "hand": "empty"
            }
        });
        write(dir.path(), BLOCKSWORLD_STATE, &state.to_string());
        if with_goals {
            let goals = json!({ TABLE: {"blocks": [{"name": "a", "properties": {"on": "b"}}]} });
            write(dir.path(), BLOCKSWORLD_GOALS, &goals.to_string());
        }
        dir
    }

    #[test]
    fn test_load_homes_requires_state_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "home_1.ttl", HOME_TD);
        write(dir.path(), "home_2.ttl", HOME_TD);
        write(
            dir.path(),
            "home_1_state.json",
            &json!({ LIGHT: {"state": "off"} }).to_string(),
        );

        let sim = load_homes(dir.path(), BASE, true).unwrap();
        assert_eq!(sim.root_ids().collect::<Vec<_>>(), vec!["1"]);
        sim.dispatch("/workspaces/home1/hall/artifacts/light/turn_on", &json!({}))
            .unwrap();
        assert_eq!(
            sim.read_property("/workspaces/home1/hall/artifacts/light/properties/state")
                .unwrap(),
            json!("on")
        );
        assert_eq!(sim.reset("1").unwrap(), 1);
    }

    #[test]
    fn test_load_homes_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_homes(dir.path(), BASE, true), Err(LoadError::Empty(_))));
        let missing = dir.path().join("nope");
        assert!(matches!(load_homes(&missing, BASE, true), Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_state_entry_must_be_object() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "home_1.ttl", HOME_TD);
        write(dir.path(), "home_1_state.json", &json!({ LIGHT: "on" }).to_string());
        assert!(matches!(
            load_homes(dir.path(), BASE, true),
            Err(LoadError::InvalidState(_))
        ));
    }

    #[test]
    fn test_bad_turtle_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "home_1.ttl", "<a> <b> .");
        write(dir.path(), "home_1_state.json", "{}");
        let err = load_homes(dir.path(), BASE, true).unwrap_err();
        assert!(matches!(err, LoadError::Graph { ref path, .. } if path.ends_with("home_1.ttl")));
    }

    #[test]
    fn test_blocksworld_scenario() {
        let dir = blocksworld_dir(true);
        let sim = load_blocksworld(dir.path(), BASE, true).unwrap();

        sim.dispatch("/workspaces/blocksworld/artifacts/table/pickup", &json!({"target_block": "a"}))
            .unwrap();
        sim.dispatch(
            "/workspaces/blocksworld/artifacts/table/stack",
            &json!({"target_block": "a", "to_block": "b"}),
        )
        .unwrap();
        let before = sim
            .read_property("/workspaces/blocksworld/artifacts/table/properties/state")
            .unwrap();
        assert_eq!(before["hand"], json!("empty"));

        let err = sim
            .dispatch(
                "/workspaces/blocksworld/artifacts/table/stack",
                &json!({"target_block": "a", "to_block": "b"}),
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::PreconditionViolation(_)));
        assert_eq!(err.status(), 400);
        let after = sim
            .read_property("/workspaces/blocksworld/artifacts/table/properties/state")
            .unwrap();
        assert_eq!(before, after);

        let status = sim.goal_status(TABLE).unwrap();
        assert!(status.goal_reached);
    }

    #[test]
    fn test_blocksworld_without_goals() {
        let dir = blocksworld_dir(false);
        let sim = load_blocksworld(dir.path(), BASE, true).unwrap();
        let err = sim.goal_status(TABLE).unwrap_err();
        assert!(err.to_string().starts_with("No goal state defined for artifact"));
    }

    #[test]
    fn test_concurrent_pickups_one_wins() {
        let dir = blocksworld_dir(false);
        let sim = load_blocksworld(dir.path(), BASE, true).unwrap();

        let results: Vec<Result<_, DispatchError>> = std::thread::scope(|s| {
            let handles: Vec<_> = ["a", "b"]
                .into_iter()
                .map(|block| {
                    let sim = &sim;
                    s.spawn(move || {
                        sim.dispatch(
                            "/workspaces/blocksworld/artifacts/table/pickup",
                            &json!({ "target_block": block }),
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let rejected = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(rejected, DispatchError::PreconditionViolation(_)));

        let state = sim
            .read_property("/workspaces/blocksworld/artifacts/table/properties/state")
            .unwrap();
        let hand = state["hand"].as_str().unwrap();
        assert!(hand == "a" || hand == "b");
    }

    #[test]
    fn test_concurrent_pickups_of_same_block() {
        let dir = blocksworld_dir(false);
        let sim = load_blocksworld(dir.path(), BASE, true).unwrap();
        let state_path = "/workspaces/blocksworld/artifacts/table/properties/state";
        let before = sim.read_property(state_path).unwrap();

        let results: Vec<Result<_, DispatchError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let sim = &sim;
                    s.spawn(move || {
                        sim.dispatch(
                            "/workspaces/blocksworld/artifacts/table/pickup",
                            &json!({ "target_block": "a" }),
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let rejected = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(rejected, DispatchError::PreconditionViolation(_)));

        let state = sim.read_property(state_path).unwrap();
        assert_eq!(state["hand"], json!("a"));
        let blocks = state["blocks"].as_array().unwrap();
        let block = |name: &str| blocks.iter().find(|b| b["name"] == name).unwrap().clone();
        assert_ne!(block("a")["properties"]["ontable"], json!(true));
        assert!(block("a")["properties"].get("on").is_none());
        assert_eq!(block("b"), before["blocks"][1]);
    }

    fn bundled(dir: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data").join(dir)
    }

    #[test]
    fn test_bundled_homebench_data() {
        let sim = load_homes(&bundled("home_description"), BASE, true).unwrap();
        assert_eq!(sim.root_ids().collect::<Vec<_>>(), vec!["0"]);
        sim.dispatch(
            "/workspaces/home0/bedroom/artifacts/fan/set_speed",
            &json!({"speed": 4}),
        )
        .unwrap();
        assert_eq!(
            sim.read_property("/workspaces/home0/bedroom/artifacts/fan/properties/speed")
                .unwrap(),
            json!(4)
        );
        let err = sim
            .dispatch(
                "/workspaces/home0/living_room/artifacts/light/set_brightness",
                &json!({"brightness": 150}),
            )
            .unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_bundled_blocksworld_plan() {
        let sim = load_blocksworld(&bundled("blocksworld"), BASE, true).unwrap();
        let table = "http://localhost:8080/workspaces/blocksworld/artifacts/table";
        let steps = [
            ("unstack", json!({"target_block": "c", "from_block": "b"})),
            ("putdown", json!({"target_block": "c"})),
            ("pickup", json!({"target_block": "b"})),
            ("stack", json!({"target_block": "b", "to_block": "c"})),
            ("pickup", json!({"target_block": "a"})),
            ("stack", json!({"target_block": "a", "to_block": "b"})),
        ];
        let goal_uri = format!("{}#artifact", table);
        assert!(!sim.goal_status(&goal_uri).unwrap().goal_reached);
        for (action, params) in steps {
            let path = format!("{}/{}", table.trim_start_matches(BASE), action);
            sim.dispatch(&path, &params).unwrap();
        }
        assert!(sim.goal_status(&goal_uri).unwrap().goal_reached);
    }
}
