//! Blocksworld state machine.
//!
//! State document: `{"blocks": [{"name", "properties": {clear, ontable, on?}}], "hand": "empty" | <block>}`.
//! Every handler checks its preconditions before touching anything and
//! reports a violated precondition as [`HandlerError::Precondition`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hmas_core::device::{param_str, HandlerError, Params};
use hmas_core::{DeviceKind, DeviceKindRegistry, PropertyMap, PropertyValue};

/// Type tag of blocksworld artifacts (`ex:BlocksWorldSim`)
pub const BLOCKSWORLD_KIND: &str = "BlocksWorldSim";
/// Root id the blocksworld is loaded and reset under
pub const BLOCKSWORLD_ROOT: &str = "blocksworld";

const EMPTY_HAND: &str = "empty";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Block {
    name: String,
    #[serde(default)]
    properties: PropertyMap,
}

impl Block {
    fn flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }

    fn on(&self) -> Option<&str> {
        self.properties.get("on").and_then(PropertyValue::as_str)
    }

    fn set_flag(&mut self, key: &str, value: bool) {
        self.properties.insert(key.to_string(), PropertyValue::Bool(value));
    }
}

fn empty_hand() -> String {
    EMPTY_HAND.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct World {
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default = "empty_hand")]
    hand: String,
}

impl World {
    fn from_state(state: &PropertyMap) -> Result<Self, HandlerError> {
        serde_json::from_value(Value::from(PropertyValue::Object(state.clone())))
            .map_err(|e| HandlerError::Precondition(format!("Invalid blocksworld state: {}", e)))
    }

    fn store(self, state: &mut PropertyMap) -> Result<(), HandlerError> {
        let blocks = serde_json::to_value(&self.blocks)
            .map_err(|e| HandlerError::Precondition(format!("Invalid blocksworld state: {}", e)))?;
        state.insert("blocks".to_string(), PropertyValue::from(blocks));
        state.insert("hand".to_string(), PropertyValue::String(self.hand));
        Ok(())
    }

    fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    fn block_mut(&mut self, name: &str) -> Result<&mut Block, HandlerError> {
        self.blocks
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| does_not_exist(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.block(name).is_some()
    }

    fn is_clear(&self, name: &str) -> bool {
        self.block(name).is_some_and(|b| b.flag("clear"))
    }

    fn is_ontable(&self, name: &str) -> bool {
        self.block(name).is_some_and(|b| b.flag("ontable"))
    }

    fn is_on(&self, top: &str, bottom: &str) -> bool {
        self.block(top).and_then(Block::on) == Some(bottom)
    }

    fn hand_empty(&self) -> bool {
        self.hand == EMPTY_HAND
    }

    fn pickup(&mut self, target: &str) -> Result<(), HandlerError> {
        if !self.hand_empty() {
            return Err(violation(format!(
                "Cannot pick up block '{}': hand is not empty (holding '{}')",
                target, self.hand
            )));
        }
        if !self.exists(target) {
            return Err(does_not_exist(target));
        }
        if !self.is_clear(target) {
            return Err(violation(format!("Cannot pick up block '{}': block is not clear", target)));
        }
        if !self.is_ontable(target) {
            return Err(violation(format!(
                "Cannot pick up block '{}': block is not on the table",
                target
            )));
        }
        let block = self.block_mut(target)?;
        block.set_flag("ontable", false);
        block.set_flag("clear", true);
        self.hand = target.to_string();
        Ok(())
    }

    fn putdown(&mut self, target: &str) -> Result<(), HandlerError> {
        if self.hand_empty() {
            return Err(violation("Cannot put down block: hand is empty".to_string()));
        }
        if self.hand != target {
            return Err(violation(format!(
                "Cannot put down block '{}': hand is holding '{}'",
                target, self.hand
            )));
        }
        let block = self.block_mut(target)?;
        block.set_flag("ontable", true);
        block.set_flag("clear", true);
        self.hand = empty_hand();
        Ok(())
    }

    fn stack(&mut self, target: &str, onto: &str) -> Result<(), HandlerError> {
        if self.hand_empty() {
            return Err(violation("Cannot stack block: hand is empty".to_string()));
        }
        if self.hand != target {
            return Err(violation(format!(
                "Cannot stack block '{}': hand is holding '{}'",
                target, self.hand
            )));
        }
        if !self.exists(onto) {
            return Err(does_not_exist(onto));
        }
        if !self.is_clear(onto) {
            return Err(violation(format!("Cannot stack on block '{}': block is not clear", onto)));
        }
        let block = self.block_mut(target)?;
        block
            .properties
            .insert("on".to_string(), PropertyValue::String(onto.to_string()));
        block.properties.remove("ontable");
        self.block_mut(onto)?.set_flag("clear", false);
        self.hand = empty_hand();
        Ok(())
    }

    fn unstack(&mut self, target: &str, from: &str) -> Result<(), HandlerError> {
        if !self.hand_empty() {
            return Err(violation(format!(
                "Cannot unstack block '{}': hand is not empty (holding '{}')",
                target, self.hand
            )));
        }
        if !self.exists(target) {
            return Err(does_not_exist(target));
        }
        if !self.exists(from) {
            return Err(does_not_exist(from));
        }
        if !self.is_clear(target) {
            return Err(violation(format!("Cannot unstack block '{}': block is not clear", target)));
        }
        if !self.is_on(target, from) {
            return Err(violation(format!(
                "Cannot unstack block '{}' from '{}': '{}' is not on '{}'",
                target, from, target, from
            )));
        }
        self.block_mut(target)?.properties.remove("on");
        self.block_mut(from)?.set_flag("clear", true);
        self.hand = target.to_string();
        Ok(())
    }
}

fn violation(message: String) -> HandlerError {
    HandlerError::Precondition(message)
}

fn does_not_exist(name: &str) -> HandlerError {
    violation(format!("Block '{}' does not exist", name))
}

fn run(
    state: &mut PropertyMap,
    f: impl FnOnce(&mut World) -> Result<(), HandlerError>,
) -> Result<(), HandlerError> {
    let mut world = World::from_state(state)?;
    f(&mut world)?;
    world.store(state)
}

/// The blocksworld device kind.
pub fn blocksworld_kind() -> DeviceKind {
    DeviceKind::new(BLOCKSWORLD_KIND)
        .whole_state_property("state")
        .handler("pickup", |state, params: &Params| {
            let target = param_str(params, "target_block")?;
            run(state, |w| w.pickup(target))
        })
        .handler("putdown", |state, params: &Params| {
            let target = param_str(params, "target_block")?;
            run(state, |w| w.putdown(target))
        })
        .handler("stack", |state, params: &Params| {
            let target = param_str(params, "target_block")?;
            let onto = param_str(params, "to_block")?;
            run(state, |w| w.stack(target, onto))
        })
        .handler("unstack", |state, params: &Params| {
            let target = param_str(params, "target_block")?;
            let from = param_str(params, "from_block")?;
            run(state, |w| w.unstack(target, from))
        })
        .goal_check(goal_reached)
}

pub fn blocksworld_kinds() -> DeviceKindRegistry {
    let mut registry = DeviceKindRegistry::new();
    registry.register(blocksworld_kind());
    registry
}

/// Partial-goal check: every block property and the hand named in `goal`
/// must match `current` exactly; anything the goal leaves out is free.
pub fn goal_reached(current: &PropertyMap, goal: &PropertyMap) -> bool {
    if let Some(hand) = goal.get("hand") {
        if current.get("hand") != Some(hand) {
            return false;
        }
    }

    let current_blocks = current
        .get("blocks")
        .and_then(PropertyValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let goal_blocks = goal
        .get("blocks")
        .and_then(PropertyValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    goal_blocks.iter().all(|goal_block| {
        let Some(goal_block) = goal_block.as_object() else {
            return false;
        };
        let Some(name) = goal_block.get("name") else {
            return false;
        };
        let Some(current_props) = current_blocks
            .iter()
            .filter_map(PropertyValue::as_object)
            .find(|b| b.get("name") == Some(name))
            .and_then(|b| b.get("properties"))
            .and_then(PropertyValue::as_object)
        else {
            return false;
        };
        goal_block
            .get("properties")
            .and_then(PropertyValue::as_object)
            .map(|wanted| {
                wanted
                    .iter()
                    .all(|(key, value)| current_props.get(key) == Some(value))
            })
            .unwrap_or(true)
    })
}
