//! HomeBench smart-home device kinds.
//!
//! Every kind is a list of `(handler id, effect)` pairs. Setters copy the
//! parameter of the same name into the state; the `*IfPresent` effects only
//! touch keys the snapshot already carries.

use hmas_core::device::{param, HandlerError, Params};
use hmas_core::{DeviceKind, DeviceKindRegistry, PropertyMap, PropertyValue};

#[derive(Debug, Clone, Copy)]
enum Effect {
    /// `state[key] = value`
    Set(&'static str, &'static str),
    /// `state[key] = params[key]`
    Assign(&'static str),
    /// `state[key] = params[key]` when `key` already exists
    AssignIfPresent(&'static str),
    /// `state[key] = now()` when `key` already exists
    StampIfPresent(&'static str),
}

impl Effect {
    fn apply(self, state: &mut PropertyMap, params: &Params) -> Result<(), HandlerError> {
        match self {
            Effect::Set(key, value) => {
                state.insert(key.to_string(), PropertyValue::from(value));
            }
            Effect::Assign(key) => {
                state.insert(key.to_string(), param(params, key)?.clone());
            }
            Effect::AssignIfPresent(key) => {
                let value = param(params, key)?.clone();
                if let Some(slot) = state.get_mut(key) {
                    *slot = value;
                }
            }
            Effect::StampIfPresent(key) => {
                if let Some(slot) = state.get_mut(key) {
                    let now = chrono::Local::now().naive_local();
                    *slot = PropertyValue::String(now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
                }
            }
        }
        Ok(())
    }
}

const TURN_ON: (&str, Effect) = ("turn_on", Effect::Set("state", "on"));
const TURN_OFF: (&str, Effect) = ("turn_off", Effect::Set("state", "off"));
const OPEN: (&str, Effect) = ("open", Effect::Set("state", "open"));
const CLOSE: (&str, Effect) = ("close", Effect::Set("state", "closed"));

const fn setter(id: &'static str, key: &'static str) -> (&'static str, Effect) {
    (id, Effect::Assign(key))
}

const KINDS: &[(&str, &[(&str, Effect)])] = &[
    (
        "Light",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_brightness", "brightness"),
            setter("set_color", "color"),
        ],
    ),
    (
        "Heating",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_temperature", "temperature"),
            setter("set_mode", "mode"),
            setter("set_fan_speed", "fan_speed"),
        ],
    ),
    (
        "Fan",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_speed", "speed"),
            setter("set_swing", "swing"),
        ],
    ),
    (
        "AirConditioner",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_temperature", "temperature"),
            setter("set_mode", "mode"),
            setter("set_fan_speed", "fan_speed"),
            setter("set_swing", "swing"),
        ],
    ),
    ("GarageDoor", &[OPEN, CLOSE]),
    (
        "Blinds",
        &[OPEN, CLOSE, ("set_degree", Effect::AssignIfPresent("degree"))],
    ),
    (
        "Curtain",
        &[OPEN, CLOSE, ("set_degree", Effect::AssignIfPresent("degree"))],
    ),
    (
        "MediaPlayer",
        &[
            ("play", Effect::Set("state", "playing")),
            ("pause", Effect::Set("state", "paused")),
            ("stop", Effect::Set("state", "stopped")),
            setter("set_volume", "volume"),
            setter("set_artist", "artist"),
            setter("set_song", "song"),
            setter("set_style", "style"),
        ],
    ),
    (
        "VacuumRobot",
        &[
            ("start", Effect::Set("state", "cleaning")),
            ("stop", Effect::Set("state", "idle")),
            ("return_to_dock", Effect::Set("state", "docked")),
        ],
    ),
    ("Trash", &[("pack", Effect::Set("state", "packed"))]),
    (
        "Humidifier",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_intensity", "intensity"),
            setter("set_mode", "mode"),
        ],
    ),
    (
        "Dehumidifiers",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_intensity", "intensity"),
            setter("set_mode", "mode"),
        ],
    ),
    (
        "Aromatherapy",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_interval", "interval"),
            setter("set_intensity", "intensity"),
        ],
    ),
    (
        "WaterHeater",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_temperature", "temperature"),
            setter("set_mode", "mode"),
        ],
    ),
    (
        "AirPurifiers",
        &[
            TURN_ON,
            TURN_OFF,
            setter("set_fan_speed", "fan_speed"),
            setter("set_mode", "mode"),
        ],
    ),
    (
        "PetFeeder",
        &[
            ("feed", Effect::StampIfPresent("last_feed_time")),
            ("set_schedule", Effect::AssignIfPresent("schedule")),
        ],
    ),
];

/// Registry holding every HomeBench device kind.
pub fn homebench_kinds() -> DeviceKindRegistry {
    let mut registry = DeviceKindRegistry::new();
    for (name, handlers) in KINDS {
        let kind = handlers.iter().fold(DeviceKind::new(*name), |kind, (id, effect)| {
            let effect = *effect;
            kind.handler(*id, move |state, params| effect.apply(state, params))
        });
        registry.register(kind);
    }
    registry
}
