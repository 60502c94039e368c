//! Action plan model: the structured output the LLM fills in for one utterance.
//!
//! Every category entry shares the `EntityTarget` base (entity, reported
//! state, requested on/off action). Fans and climate devices add their own
//! parameters on top. `ActionPlan::commands()` yields the entries as a
//! single tagged sequence in execution order.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Numeric sentinel meaning "the user gave no value for this field".
pub const UNSPECIFIED: f64 = -1.0;

/// Upper bound applied to percentages and temperatures before they are sent.
pub const VALUE_CEILING: f64 = 100.0;

pub fn is_unspecified(value: f64) -> bool {
    value == UNSPECIFIED
}

fn unspecified() -> f64 {
    UNSPECIFIED
}

/// Requested on/off transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    On,
    Off,
    /// No on/off transition requested.
    #[default]
    Other,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Other => "other",
        }
    }
}

/// Climate fan speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FanMode {
    Auto,
    Low,
    Medium,
    High,
    #[default]
    Other,
}

impl FanMode {
    /// Value accepted by `climate/set_fan_mode`, or `None` for `other`.
    pub fn service_value(&self) -> Option<&'static str> {
        match self {
            Self::Auto => Some("auto"),
            Self::Low => Some("low"),
            Self::Medium => Some("medium"),
            Self::High => Some("high"),
            Self::Other => None,
        }
    }
}

/// Climate operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    HeatCool,
    Cool,
    Dry,
    FanOnly,
    Heat,
    #[default]
    Other,
}

impl HvacMode {
    /// Value accepted by `climate/set_hvac_mode`, or `None` for `other`.
    pub fn service_value(&self) -> Option<&'static str> {
        match self {
            Self::HeatCool => Some("heat_cool"),
            Self::Cool => Some("cool"),
            Self::Dry => Some("dry"),
            Self::FanOnly => Some("fan_only"),
            Self::Heat => Some("heat"),
            Self::Other => None,
        }
    }
}

/// Fields shared by every plan entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntityTarget {
    #[schemars(
        description = "entity id of the device, taken from entity_map. Only match if highly confident about the device name"
    )]
    pub entity_id: String,
    #[schemars(description = "current state of the entity as listed in entity_map")]
    pub state: String,
    #[serde(default)]
    #[schemars(
        description = "action for the device from the user input. Only on/off/other. Default value is other"
    )]
    pub action: Action,
}

impl EntityTarget {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>, action: Action) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FanEntry {
    #[serde(flatten)]
    pub target: EntityTarget,
    #[serde(default = "unspecified")]
    #[schemars(
        description = "fan air volume level (percentage) from the user input. Set -1 if not mentioned"
    )]
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClimateEntry {
    #[serde(flatten)]
    pub target: EntityTarget,
    #[serde(default = "unspecified")]
    #[schemars(
        description = "target temperature of the air conditioner from the user input. Set -1 if not mentioned"
    )]
    pub temperature: f64,
    #[serde(default)]
    #[schemars(
        description = "fan mode of the air conditioner. Only auto/low/medium/high/other. Default value is other"
    )]
    pub fan_mode: FanMode,
    #[serde(default)]
    #[schemars(
        description = "HVAC (heating, ventilation and air conditioning) mode. Only heat_cool/cool/dry/fan_only/heat/other. Default value is other"
    )]
    pub hvac_mode: HvacMode,
}

/// Structured result of one utterance: device entries plus the spoken reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionPlan {
    /// Lights, switches, input booleans and other on/off devices.
    #[serde(default)]
    pub switch: Vec<EntityTarget>,
    #[serde(default)]
    pub fan: Vec<FanEntry>,
    #[serde(default)]
    pub climate: Vec<ClimateEntry>,
    #[schemars(
        description = "Reply to the user input in 2 to 100 words. Plain text only, no formatting. Keep it simple and to the point. Reply in the language of the user input; for Chinese, tell traditional from simplified and prefer traditional when unsure"
    )]
    pub response: String,
}

/// Plan categories in the order the executor processes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Switch,
    Fan,
    Climate,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Fan => "fan",
            Self::Climate => "climate",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One plan entry, tagged by category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand<'a> {
    Switch(&'a EntityTarget),
    Fan(&'a FanEntry),
    Climate(&'a ClimateEntry),
}

impl<'a> DeviceCommand<'a> {
    pub fn target(&self) -> &'a EntityTarget {
        match *self {
            Self::Switch(t) => t,
            Self::Fan(f) => &f.target,
            Self::Climate(c) => &c.target,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Switch(_) => Category::Switch,
            Self::Fan(_) => Category::Fan,
            Self::Climate(_) => Category::Climate,
        }
    }
}

impl ActionPlan {
    /// A plan with no device entries, only a reply.
    pub fn reply_only(response: impl Into<String>) -> Self {
        Self {
            switch: Vec::new(),
            fan: Vec::new(),
            climate: Vec::new(),
            response: response.into(),
        }
    }

    /// All entries: switches, then fans, then climate; list order within each.
    pub fn commands(&self) -> impl Iterator<Item = DeviceCommand<'_>> {
        self.switch
            .iter()
            .map(DeviceCommand::Switch)
            .chain(self.fan.iter().map(DeviceCommand::Fan))
            .chain(self.climate.iter().map(DeviceCommand::Climate))
    }

    pub fn entry_count(&self) -> usize {
        self.switch.len() + self.fan.len() + self.climate.len()
    }

    pub fn has_device_entries(&self) -> bool {
        self.entry_count() > 0
    }

    /// Drop entries whose entity fails `keep`. Returns the removed entity ids.
    pub fn retain_entities<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let mut removed = Vec::new();
        let mut check = |target: &EntityTarget| {
            let ok = keep(&target.entity_id);
            if !ok {
                removed.push(target.entity_id.clone());
            }
            ok
        };
        self.switch.retain(|t| check(t));
        self.fan.retain(|f| check(&f.target));
        self.climate.retain(|c| check(&c.target));
        removed
    }
}
