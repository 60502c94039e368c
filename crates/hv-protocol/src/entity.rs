use std::collections::{HashMap, HashSet};

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// Entity domains the agent exposes to the model, in match order.
pub const SUPPORTED_DOMAINS: &[&str] = &[
    "light",
    "switch",
    "fan",
    "vacuum",
    "input_boolean",
    "sensor",
    "climate",
];

/// One device or sensor as reported by `GET /api/states`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// `<domain>.<slug>`, unique per backend instance.
    pub entity_id: String,
    /// Current reported state (`"on"`, `"off"`, `"23.5"`, `"unavailable"`, ...).
    pub state: String,
    /// Backend-specific attributes (friendly_name, unit_of_measurement, ...).
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: serde_json::Map::new(),
        }
    }

    /// Builder-style helper for setting `attributes.friendly_name`.
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.attributes
            .insert("friendly_name".into(), serde_json::Value::String(name.into()));
        self
    }

    /// The entity domain: everything before the first dot.
    pub fn domain(&self) -> &str {
        entity_domain(&self.entity_id)
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get("friendly_name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Human-readable label shown to the model.
    pub fn label(&self) -> &str {
        self.friendly_name().unwrap_or(&self.entity_id)
    }
}

/// Domain prefix of an entity id (`"light.kitchen"` → `"light"`).
///
/// An id without a dot is returned whole.
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id
        .split_once('.')
        .map_or(entity_id, |(domain, _)| domain)
}

/// One row of the inventory table embedded in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub label: String,
    pub entity_id: String,
    pub state: String,
}

impl Serialize for InventoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("InventoryEntry", 2)?;
        s.serialize_field("entity_id", &self.entity_id)?;
        s.serialize_field("state", &self.state)?;
        s.end()
    }
}

/// Label → entity lookup table for one pipeline run.
///
/// Preserves backend order. Serializes as a JSON object keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryMap {
    entries: Vec<InventoryEntry>,
}

impl InventoryMap {
    /// Build from filtered records. Duplicate labels get the entity id appended,
    /// then a counter if that still collides, so every key stays unique.
    pub fn from_records(records: &[EntityRecord]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in records {
            *counts.entry(record.label()).or_default() += 1;
        }

        let mut used: HashSet<String> = HashSet::with_capacity(records.len());
        let mut entries: Vec<InventoryEntry> = Vec::with_capacity(records.len());
        for record in records {
            let base = record.label();
            let mut label = if counts[base] > 1 && base != record.entity_id {
                format!("{base} ({})", record.entity_id)
            } else {
                base.to_string()
            };
            let mut n = 2;
            while used.contains(&label) {
                label = format!("{base} ({}) #{n}", record.entity_id);
                n += 1;
            }
            used.insert(label.clone());
            entries.push(InventoryEntry {
                label,
                entity_id: record.entity_id.clone(),
                state: record.state.clone(),
            });
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entries.iter().any(|e| e.entity_id == entity_id)
    }

    /// JSON text for the prompt: `{"<label>": {"entity_id": .., "state": ..}, ..}`.
    pub fn to_prompt_json(&self) -> String {
        // Serializing a Vec-backed map into a String cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for InventoryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.label, entry)?;
        }
        map.end()
    }
}
