//! Format instructions and the strict parser for `ActionPlan`.
//!
//! The JSON Schema handed to the model is generated from the same types the
//! parser deserializes into, so the two cannot drift apart.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::plan::{ActionPlan, Category};

/// `<domain>.<slug>`: lowercase domain, non-empty slug without whitespace.
static ENTITY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9_]+\.[^\s.][^\s]*$").expect("entity id pattern is valid")
});

/// Why model output could not be turned into an `ActionPlan`.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaValidationError {
    #[error("model output is not a valid action plan: {0}")]
    Malformed(String),

    #[error("response text is empty")]
    EmptyResponse,

    #[error("{category} entry has invalid entity id {entity_id:?}")]
    InvalidEntityId {
        category: Category,
        entity_id: String,
    },
}

/// JSON Schema of `ActionPlan`, pretty-printed.
pub fn plan_schema_json() -> String {
    let schema = schemars::schema_for!(ActionPlan);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Format instructions embedded in the extraction prompt.
pub fn format_instructions() -> String {
    format!(
        "The output must be a JSON object that conforms to the JSON schema below.\n\
         Return only the JSON object, without markdown or commentary.\n\
         Omit any device that you cannot match to entity_map with high confidence.\n\
         Always fill in \"response\", even when no device needs to change.\n\
         \n\
         Here is the output schema:\n\
         ```\n{}\n```",
        plan_schema_json()
    )
}

impl ActionPlan {
    /// Parse and validate raw model output.
    ///
    /// Accepts a bare JSON object or one wrapped in a markdown code fence.
    pub fn parse(raw: &str) -> Result<Self, SchemaValidationError> {
        let json = extract_json(raw);
        let plan: ActionPlan = serde_json::from_str(json)
            .map_err(|e| SchemaValidationError::Malformed(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Checks serde cannot express: non-blank reply, well-formed entity ids.
    pub fn validate(&self) -> Result<(), SchemaValidationError> {
        if self.response.trim().is_empty() {
            return Err(SchemaValidationError::EmptyResponse);
        }
        for command in self.commands() {
            let entity_id = &command.target().entity_id;
            if !ENTITY_ID.is_match(entity_id) {
                return Err(SchemaValidationError::InvalidEntityId {
                    category: command.category(),
                    entity_id: entity_id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Extract JSON from model output that may be wrapped in markdown code blocks.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}
