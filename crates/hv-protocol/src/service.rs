use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::entity_domain;

/// Backend services the executor can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    TurnOn,
    TurnOff,
    SetPercentage,
    SetHvacMode,
    SetFanMode,
    SetTemperature,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::SetPercentage => "set_percentage",
            Self::SetHvacMode => "set_hvac_mode",
            Self::SetFanMode => "set_fan_mode",
            Self::SetTemperature => "set_temperature",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device-control request: `POST /api/services/<domain>/<service>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: Service,
    /// JSON body, always carrying `entity_id`.
    pub payload: serde_json::Value,
}

impl ServiceCall {
    /// `turn_on` / `turn_off` on the entity's own domain.
    pub fn power(entity_id: &str, service: Service) -> Self {
        Self {
            domain: entity_domain(entity_id).to_string(),
            service,
            payload: json!({ "entity_id": entity_id }),
        }
    }

    pub fn set_percentage(entity_id: &str, percentage: f64) -> Self {
        Self {
            domain: "fan".into(),
            service: Service::SetPercentage,
            payload: json!({ "entity_id": entity_id, "percentage": percentage }),
        }
    }

    pub fn set_hvac_mode(entity_id: &str, hvac_mode: &str) -> Self {
        Self {
            domain: "climate".into(),
            service: Service::SetHvacMode,
            payload: json!({ "entity_id": entity_id, "hvac_mode": hvac_mode }),
        }
    }

    pub fn set_fan_mode(entity_id: &str, fan_mode: &str) -> Self {
        Self {
            domain: "climate".into(),
            service: Service::SetFanMode,
            payload: json!({ "entity_id": entity_id, "fan_mode": fan_mode }),
        }
    }

    pub fn set_temperature(entity_id: &str, temperature: f64) -> Self {
        Self {
            domain: "climate".into(),
            service: Service::SetTemperature,
            payload: json!({ "entity_id": entity_id, "temperature": temperature }),
        }
    }

    /// Path relative to the backend base URL.
    pub fn path(&self) -> String {
        format!("/api/services/{}/{}", self.domain, self.service)
    }

    pub fn entity_id(&self) -> &str {
        self.payload["entity_id"].as_str().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_call_uses_entity_domain() {
        let call = ServiceCall::power("input_boolean.guest_mode", Service::TurnOff);
        assert_eq!(call.path(), "/api/services/input_boolean/turn_off");
        assert_eq!(call.payload, json!({"entity_id": "input_boolean.guest_mode"}));
        assert_eq!(call.entity_id(), "input_boolean.guest_mode");
    }

    #[test]
    fn climate_calls_target_climate_domain() {
        assert_eq!(
            ServiceCall::set_hvac_mode("climate.hall", "cool").path(),
            "/api/services/climate/set_hvac_mode"
        );
        assert_eq!(
            ServiceCall::set_fan_mode("climate.hall", "low").path(),
            "/api/services/climate/set_fan_mode"
        );
        let temp = ServiceCall::set_temperature("climate.hall", 21.5);
        assert_eq!(temp.path(), "/api/services/climate/set_temperature");
        assert_eq!(temp.payload["temperature"], 21.5);
    }

    #[test]
    fn percentage_call_targets_fan_domain() {
        let call = ServiceCall::set_percentage("fan.bedroom", 50.0);
        assert_eq!(call.path(), "/api/services/fan/set_percentage");
        assert_eq!(call.payload["percentage"], 50.0);
    }

    #[test]
    fn service_serialization() {
        assert_eq!(
            serde_json::to_string(&Service::SetHvacMode).unwrap(),
            r#""set_hvac_mode""#
        );
    }
}
