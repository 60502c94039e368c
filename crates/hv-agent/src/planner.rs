//! Maps plan entries to backend service calls.
//!
//! Pure and deterministic: the same entry always yields the same calls in
//! the same order. On/off transitions always precede parameter changes for
//! an entity.

use hv_protocol::{
    Action, ActionPlan, ClimateEntry, DeviceCommand, EntityTarget, FanEntry, Service, ServiceCall,
    VALUE_CEILING, is_unspecified,
};

/// On/off call for an entry, if one is needed.
///
/// The gate is a raw comparison of the reported state string with the
/// action name; states are not normalized.
pub fn power_call(target: &EntityTarget) -> Option<ServiceCall> {
    if target.state == target.action.as_str() {
        return None;
    }
    let service = match target.action {
        Action::On => Service::TurnOn,
        Action::Off => Service::TurnOff,
        Action::Other => return None,
    };
    Some(ServiceCall::power(&target.entity_id, service))
}

fn ceiling(value: f64) -> f64 {
    value.min(VALUE_CEILING)
}

fn fan_calls(entry: &FanEntry) -> Vec<ServiceCall> {
    let target = &entry.target;
    let mut calls: Vec<_> = power_call(target).into_iter().collect();
    if !is_unspecified(entry.percentage) && target.action != Action::Other {
        calls.push(ServiceCall::set_percentage(
            &target.entity_id,
            ceiling(entry.percentage),
        ));
    }
    calls
}

fn climate_calls(entry: &ClimateEntry) -> Vec<ServiceCall> {
    let target = &entry.target;
    let mut calls: Vec<_> = power_call(target).into_iter().collect();
    if target.action == Action::Other {
        return calls;
    }
    if let Some(mode) = entry.hvac_mode.service_value() {
        calls.push(ServiceCall::set_hvac_mode(&target.entity_id, mode));
    }
    if let Some(mode) = entry.fan_mode.service_value() {
        calls.push(ServiceCall::set_fan_mode(&target.entity_id, mode));
    }
    // Sent even when the temperature is the unspecified sentinel.
    calls.push(ServiceCall::set_temperature(
        &target.entity_id,
        ceiling(entry.temperature),
    ));
    calls
}

/// Calls for one entry, in issue order.
pub fn plan_calls(command: DeviceCommand<'_>) -> Vec<ServiceCall> {
    match command {
        DeviceCommand::Switch(target) => power_call(target).into_iter().collect(),
        DeviceCommand::Fan(entry) => fan_calls(entry),
        DeviceCommand::Climate(entry) => climate_calls(entry),
    }
}

/// Calls for a whole plan: switches, then fans, then climate.
pub fn plan_all(plan: &ActionPlan) -> Vec<ServiceCall> {
    plan.commands().flat_map(plan_calls).collect()
}
