//! Mock automation backend for testing without a Home Assistant instance.
//!
//! Serves a scripted state list and records every service call attempt for
//! assertion in tests. Individual calls can be scripted to fail.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use hv_protocol::{EntityRecord, Service, ServiceCall};

use crate::client::AutomationBackend;
use crate::error::{BackendError, BackendResult};

/// Mock implementation of the `AutomationBackend` trait.
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockBackend {
    states: Mutex<Option<Vec<EntityRecord>>>,
    calls: Mutex<Vec<ServiceCall>>,
    failing: Mutex<Vec<(String, Service)>>,
    fetches: AtomicUsize,
}

impl MockBackend {
    /// Backend with no entities.
    pub fn new() -> Self {
        Self::with_states(Vec::new())
    }

    pub fn with_states(states: Vec<EntityRecord>) -> Self {
        Self {
            states: Mutex::new(Some(states)),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Backend whose state endpoint always fails.
    pub fn unreachable() -> Self {
        let backend = Self::new();
        *backend.states.lock().unwrap() = None;
        backend
    }

    /// A small house: two lights, a switch, a fan, a thermostat, a sensor,
    /// and an unsupported `sun.sun` entity.
    pub fn with_sample_home() -> Self {
        Self::with_states(vec![
            EntityRecord::new("light.living_room", "off").with_friendly_name("Living Room Light"),
            EntityRecord::new("light.kitchen", "on").with_friendly_name("Kitchen Light"),
            EntityRecord::new("switch.coffee_maker", "off").with_friendly_name("Coffee Maker"),
            EntityRecord::new("fan.bedroom", "on").with_friendly_name("Bedroom Fan"),
            EntityRecord::new("climate.office", "off").with_friendly_name("Office AC"),
            EntityRecord::new("sensor.outdoor_temp", "18.5")
                .with_friendly_name("Outdoor Temperature"),
            EntityRecord::new("sun.sun", "above_horizon"),
        ])
    }

    /// Make every `service` call on `entity_id` fail with HTTP 500.
    pub fn fail_service(&self, entity_id: impl Into<String>, service: Service) {
        self.failing.lock().unwrap().push((entity_id.into(), service));
    }

    /// Every service call attempted, in order (failed ones included).
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Attempted calls as `"<domain>/<service> <entity_id>"` strings.
    pub fn call_log(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| format!("{}/{} {}", c.domain, c.service, c.entity_id()))
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Clear recorded calls.
    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutomationBackend for MockBackend {
    async fn fetch_states(&self) -> BackendResult<Vec<EntityRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BackendError::Transport("mock backend unreachable".into()))
    }

    async fn call_service(&self, call: &ServiceCall) -> BackendResult<()> {
        self.calls.lock().unwrap().push(call.clone());
        let fails = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|(id, svc)| id == call.entity_id() && *svc == call.service);
        if fails {
            return Err(BackendError::Status {
                status: 500,
                path: call.path(),
            });
        }
        Ok(())
    }
}
