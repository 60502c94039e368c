//! Shared test harness for E2E scenarios.
//!
//! Starts one mock server for Home Assistant and one for Gemini, then wires
//! a real `VoicePipeline` to both through its normal config path.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use hv_agent::config::{AgentConfig, PipelineConfig};
use hv_agent::llm::LlmConfig;
use hv_agent::pipeline::VoicePipeline;
use hv_backend::BackendConfig;

pub const HA_TOKEN: &str = "ha-test-token";
pub const GEMINI_KEY: &str = "gemini-test-key";

/// A recorded `POST /api/services/...` request.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub body: Value,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

/// Harness wiring the pipeline to mock Home Assistant and Gemini servers.
pub struct TestHarness {
    pub ha: MockServer,
    pub gemini: MockServer,
    pub pipeline: VoicePipeline,
}

impl TestHarness {
    /// Both servers started, nothing mounted.
    pub async fn start() -> Self {
        Self::start_with(PipelineConfig::default()).await
    }

    pub async fn start_with(pipeline: PipelineConfig) -> Self {
        let ha = MockServer::start().await;
        let gemini = MockServer::start().await;
        let config = AgentConfig {
            backend: BackendConfig::new(ha.uri(), HA_TOKEN),
            llm: LlmConfig {
                api_key: GEMINI_KEY.into(),
                base_url: gemini.uri(),
                ..LlmConfig::default()
            },
            pipeline,
        };
        let pipeline = VoicePipeline::from_config(&config).unwrap();
        Self {
            ha,
            gemini,
            pipeline,
        }
    }

    /// Serve `states` from `GET /api/states` and accept every service call.
    pub async fn mount_home(&self, states: Value) {
        Mock::given(method("GET"))
            .and(path("/api/states"))
            .respond_with(ResponseTemplate::new(200).set_body_json(states))
            .mount(&self.ha)
            .await;
        self.mount_services(200).await;
    }

    /// `GET /api/states` fails with `status`; service calls are still accepted.
    pub async fn mount_broken_states(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/api/states"))
            .respond_with(ResponseTemplate::new(status).set_body_string("internal error"))
            .mount(&self.ha)
            .await;
        self.mount_services(200).await;
    }

    /// Fail one service endpoint ahead of the catch-all.
    pub async fn fail_service(&self, service_path: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(service_path))
            .respond_with(ResponseTemplate::new(status))
            .with_priority(1)
            .mount(&self.ha)
            .await;
    }

    async fn mount_services(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/api/services/[a-z_]+/[a-z_]+$"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!([])))
            .mount(&self.ha)
            .await;
    }

    /// Gemini answers every prompt with `text` as the single candidate part.
    pub async fn mount_model_reply(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(text)))
            .mount(&self.gemini)
            .await;
    }

    /// Gemini answers every prompt with `status`.
    pub async fn mount_model_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
            .respond_with(ResponseTemplate::new(status).set_body_string("quota exceeded"))
            .mount(&self.gemini)
            .await;
    }

    /// Run one utterance through the pipeline.
    pub async fn say(&self, utterance: &str) -> String {
        self.pipeline.process(utterance, "en", None).await
    }

    /// Service calls received by the Home Assistant mock, in arrival order.
    pub async fn service_calls(&self) -> Vec<RecordedCall> {
        received(&self.ha)
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.path().starts_with("/api/services/"))
            .map(|r| RecordedCall {
                path: r.url.path().to_string(),
                body: serde_json::from_slice(&r.body).unwrap_or(Value::Null),
                authorization: header_value(&r, "authorization"),
                content_type: header_value(&r, "content-type"),
            })
            .collect()
    }

    /// Service call paths only.
    pub async fn service_paths(&self) -> Vec<String> {
        self.service_calls()
            .await
            .into_iter()
            .map(|c| c.path)
            .collect()
    }

    /// Prompt text of every Gemini request, in arrival order.
    pub async fn prompts(&self) -> Vec<String> {
        received(&self.gemini)
            .await
            .into_iter()
            .filter_map(|r| {
                let body: Value = serde_json::from_slice(&r.body).ok()?;
                body["contents"][0]["parts"][0]["text"]
                    .as_str()
                    .map(str::to_string)
            })
            .collect()
    }
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

/// A successful generateContent response carrying `text`.
pub fn gemini_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

/// `GET /api/states` payload for a small house.
pub fn sample_states() -> Value {
    json!([
        {"entity_id": "light.living_room", "state": "off",
         "attributes": {"friendly_name": "Living Room Light"}},
        {"entity_id": "light.kitchen", "state": "on",
         "attributes": {"friendly_name": "Kitchen Light"}},
        {"entity_id": "fan.bedroom", "state": "on",
         "attributes": {"friendly_name": "Bedroom Fan", "percentage": 33}},
        {"entity_id": "climate.office", "state": "off",
         "attributes": {"friendly_name": "Office AC", "temperature": 21}},
        {"entity_id": "sensor.outdoor_temp", "state": "18.5",
         "attributes": {"friendly_name": "Outdoor Temperature", "unit_of_measurement": "°C"}},
        {"entity_id": "sun.sun", "state": "above_horizon",
         "attributes": {"friendly_name": "Sun"}},
        {"entity_id": "person.alex", "state": "home",
         "attributes": {"friendly_name": "Alex"}}
    ])
}
