//! End-to-end tests for HearthVoice.
//!
//! The tests in `tests/` run the real `VoicePipeline`, `RestBackend`, and
//! `GeminiClient` against wiremock stand-ins for Home Assistant and the
//! Gemini API.
