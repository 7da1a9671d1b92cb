/// Health check payload.
pub mod health;
/// Match phase as shown to clients.
pub mod phase;
/// Term catalogue payloads.
pub mod term;
/// Custom validators for request payloads.
pub mod validation;
/// WebSocket message envelopes.
pub mod ws;
