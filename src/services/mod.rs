/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Periodic removal of idle game sessions.
pub mod reaper;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Term catalogue management.
pub mod term_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
