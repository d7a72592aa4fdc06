/// Player action pipeline: lock, burn, reduce, persist, broadcast.
pub mod action_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Cost preset management.
pub mod preset_service;
/// Fixed-window rate limiting for the write buckets.
pub mod rate_limit;
/// Session lifecycle and listings.
pub mod session_service;
/// Row shaping and state normalization.
pub mod shaping;
/// Storage persistence supervisor.
pub mod storage_supervisor;
/// Spectator stream wiring over Server-Sent Events.
pub mod stream_service;
