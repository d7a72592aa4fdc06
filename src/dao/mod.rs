/// Database model definitions.
pub mod models;
/// Session, preset, and identity storage operations.
pub mod session_store;
/// Storage abstraction layer for database operations.
pub mod storage;
