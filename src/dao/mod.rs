/// Database model definitions.
pub mod models;
/// Scorepad and term catalogue storage backends.
pub mod scorepad_store;
/// Storage abstraction layer for database operations.
pub mod storage;
