//! The `services` module provides a high-level API for interacting with the database.
//! It encapsulates the query logic and transaction boundaries so that HTTP handlers
//! work with domain models only.

pub mod evaluation_service;
pub mod evaluation_tag_service;

pub use evaluation_service::EvaluationError;
