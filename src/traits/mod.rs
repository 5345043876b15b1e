//! Trait abstractions for dependency injection and testability.
//!
//! This module provides trait-based abstractions for the data layer's two
//! external seams, enabling dependency injection, mocking, and better
//! testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST, PATCH, DELETE)
//! - [`KeyValueStorage`] - Local key/value persistence

pub mod http;
pub mod storage;

pub use http::{Headers, HttpClient, HttpError, Response};
pub use storage::{KeyValueStorage, StorageError};
