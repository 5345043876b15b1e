//! Concrete implementations of trait abstractions.
//!
//! This module provides production-ready adapters implementing the traits
//! defined in `crate::traits`, plus test doubles for both seams.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileStorage`] - File-backed key/value storage
//!
//! # Mock Implementations
//!
//! - [`mock::MockHttpClient`] - Configurable HTTP responses with request
//!   recording
//! - [`MemoryStorage`] - In-memory key/value storage

pub mod file_storage;
pub mod memory_storage;
pub mod mock;
pub mod reqwest_http;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use mock::MockHttpClient;
pub use reqwest_http::ReqwestHttpClient;
