//! Unified error handling for the Atheno data layer.
//!
//! This module provides a small error architecture in layers:
//!
//! - **Error Categories**: high-level classification for handling decisions
//! - **Domain-specific Errors**: Network, Auth, Backend, Ai
//! - **Unified Error Type**: [`AthenoError`] consolidates all error types
//! - **Result Type Alias**: [`AthenoResult<T>`] for consistent return types
//!
//! # Error Categories
//!
//! Errors are categorized to enable consistent handling:
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout | Yes |
//! | Auth | Session expired or invalid | Sometimes |
//! | Server | Backend errors (5xx) | Yes |
//! | Client | Programming/validation errors | No |
//! | Storage | Local persistence errors | Sometimes |
//!
//! The per-error `user_message()` strings carry the wording the web
//! client surfaced for 401/403/404 and database failures.

mod ai;
mod atheno_error;
mod auth;
mod backend;
mod category;
mod network;
mod result;

pub use ai::AiError;
pub use atheno_error::AthenoError;
pub use auth::AuthError;
pub use backend::BackendError;
pub use category::ErrorCategory;
pub use network::NetworkError;
pub use result::AthenoResult;
