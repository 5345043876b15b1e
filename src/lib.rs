//! Client-side data layer for the Atheno study app.
//!
//! Everything between the UI and the hosted backend lives here: a TTL
//! cache over local storage, watchable cached stores for the domain
//! collections, Supabase auth and PostgREST access, an offline write
//! queue with background sync, Gemini-backed roadmap and flashcard
//! generation, the route guard, and the pomodoro timer.
//!
//! The crate talks to the network only through the [`traits::HttpClient`]
//! trait, so every layer is testable against the mock adapters in
//! [`adapters::mock`].

pub mod adapters;
pub mod ai;
pub mod app;
pub mod auth;
pub mod backend;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod models;
pub mod pomodoro;
pub mod queue;
pub mod store;
pub mod stores;
pub mod sync;
pub mod traits;

pub use app::DataLayer;
pub use config::Config;
pub use error::{AthenoError, AthenoResult};
