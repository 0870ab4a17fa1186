//! Conference Central kernel library.
//!
//! This library exposes the API router, models and query compiler for
//! integration testing. The server entry point is the `confcentral` binary.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod query;
pub mod routes;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use routes::app_router;
pub use state::AppState;
