// Public API for integration tests and the server binary

pub mod api;
pub mod config;
pub mod protocol;
pub mod state;
pub mod store;
pub mod types;
pub mod ws;
