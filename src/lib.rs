// Public API for the binary and integration tests

pub mod avatar;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod state;
pub mod types;
pub mod view;
