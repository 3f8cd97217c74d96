//! Credential and session module

pub mod manager;
pub mod state;

pub use manager::{Generation, SessionManager};
pub use state::Session;
