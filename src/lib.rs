// Public API for integration tests and potential library usage
pub mod categories;
pub mod cleanup;
pub mod presence;
pub mod protocol;
pub mod state;
pub mod types;
pub mod ws;
