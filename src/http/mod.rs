pub mod error;
pub mod overrides;
pub mod server;
