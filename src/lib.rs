pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod retry;
pub mod server;
pub mod session;
pub mod tools;
