pub mod config;
pub mod error;
pub mod message;
pub mod platform;
pub mod push;
pub mod snapshot;
