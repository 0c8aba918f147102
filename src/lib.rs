pub mod config;
pub mod envelope;
pub mod error;
pub mod forwarder;
pub mod pipeline;
pub mod reports;
