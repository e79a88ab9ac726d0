pub mod analyzers;
pub mod cleaning;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod server;
pub mod services;
pub mod stats;
pub mod zones;
