pub mod analysis;
pub mod auth;
pub mod config;
pub mod error;
pub mod llm;
pub mod places;
pub mod search;
pub mod telemetry;
