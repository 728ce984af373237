//! HTTP API endpoints

pub mod analyse;
pub mod health;

pub use analyse::{analyse_routes, AnalyseParams, AnalyseResponse};
pub use health::{health_routes, HealthResponse};
