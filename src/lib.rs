pub mod configuration;
pub mod error;
pub mod middleware;
pub mod nlp_client;
pub mod routes;
pub mod session;
pub mod startup;
pub mod telemetry;
pub mod validators;
