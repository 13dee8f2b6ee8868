pub mod commands;
pub mod configuration;
pub mod constants;
pub mod database;
pub mod errors;
pub mod flow;
pub mod lead_sink;
pub mod openapi;
pub mod otp_client;
pub mod routes;
pub mod schemas;
pub mod startup;
pub mod telemetry;
pub mod utils;
