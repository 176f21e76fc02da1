pub mod bridge;
pub mod errors;
pub mod local;
pub mod models;
pub mod ports;
pub mod registry;
pub mod twitter;
