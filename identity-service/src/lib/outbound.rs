pub mod repositories;
pub mod twitter;
