pub mod authentication;
pub mod session;
pub mod user;
