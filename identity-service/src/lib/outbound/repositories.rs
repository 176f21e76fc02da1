pub mod memory;
pub mod session;
pub mod user;

pub use memory::InMemorySessionStore;
pub use memory::InMemoryUserRepository;
pub use session::PostgresSessionStore;
pub use user::PostgresUserRepository;
