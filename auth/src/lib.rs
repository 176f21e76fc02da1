//! Authentication primitives
//!
//! Building blocks shared by the identity service:
//! - Password hashing and verification (Argon2id)
//! - OAuth 2.0 PKCE verifier/challenge pairs and CSRF state
//! - Opaque session tokens
//!
//! The service owns all storage and flow logic; this crate only deals in strings.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! assert!(!hasher.verify("not_my_password", &hash).unwrap());
//! ```
//!
//! ## PKCE
//! ```
//! use auth::PkceChallenge;
//!
//! let pkce = PkceChallenge::generate();
//! assert_eq!(pkce.verifier.len(), 64);
//! assert_eq!(pkce.challenge, PkceChallenge::challenge_for(&pkce.verifier));
//! ```
//!
//! ## Session Tokens
//! ```
//! let token = auth::generate_session_token();
//! assert_eq!(token.len(), 43);
//! ```

pub mod password;
pub mod pkce;
pub mod token;

pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordParams;
pub use pkce::generate_state;
pub use pkce::PkceChallenge;
pub use token::generate_session_token;
