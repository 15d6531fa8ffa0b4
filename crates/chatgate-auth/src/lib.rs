/// Credential and identity primitives for chatgate.
///
/// - `password`: Argon2id hashing and verification of user passwords.
/// - `token`: issuing and validating the HS256 bearer tokens handed out at login.

pub mod password;
pub mod token;

pub use password::{PasswordError, hash_password, verify_password};
pub use token::{Claims, Identity, TokenConfig, TokenError, TokenService};
