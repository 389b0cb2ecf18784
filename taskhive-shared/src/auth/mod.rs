/// Authentication utilities
///
/// This module provides the credential and token machinery for Taskhive:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`jwt`]: Signed bearer token generation and validation
/// - [`tokens`]: The per-user session token registry (issue/revoke)
/// - [`middleware`]: Axum middleware that authenticates incoming requests
///
/// # Token lifecycle
///
/// A login (or registration) issues a signed token and records it in the
/// user's token list. The middleware accepts a token only while that
/// record exists, so logging out one session never invalidates the
/// others, and logging out everywhere invalidates them all at once.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("pass1234")?;
/// assert!(verify_password("pass1234", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod tokens;
