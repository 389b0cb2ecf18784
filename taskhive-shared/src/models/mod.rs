/// Database models for Taskhive
///
/// # Models
///
/// - `user`: User accounts, profile updates, avatar storage, and the
///   cascading account deletion
/// - `task`: Per-user task records with owner-scoped queries
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Ada".to_string(),
///         age: 30,
///         email: "ada@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod user;
