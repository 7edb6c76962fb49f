//! # User Repository
//!
//! Database access for local accounts.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{create_pool, UserRepository, UserForCreate};
//! # async fn example() -> lib_core::Result<()> {
//! let pool = create_pool("sqlite:data/users.db").await?;
//!
//! let user = UserRepository::create(
//!     &pool,
//!     UserForCreate::new("alice@example.com".into(), "$argon2id$...".into()),
//! ).await?;
//!
//! let found = UserRepository::find_by_email(&pool, "alice@example.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use super::models::{User, UserForCreate};
use super::DbPool;
use sqlx::{query_as, query_scalar};

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by their email address.
    ///
    /// Callers pass an already-normalized address; the lookup is exact.
    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT id, email, password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by primary key.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        query_as::<_, User>("SELECT id, email, password_hash FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new user and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns a database error carrying a UNIQUE violation when the email
    /// is already registered; see [`is_unique_violation`].
    pub async fn create(pool: &DbPool, user_data: UserForCreate) -> Result<User, sqlx::Error> {
        query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES (?, ?) \
             RETURNING id, email, password_hash",
        )
        .bind(&user_data.email)
        .bind(&user_data.password_hash)
        .fetch_one(pool)
        .await
    }

    /// Number of registered users.
    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(pool).await
    }
}

/// True when `err` is a UNIQUE constraint violation (duplicate email).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
