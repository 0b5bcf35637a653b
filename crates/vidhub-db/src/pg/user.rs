//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::UserRow;
use crate::repo::{CreateUser, UserRepository};

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, \
                            password_hash, refresh_token_hash, created_at, updated_at";

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_returning(&self, sql: &str, id: Uuid, value: &str) -> DbResult<UserRow> {
        sqlx::query_as::<_, UserRow>(sql)
            .bind(value)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_identity(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> DbResult<Option<UserRow>> {
        // NULL binds compare as unknown, so an absent key never matches.
        // A username hit wins over an email hit on a different row.
        let user = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE username = $1 OR email = $2
            ORDER BY (username = $1) IS TRUE DESC
            LIMIT 1
            "#
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(token_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn swap_refresh_token(&self, id: Uuid, expected: &str, new: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET refresh_token_hash = $1, updated_at = NOW()
            WHERE id = $2 AND refresh_token_hash = $3
            "#,
        )
        .bind(new)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn update_details(&self, id: Uuid, full_name: &str, email: &str) -> DbResult<UserRow> {
        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET full_name = $1, email = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(full_name)
        .bind(email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    async fn update_avatar(&self, id: Uuid, url: &str) -> DbResult<UserRow> {
        self.update_returning(
            &format!(
                "UPDATE users SET avatar = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
            ),
            id,
            url,
        )
        .await
    }

    async fn update_cover_image(&self, id: Uuid, url: &str) -> DbResult<UserRow> {
        self.update_returning(
            &format!(
                "UPDATE users SET cover_image = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
            ),
            id,
            url,
        )
        .await
    }
}
