use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserRole};
use crate::validation::UserProfile;

const USER_COLUMNS: &str = r#"
    id, username, email, first_name, last_name, bio,
    profile_picture_url, linkedin_profile_url, github_profile_url,
    password_hash, role, email_verified, verification_token,
    failed_login_attempts, is_locked, is_professional, created_at, updated_at, last_login_at
"#;

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await
            .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(db)
            .await
            .context("find user by username")?;
        Ok(user)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await
            .context("count users")?;
        Ok(n)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
            .context("list users")?;
        Ok(rows)
    }

    /// Insert a new account with an already hashed password.
    ///
    /// The table lock serializes concurrent registrations so that exactly one
    /// of them can see an empty table and become the admin.
    pub async fn create(db: &PgPool, new: &NewUser) -> anyhow::Result<User> {
        let p = &new.profile;
        let mut tx = db.begin().await.context("begin tx")?;
        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .context("lock users")?;

        let sql = format!(
            r#"
            INSERT INTO users (
                username, email, first_name, last_name, bio,
                profile_picture_url, linkedin_profile_url, github_profile_url,
                password_hash, role, email_verified, verification_token
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9,
                   CASE WHEN is_first THEN $10 ELSE $11 END,
                   is_first,
                   CASE WHEN is_first THEN NULL ELSE $12 END
              FROM (SELECT NOT EXISTS (SELECT 1 FROM users) AS is_first) AS f
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&p.username)
            .bind(&p.email)
            .bind(&p.first_name)
            .bind(&p.last_name)
            .bind(&p.bio)
            .bind(&p.profile_picture_url)
            .bind(&p.linkedin_profile_url)
            .bind(&p.github_profile_url)
            .bind(&new.password_hash)
            .bind(UserRole::Admin)
            .bind(UserRole::Anonymous)
            .bind(&new.verification_token)
            .fetch_one(&mut *tx)
            .await
            .context("insert user")?;

        tx.commit().await.context("commit tx")?;
        Ok(user)
    }

    /// Writes every profile column. Callers pass a fully merged profile.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        profile: &UserProfile,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET username = $2, email = $3, first_name = $4, last_name = $5, bio = $6,
                   profile_picture_url = $7, linkedin_profile_url = $8,
                   github_profile_url = $9, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&profile.username)
            .bind(&profile.email)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.bio)
            .bind(&profile.profile_picture_url)
            .bind(&profile.linkedin_profile_url)
            .bind(&profile.github_profile_url)
            .fetch_optional(db)
            .await
            .context("update user profile")?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }

    /// Marks the email verified and promotes anonymous accounts.
    pub async fn set_email_verified(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET email_verified = TRUE,
                   verification_token = NULL,
                   role = CASE WHEN role = $2 THEN $3 ELSE role END,
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(UserRole::Anonymous)
        .bind(UserRole::Authenticated)
        .execute(db)
        .await
        .context("verify email")?;
        Ok(())
    }

    /// Bumps the failure counter and locks once it reaches `max_attempts`.
    /// Returns whether the account is now locked.
    pub async fn record_failed_login(
        db: &PgPool,
        id: Uuid,
        max_attempts: i32,
    ) -> anyhow::Result<bool> {
        let (locked,): (bool,) = sqlx::query_as(
            r#"
            UPDATE users
               SET failed_login_attempts = failed_login_attempts + 1,
                   is_locked = is_locked OR failed_login_attempts + 1 >= $2
             WHERE id = $1
            RETURNING is_locked
            "#,
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_one(db)
        .await
        .context("record failed login")?;
        Ok(locked)
    }

    pub async fn record_successful_login(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET failed_login_attempts = 0, last_login_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await
        .context("record successful login")?;
        Ok(())
    }
}
