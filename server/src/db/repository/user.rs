//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{User, UserCreate, UserRole};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, username, display_name, hash_pass, role, is_active, created_at, updated_at FROM user";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{} WHERE id = ?", USER_SELECT);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let sql = format!("{} WHERE username = ? LIMIT 1", USER_SELECT);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    // Check duplicate username
    if find_by_username(pool, &data.username).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Username '{}' already exists",
            data.username
        )));
    }

    let hash_pass = crate::auth::password::hash_password(&data.password)
        .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;

    let display_name = data.display_name.unwrap_or_else(|| data.username.clone());
    let role = data.role.unwrap_or(UserRole::Customer);
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();

    sqlx::query(
        "INSERT INTO user (id, username, display_name, hash_pass, role, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
    )
    .bind(id)
    .bind(&data.username)
    .bind(&display_name)
    .bind(&hash_pass)
    .bind(role)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}
