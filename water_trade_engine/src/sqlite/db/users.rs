use sqlx::SqliteConnection;

use crate::db_types::User;

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn email_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let email: Option<Option<String>> =
        sqlx::query_scalar("SELECT email FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(email.flatten())
}

pub async fn insert_user(
    email: Option<&str>,
    display_name: &str,
    conn: &mut SqliteConnection,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as("INSERT INTO users (email, display_name) VALUES ($1, $2) RETURNING *")
        .bind(email)
        .bind(display_name)
        .fetch_one(conn)
        .await?;
    Ok(user)
}
