use sqlx::SqliteConnection;
use wtg_common::{AcreFeet, UsdCents};

use crate::db_types::Listing;

pub async fn fetch_listing(id: i64, conn: &mut SqliteConnection) -> Result<Option<Listing>, sqlx::Error> {
    let listing = sqlx::query_as("SELECT * FROM listings WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(listing)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_listing(
    seller_user_id: i64,
    district: &str,
    water_type: Option<&str>,
    volume_af: AcreFeet,
    price_per_af: UsdCents,
    window_label: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Listing, sqlx::Error> {
    let listing = sqlx::query_as(
        r#"
            INSERT INTO listings (seller_user_id, district, water_type, volume_af, price_per_af, window_label)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(seller_user_id)
    .bind(district)
    .bind(water_type)
    .bind(volume_af)
    .bind(price_per_af)
    .bind(window_label)
    .fetch_one(conn)
    .await?;
    Ok(listing)
}
