use sqlx::SqliteConnection;

use crate::db_types::{EventKind, TradeEvent, TradeId, TradeRole};

/// Append one audit event. There is deliberately no update or delete counterpart in this module.
pub async fn insert_event(
    trade_id: &TradeId,
    actor: TradeRole,
    kind: EventKind,
    payload: &serde_json::Value,
    conn: &mut SqliteConnection,
) -> Result<TradeEvent, sqlx::Error> {
    let event = sqlx::query_as(
        r#"
            INSERT INTO trade_events (trade_id, actor, kind, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(trade_id.as_str())
    .bind(actor)
    .bind(kind)
    .bind(payload.to_string())
    .fetch_one(conn)
    .await?;
    Ok(event)
}

pub async fn fetch_events(trade_id: &TradeId, conn: &mut SqliteConnection) -> Result<Vec<TradeEvent>, sqlx::Error> {
    let events = sqlx::query_as("SELECT * FROM trade_events WHERE trade_id = $1 ORDER BY id ASC")
        .bind(trade_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(events)
}
