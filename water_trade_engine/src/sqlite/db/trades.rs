use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{EventKind, NewTrade, Trade, TradeId},
    traits::{TradeGatewayError, TradeMutation},
};

/// Insert a brand-new trade. The schema defaults take care of status/round/last_actor/version, so a freshly
/// inserted row is already a valid round-1 offer.
pub async fn insert_trade(trade: NewTrade, conn: &mut SqliteConnection) -> Result<Trade, TradeGatewayError> {
    let trade = sqlx::query_as(
        r#"
            INSERT INTO trades (
                id,
                listing_id,
                seller_user_id,
                buyer_user_id,
                seller_token,
                buyer_token,
                district,
                water_type,
                volume_af,
                price_per_af,
                window_label
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(trade.id)
    .bind(trade.listing_id)
    .bind(trade.seller_user_id)
    .bind(trade.buyer_user_id)
    .bind(trade.seller_token)
    .bind(trade.buyer_token)
    .bind(trade.district)
    .bind(trade.water_type)
    .bind(trade.volume_af)
    .bind(trade.price_per_af)
    .bind(trade.window_label)
    .fetch_one(conn)
    .await?;
    Ok(trade)
}

pub async fn fetch_trade(id: &TradeId, conn: &mut SqliteConnection) -> Result<Option<Trade>, sqlx::Error> {
    let trade = sqlx::query_as("SELECT * FROM trades WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(trade)
}

/// Trades where the user sits on either side of the table, most recently updated first.
pub async fn fetch_trades_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Trade>, sqlx::Error> {
    let trades = sqlx::query_as(
        "SELECT * FROM trades WHERE seller_user_id = $1 OR buyer_user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(trades)
}

/// The conditional transition write: `UPDATE ... WHERE id = ? AND status = ?`.
///
/// Returns `None` when zero rows matched, i.e. the status changed under us (or the row does not exist); the caller
/// decides which of the two it was. This single statement is what serialises racing transitions: the database
/// executes row updates atomically, so exactly one of two concurrent writers finds the expected status.
pub async fn checked_transition(
    id: &TradeId,
    mutation: &TradeMutation,
    conn: &mut SqliteConnection,
) -> Result<Option<Trade>, TradeGatewayError> {
    let mut builder = QueryBuilder::new("UPDATE trades SET updated_at = CURRENT_TIMESTAMP, version = version + 1, ");
    let mut set_clause = builder.separated(", ");
    set_clause.push("status = ");
    set_clause.push_bind_unseparated(mutation.next_status);
    set_clause.push("last_actor = ");
    set_clause.push_bind_unseparated(mutation.actor);
    if mutation.kind.advances_round() {
        set_clause.push("round = round + 1");
    }
    if let Some(terms) = &mutation.new_terms {
        set_clause.push("price_per_af = ");
        set_clause.push_bind_unseparated(terms.price_per_af);
        set_clause.push("volume_af = ");
        set_clause.push_bind_unseparated(terms.volume_af);
        set_clause.push("window_label = ");
        set_clause.push_bind_unseparated(terms.window_label.clone());
    }
    if let Some((seller, buyer)) = mutation.sign_statuses {
        set_clause.push("seller_sign_status = ");
        set_clause.push_bind_unseparated(seller);
        set_clause.push("buyer_sign_status = ");
        set_clause.push_bind_unseparated(buyer);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str());
    builder.push(" AND status = ");
    builder.push_bind(mutation.expected_status);
    builder.push(" RETURNING *");
    trace!("📝️ Executing transition: {}", builder.sql());
    let trade = builder.build_query_as::<Trade>().fetch_optional(conn).await?;
    Ok(trade)
}

/// The JSON payload recorded in the audit trail for a transition: the terms that went on the table, or `{}` for
/// accept/decline, which change no terms.
pub fn event_payload(mutation: &TradeMutation) -> serde_json::Value {
    match (&mutation.kind, &mutation.new_terms) {
        (EventKind::Counter, Some(terms)) => serde_json::json!({
            "price_per_af": terms.price_per_af,
            "volume_af": terms.volume_af,
            "window_label": terms.window_label,
        }),
        _ => serde_json::json!({}),
    }
}
