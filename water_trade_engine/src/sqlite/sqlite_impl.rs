use log::debug;
use sqlx::SqlitePool;

use super::db::{listings, new_pool, trade_events, trades, users};
use crate::{
    db_types::{EventKind, Listing, NewTrade, Trade, TradeEvent, TradeId, User},
    traits::{TradeGatewayDatabase, TradeGatewayError, TradeMutation},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connect to the database at `url` and run any pending migrations.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, TradeGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&pool)
            .await
            .map_err(|e| TradeGatewayError::DatabaseError(format!("Migration failure. {e}")))?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), TradeGatewayError> {
        self.pool.close().await;
        Ok(())
    }

    // Seeding helpers. The negotiation flow itself never creates users or listings. The writes run in explicit
    // transactions so the committed row is visible to the next pool connection that looks for it.
    pub async fn insert_user(&self, email: Option<&str>, display_name: &str) -> Result<User, TradeGatewayError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(email, display_name, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_listing(
        &self,
        seller_user_id: i64,
        district: &str,
        water_type: Option<&str>,
        volume_af: wtg_common::AcreFeet,
        price_per_af: wtg_common::UsdCents,
        window_label: Option<&str>,
    ) -> Result<Listing, TradeGatewayError> {
        let mut tx = self.pool.begin().await?;
        let listing =
            listings::insert_listing(seller_user_id, district, water_type, volume_af, price_per_af, window_label, &mut tx)
                .await?;
        tx.commit().await?;
        Ok(listing)
    }
}

impl TradeGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_trade(&self, id: &TradeId) -> Result<Option<Trade>, TradeGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let trade = trades::fetch_trade(id, &mut conn).await?;
        Ok(trade)
    }

    async fn fetch_trades_for_user(&self, user_id: i64) -> Result<Vec<Trade>, TradeGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let trades = trades::fetch_trades_for_user(user_id, &mut conn).await?;
        Ok(trades)
    }

    /// Inserts the trade row and its opening OFFER audit event in one transaction, so there is never a trade
    /// without a round-1 event.
    async fn insert_trade(&self, new_trade: NewTrade) -> Result<Trade, TradeGatewayError> {
        let mut tx = self.pool.begin().await?;
        let trade = trades::insert_trade(new_trade, &mut tx).await?;
        let payload = serde_json::json!({
            "price_per_af": trade.price_per_af,
            "volume_af": trade.volume_af,
            "window_label": trade.window_label,
        });
        let _ = trade_events::insert_event(&trade.id, trade.last_actor, EventKind::Offer, &payload, &mut tx).await?;
        tx.commit().await?;
        debug!("🤝️📦️ Inserted trade {} on listing {}", trade.id, trade.listing_id);
        Ok(trade)
    }

    /// The compare-and-swap at the heart of the negotiation. The UPDATE only matches when the trade still holds
    /// the status the caller saw. Zero matched rows means either the trade vanished (never happens, rows are not
    /// deleted) or a concurrent transition won the race; we refetch to tell the two apart and report the actual
    /// status in the conflict.
    async fn checked_transition(&self, id: &TradeId, mutation: TradeMutation) -> Result<Trade, TradeGatewayError> {
        let mut tx = self.pool.begin().await?;
        let updated = trades::checked_transition(id, &mutation, &mut tx).await?;
        let trade = match updated {
            Some(trade) => trade,
            None => {
                let actual = trades::fetch_trade(id, &mut tx).await?;
                tx.rollback().await?;
                return match actual {
                    Some(t) => Err(TradeGatewayError::TransitionConflict {
                        id: id.clone(),
                        expected: mutation.expected_status,
                        actual: t.status,
                    }),
                    None => Err(TradeGatewayError::TradeNotFound(id.clone())),
                };
            },
        };
        let payload = trades::event_payload(&mutation);
        let _ = trade_events::insert_event(id, mutation.actor, mutation.kind, &payload, &mut tx).await?;
        tx.commit().await?;
        debug!("🤝️📦️ Trade {id} moved {} -> {} by {}", mutation.expected_status, trade.status, mutation.actor);
        Ok(trade)
    }

    async fn fetch_events(&self, id: &TradeId) -> Result<Vec<TradeEvent>, TradeGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let events = trade_events::fetch_events(id, &mut conn).await?;
        Ok(events)
    }

    async fn fetch_listing(&self, id: i64) -> Result<Option<Listing>, TradeGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let listing = listings::fetch_listing(id, &mut conn).await?;
        Ok(listing)
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, TradeGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(id, &mut conn).await?;
        Ok(user)
    }

    async fn email_for_user(&self, user_id: i64) -> Result<Option<String>, TradeGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let email = users::email_for_user(user_id, &mut conn).await?;
        Ok(email)
    }
}
