use crate::{
    db_types::{Listing, NewTrade, Trade, TradeEvent, TradeId, User},
    traits::{TradeGatewayError, TradeMutation},
};

/// The storage contract for the negotiation engine.
///
/// The engine treats the store as a transactional record store with one non-negotiable primitive:
/// [`checked_transition`](Self::checked_transition), a compare-and-swap on the trade's status. Everything else is
/// plain reads and inserts.
#[allow(async_fn_in_trait)]
pub trait TradeGatewayDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Fetch a trade by id, or `None` if the id does not resolve.
    async fn fetch_trade(&self, id: &TradeId) -> Result<Option<Trade>, TradeGatewayError>;

    /// All trades in which the given user is the buyer or the seller, most recently updated first.
    async fn fetch_trades_for_user(&self, user_id: i64) -> Result<Vec<Trade>, TradeGatewayError>;

    /// Store a brand-new trade and, in the same database transaction, append its initiating OFFER event.
    /// Returns the stored record.
    async fn insert_trade(&self, trade: NewTrade) -> Result<Trade, TradeGatewayError>;

    /// Execute one negotiation transition as a single atomic write.
    ///
    /// The update must be conditioned on `mutation.expected_status`: if the row's status changed since it was read,
    /// the write affects zero rows and the backend returns [`TradeGatewayError::TransitionConflict`] (or
    /// `TradeNotFound` if the row is gone, which cannot normally happen since trades are never deleted).
    ///
    /// On success the backend has, atomically: set the new status and (for counters) the replacement terms, advanced
    /// `round` iff the kind advances the round, set `last_actor`, incremented `version`, set signature statuses for
    /// accepts, and appended exactly one audit event. Returns the updated record.
    async fn checked_transition(&self, id: &TradeId, mutation: TradeMutation) -> Result<Trade, TradeGatewayError>;

    /// The full append-only audit trail for a trade, oldest first.
    async fn fetch_events(&self, id: &TradeId) -> Result<Vec<TradeEvent>, TradeGatewayError>;

    /// Fetch a listing by id, or `None` if the id does not resolve.
    async fn fetch_listing(&self, id: i64) -> Result<Option<Listing>, TradeGatewayError>;

    /// Fetch a user by id, or `None` if the id does not resolve.
    async fn fetch_user(&self, id: i64) -> Result<Option<User>, TradeGatewayError>;

    /// The notification address for a user, if they have one. Missing users and missing addresses are both `None`:
    /// dispatch treats the two identically (skip, silently).
    async fn email_for_user(&self, user_id: i64) -> Result<Option<String>, TradeGatewayError>;
}
