use std::fmt::Debug;

use log::*;
use wtg_common::{AcreFeet, UsdCents};

use crate::{
    db_types::{EventKind, NewTrade, SignStatus, Trade, TradeId, TradeRole},
    events::{EventProducers, TradeTransitionEvent},
    state_machine::next_status,
    trade_api::trade_objects::{CounterTerms, TradeView},
    traits::{TradeFlowError, TradeGatewayDatabase, TradeGatewayError, TradeMutation},
    viewer::{resolve_viewer, Viewer},
};

/// `TradeFlowApi` is the primary API for driving negotiations: creating a trade from a buyer's initiating offer,
/// applying accept/counter/decline transitions, and producing viewer-scoped reads.
///
/// It owns no state beyond a backend handle and the event producers; every call is independent.
pub struct TradeFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for TradeFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TradeFlowApi")
    }
}

impl<B> TradeFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> TradeFlowApi<B>
where B: TradeGatewayDatabase
{
    /// Open a new negotiation: the buyer's initiating offer against a listing.
    ///
    /// The listing pins the seller, district and water type; the buyer proposes volume, price and window. The trade
    /// is created with `status = OFFERED`, `round = 1`, `last_actor = BUYER`, fresh per-party tokens, and its first
    /// audit event, then the seller is notified (best-effort).
    pub async fn create_trade(
        &self,
        listing_id: i64,
        buyer_user_id: i64,
        volume_af: AcreFeet,
        price_per_af: UsdCents,
        window_label: Option<String>,
    ) -> Result<Trade, TradeFlowError> {
        let terms = CounterTerms { price_per_af, volume_af, window_label: window_label.clone() };
        terms.validate().map_err(TradeFlowError::InvalidTerms)?;
        let listing = self.db.fetch_listing(listing_id).await?.ok_or(TradeGatewayError::ListingNotFound(listing_id))?;
        if listing.seller_user_id == buyer_user_id {
            return Err(TradeFlowError::InvalidTerms("You cannot open a trade on your own listing".to_string()));
        }
        let mut new_trade =
            NewTrade::new(listing_id, listing.seller_user_id, buyer_user_id, listing.district, volume_af, price_per_af);
        if let Some(wt) = listing.water_type {
            new_trade = new_trade.with_water_type(wt);
        }
        if let Some(label) = window_label {
            new_trade = new_trade.with_window_label(label);
        }
        let trade = self.db.insert_trade(new_trade).await?;
        debug!("🤝️📦️ Trade {} opened on listing {listing_id} at round 1", trade.id);
        self.call_transition_hook(&trade, EventKind::Offer, TradeRole::Buyer).await;
        Ok(trade)
    }

    /// Apply one negotiation transition on behalf of `actor`.
    ///
    /// Validation order matters: terms are checked first (400 beats 403 for a malformed counter), then the
    /// transition table, then the conditional write. The write is a compare-and-swap on the status observed here, so
    /// of two racing calls exactly one commits; the loser gets a `Conflict`.
    ///
    /// The counterparty notification is dispatched *after* the commit and cannot fail the transition.
    pub async fn apply_transition(
        &self,
        id: &TradeId,
        actor: TradeRole,
        kind: EventKind,
        new_terms: Option<CounterTerms>,
    ) -> Result<Trade, TradeFlowError> {
        let new_terms = match kind {
            EventKind::Counter => {
                let terms = new_terms
                    .ok_or_else(|| TradeFlowError::InvalidTerms("A counteroffer requires new terms".to_string()))?;
                terms.validate().map_err(TradeFlowError::InvalidTerms)?;
                Some(terms)
            },
            _ => None,
        };
        let trade = self
            .db
            .fetch_trade(id)
            .await?
            .ok_or_else(|| TradeFlowError::NotFound(format!("Trade {id} does not exist")))?;
        let next = next_status(trade.status, actor, kind)?;
        let sign_statuses = match kind {
            EventKind::Accept => Some((SignStatus::Signed, SignStatus::Pending)),
            _ => None,
        };
        let mutation =
            TradeMutation { expected_status: trade.status, next_status: next, actor, kind, new_terms, sign_statuses };
        let updated = self.db.checked_transition(id, mutation).await?;
        debug!("🤝️📦️ Trade {id} moved {} → {} by {actor} (round {})", trade.status, updated.status, updated.round);
        self.call_transition_hook(&updated, kind, actor).await;
        Ok(updated)
    }

    pub async fn seller_accept(&self, id: &TradeId) -> Result<Trade, TradeFlowError> {
        self.apply_transition(id, TradeRole::Seller, EventKind::Accept, None).await
    }

    pub async fn seller_counter(&self, id: &TradeId, terms: CounterTerms) -> Result<Trade, TradeFlowError> {
        self.apply_transition(id, TradeRole::Seller, EventKind::Counter, Some(terms)).await
    }

    pub async fn seller_decline(&self, id: &TradeId) -> Result<Trade, TradeFlowError> {
        self.apply_transition(id, TradeRole::Seller, EventKind::Decline, None).await
    }

    pub async fn buyer_counter(&self, id: &TradeId, terms: CounterTerms) -> Result<Trade, TradeFlowError> {
        self.apply_transition(id, TradeRole::Buyer, EventKind::Counter, Some(terms)).await
    }

    pub async fn buyer_decline(&self, id: &TradeId) -> Result<Trade, TradeFlowError> {
        self.apply_transition(id, TradeRole::Buyer, EventKind::Decline, None).await
    }

    /// Fetch a trade and resolve the caller against it. Returns the raw record plus the viewer; callers decide
    /// what an unknown viewer may see.
    pub async fn trade_for_viewer(
        &self,
        id: &TradeId,
        authenticated_user_id: Option<i64>,
        token: Option<&str>,
    ) -> Result<(Trade, Viewer), TradeFlowError> {
        let trade = self
            .db
            .fetch_trade(id)
            .await?
            .ok_or_else(|| TradeFlowError::NotFound(format!("Trade {id} does not exist")))?;
        let viewer = resolve_viewer(&trade, authenticated_user_id, token);
        Ok((trade, viewer))
    }

    /// The viewer-scoped read projection, including the audit trail. Unknown viewers are rejected.
    pub async fn trade_view(
        &self,
        id: &TradeId,
        authenticated_user_id: Option<i64>,
        token: Option<&str>,
    ) -> Result<TradeView, TradeFlowError> {
        let (trade, viewer) = self.trade_for_viewer(id, authenticated_user_id, token).await?;
        if viewer.is_unknown() {
            return Err(TradeFlowError::Forbidden("You are not a party to this trade".to_string()));
        }
        let events = self.db.fetch_events(id).await?;
        TradeView::new(trade, viewer, events)
            .ok_or_else(|| TradeFlowError::Forbidden("You are not a party to this trade".to_string()))
    }

    /// All trades the user participates in, for the browse surface.
    pub async fn trades_for_user(&self, user_id: i64) -> Result<Vec<Trade>, TradeFlowError> {
        Ok(self.db.fetch_trades_for_user(user_id).await?)
    }

    async fn call_transition_hook(&self, trade: &Trade, kind: EventKind, actor: TradeRole) {
        for producer in &self.producers.trade_transition_producer {
            trace!("🤝️📬️ Notifying transition hook subscribers for trade {}", trade.id);
            let event = TradeTransitionEvent::new(trade.clone(), kind, actor);
            producer.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
