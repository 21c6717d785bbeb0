use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wtg_common::{AcreFeet, UsdCents};

use crate::{
    db_types::{EventKind, SignStatus, Trade, TradeEvent, TradeId, TradeRole, TradeStatus},
    state_machine::responder,
    viewer::Viewer,
};

//--------------------------------------      CounterTerms     -------------------------------------------------------
/// The replacement terms a party puts on the table with a counteroffer. District and water type are pinned by the
/// listing; price, volume and window are negotiable and replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterTerms {
    pub price_per_af: UsdCents,
    pub volume_af: AcreFeet,
    #[serde(default)]
    pub window_label: Option<String>,
}

impl CounterTerms {
    /// Field-level validation. Returns the offending field's message so handlers can surface it as a 400.
    pub fn validate(&self) -> Result<(), String> {
        if !self.price_per_af.is_positive() {
            return Err("price_per_af must be a positive number of cents".to_string());
        }
        if !self.volume_af.is_positive() {
            return Err("volume_af must be a positive number of acre-feet".to_string());
        }
        Ok(())
    }
}

//--------------------------------------       TradeView       -------------------------------------------------------
/// The read projection of a trade for a resolved viewer.
///
/// Neither party's magic-link token appears here. The viewer reached this projection with a credential they already
/// hold, and the counterparty's token must never cross the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeView {
    pub id: TradeId,
    pub listing_id: i64,
    pub district: String,
    pub water_type: Option<String>,
    pub volume_af: AcreFeet,
    pub price_per_af: UsdCents,
    pub window_label: Option<String>,
    pub status: TradeStatus,
    pub round: i64,
    pub last_actor: TradeRole,
    pub version: i64,
    pub buyer_sign_status: Option<SignStatus>,
    pub seller_sign_status: Option<SignStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The role the caller resolved to.
    pub viewer_role: TradeRole,
    /// Whose move it is, if the negotiation is still open.
    pub awaiting: Option<TradeRole>,
    pub events: Vec<TradeEventView>,
}

impl TradeView {
    pub fn new(trade: Trade, viewer: Viewer, events: Vec<TradeEvent>) -> Option<Self> {
        let viewer_role = viewer.role?;
        let awaiting = responder(trade.status);
        let events = events.into_iter().map(TradeEventView::from).collect();
        Some(Self {
            id: trade.id,
            listing_id: trade.listing_id,
            district: trade.district,
            water_type: trade.water_type,
            volume_af: trade.volume_af,
            price_per_af: trade.price_per_af,
            window_label: trade.window_label,
            status: trade.status,
            round: trade.round,
            last_actor: trade.last_actor,
            version: trade.version,
            buyer_sign_status: trade.buyer_sign_status,
            seller_sign_status: trade.seller_sign_status,
            created_at: trade.created_at,
            updated_at: trade.updated_at,
            viewer_role,
            awaiting,
            events,
        })
    }

    /// Whether the viewer is the party entitled to act right now.
    pub fn viewer_can_act(&self) -> bool {
        self.awaiting == Some(self.viewer_role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEventView {
    pub actor: TradeRole,
    pub kind: EventKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<TradeEvent> for TradeEventView {
    fn from(ev: TradeEvent) -> Self {
        let payload = ev.payload_json();
        Self { actor: ev.actor, kind: ev.kind, payload, created_at: ev.created_at }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counter_terms_validation() {
        let good = CounterTerms {
            price_per_af: UsdCents::from(55_000),
            volume_af: AcreFeet::from(90),
            window_label: Some("Jul-Sep".into()),
        };
        assert!(good.validate().is_ok());

        let bad_price = CounterTerms { price_per_af: UsdCents::from(0), ..good.clone() };
        assert!(bad_price.validate().unwrap_err().contains("price_per_af"));

        let bad_volume = CounterTerms { volume_af: AcreFeet::from(-10), ..good };
        assert!(bad_volume.validate().unwrap_err().contains("volume_af"));
    }
}
