use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use wtg_common::{AcreFeet, UsdCents};

use crate::helpers::{new_magic_token, new_trade_id};

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        TradeId        -------------------------------------------------------
/// An opaque unique identifier for a trade (negotiation thread). Generated once at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TradeId(pub String);

impl TradeId {
    pub fn random() -> Self {
        Self(new_trade_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TradeId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TradeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------      TradeStatus      -------------------------------------------------------
/// The negotiation state of a trade.
///
/// `Declined` is terminal. `AcceptedPendingBuyerSignature` leads toward a signature-complete state owned by a
/// separate subsystem; as far as the negotiation is concerned it is terminal too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    /// The buyer's initiating offer is on the table; the seller must respond.
    Offered,
    /// The buyer countered the seller's last terms; the seller must respond.
    CounteredByBuyer,
    /// The seller countered the buyer's last terms; the buyer must respond.
    CounteredBySeller,
    /// The seller accepted; the trade is waiting on the buyer's signature.
    AcceptedPendingBuyerSignature,
    /// Either party declined. Terminal.
    Declined,
}

impl Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TradeStatus::Offered => "OFFERED",
            TradeStatus::CounteredByBuyer => "COUNTERED_BY_BUYER",
            TradeStatus::CounteredBySeller => "COUNTERED_BY_SELLER",
            TradeStatus::AcceptedPendingBuyerSignature => "ACCEPTED_PENDING_BUYER_SIGNATURE",
            TradeStatus::Declined => "DECLINED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TradeStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFERED" => Ok(Self::Offered),
            "COUNTERED_BY_BUYER" => Ok(Self::CounteredByBuyer),
            "COUNTERED_BY_SELLER" => Ok(Self::CounteredBySeller),
            "ACCEPTED_PENDING_BUYER_SIGNATURE" => Ok(Self::AcceptedPendingBuyerSignature),
            "DECLINED" => Ok(Self::Declined),
            s => Err(ConversionError(format!("Invalid trade status: {s}"))),
        }
    }
}

//--------------------------------------       TradeRole       -------------------------------------------------------
/// Which side of the negotiation an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeRole {
    Seller,
    Buyer,
}

impl TradeRole {
    /// The party across the table. The counterparty of a transition's actor is the notification recipient.
    pub fn counterparty(&self) -> TradeRole {
        match self {
            TradeRole::Seller => TradeRole::Buyer,
            TradeRole::Buyer => TradeRole::Seller,
        }
    }
}

impl Display for TradeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeRole::Seller => write!(f, "SELLER"),
            TradeRole::Buyer => write!(f, "BUYER"),
        }
    }
}

impl FromStr for TradeRole {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SELLER" | "seller" => Ok(Self::Seller),
            "BUYER" | "buyer" => Ok(Self::Buyer),
            s => Err(ConversionError(format!("Invalid trade role: {s}"))),
        }
    }
}

//--------------------------------------       EventKind       -------------------------------------------------------
/// The kind of transition recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// The initiating offer. Only ever the first event of a trade.
    Offer,
    Counter,
    Accept,
    Decline,
}

impl EventKind {
    /// OFFER and COUNTER put new terms on the table and advance the round; ACCEPT and DECLINE do not.
    pub fn advances_round(&self) -> bool {
        matches!(self, EventKind::Offer | EventKind::Counter)
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::Offer => "OFFER",
            EventKind::Counter => "COUNTER",
            EventKind::Accept => "ACCEPT",
            EventKind::Decline => "DECLINE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFER" => Ok(Self::Offer),
            "COUNTER" => Ok(Self::Counter),
            "ACCEPT" => Ok(Self::Accept),
            "DECLINE" => Ok(Self::Decline),
            s => Err(ConversionError(format!("Invalid event kind: {s}"))),
        }
    }
}

//--------------------------------------       SignStatus      -------------------------------------------------------
/// Signature progress for one party on an accepted trade. Set by the accept transition; everything after that is the
/// signature subsystem's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignStatus {
    Pending,
    Signed,
}

//--------------------------------------         Trade         -------------------------------------------------------
/// A negotiation thread between one buyer and one seller over a water-volume transfer.
///
/// Parties and tokens are immutable after creation. Terms are replaced wholesale on every counter. `version`
/// increments on every mutation and `round` on every offer/counter. The row is never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub listing_id: i64,
    pub seller_user_id: i64,
    pub buyer_user_id: i64,
    /// Magic-link secret granting seller access. Never logged, never shown to the buyer.
    pub seller_token: String,
    /// Magic-link secret granting buyer access. Never logged, never shown to the seller.
    pub buyer_token: String,
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
}

impl Trade {
    pub fn party_id(&self, role: TradeRole) -> i64 {
        match role {
            TradeRole::Seller => self.seller_user_id,
            TradeRole::Buyer => self.buyer_user_id,
        }
    }

    pub fn token_for(&self, role: TradeRole) -> &str {
        match role {
            TradeRole::Seller => &self.seller_token,
            TradeRole::Buyer => &self.buyer_token,
        }
    }
}

//--------------------------------------        NewTrade       -------------------------------------------------------
/// A trade about to be created by a buyer's initiating offer. Tokens are generated here, before the record ever
/// touches the database, so that creation is a single insert.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub id: TradeId,
    pub listing_id: i64,
    pub seller_user_id: i64,
    pub buyer_user_id: i64,
    pub seller_token: String,
    pub buyer_token: String,
    pub district: String,
    pub water_type: Option<String>,
    pub volume_af: AcreFeet,
    pub price_per_af: UsdCents,
    pub window_label: Option<String>,
}

impl NewTrade {
    pub fn new(
        listing_id: i64,
        seller_user_id: i64,
        buyer_user_id: i64,
        district: String,
        volume_af: AcreFeet,
        price_per_af: UsdCents,
    ) -> Self {
        let mut seller_token = new_magic_token();
        let buyer_token = new_magic_token();
        // 62^32 collisions are not a practical concern, but the invariant is hard
        while seller_token == buyer_token {
            seller_token = new_magic_token();
        }
        Self {
            id: TradeId::random(),
            listing_id,
            seller_user_id,
            buyer_user_id,
            seller_token,
            buyer_token,
            district,
            water_type: None,
            volume_af,
            price_per_af,
            window_label: None,
        }
    }

    pub fn with_water_type(mut self, water_type: String) -> Self {
        self.water_type = Some(water_type);
        self
    }

    pub fn with_window_label(mut self, label: String) -> Self {
        self.window_label = Some(label);
        self
    }
}

//--------------------------------------       TradeEvent      -------------------------------------------------------
/// One entry of a trade's append-only audit trail. Events are only ever inserted, in the same database transaction
/// as the trade mutation they describe.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TradeEvent {
    pub id: i64,
    pub trade_id: TradeId,
    pub actor: TradeRole,
    pub kind: EventKind,
    /// JSON snapshot of the terms (or decision) the actor put on the table.
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl TradeEvent {
    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.payload).unwrap_or(serde_json::Value::Null)
    }
}

//--------------------------------------         User          -------------------------------------------------------
/// A marketplace user, as far as the negotiation core cares: an id and a best-effort contact address.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Notification address. May be missing; dispatch skips silently in that case.
    pub email: Option<String>,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Listing        -------------------------------------------------------
/// A seller's listing. Read-only input to trade creation: it pins the seller, district and water type.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub seller_user_id: i64,
    pub district: String,
    pub water_type: Option<String>,
    pub volume_af: AcreFeet,
    pub price_per_af: UsdCents,
    pub window_label: Option<String>,
    pub created_at: DateTime<Utc>,
}
