//! The viewer resolver: who is the caller, relative to one specific trade?
//!
//! Two credentials can arrive with a request: an authenticated user id (from the session layer) and a bearer token
//! (from a magic link). Identity is checked *fully* before any token comparison. That ordering is a security
//! property, not a convenience: a signed-in seller who somehow holds the buyer's leaked token must still resolve as
//! seller, so "first match wins" over a flat credential list would not be good enough.
use serde::{Deserialize, Serialize};

use crate::db_types::{Trade, TradeRole};

/// How the viewer's role was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    Auth,
    Token,
    None,
}

/// The resolved role of the current caller against a specific trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub role: Option<TradeRole>,
    pub via: ResolvedVia,
}

impl Viewer {
    pub const UNKNOWN: Viewer = Viewer { role: None, via: ResolvedVia::None };

    pub fn is_unknown(&self) -> bool {
        self.role.is_none()
    }
}

/// Resolve the caller's role for `trade`.
///
/// Never errors: an unresolvable caller is `Viewer::UNKNOWN`, and it is the *caller's* job to reject unknown
/// viewers before mutating anything. Read-only surfaces may instead degrade to an "invalid or expired link" view.
pub fn resolve_viewer(trade: &Trade, authenticated_user_id: Option<i64>, presented_token: Option<&str>) -> Viewer {
    if let Some(uid) = authenticated_user_id {
        if uid == trade.seller_user_id {
            return Viewer { role: Some(TradeRole::Seller), via: ResolvedVia::Auth };
        }
        if uid == trade.buyer_user_id {
            return Viewer { role: Some(TradeRole::Buyer), via: ResolvedVia::Auth };
        }
    }
    if let Some(token) = presented_token {
        if token == trade.seller_token {
            return Viewer { role: Some(TradeRole::Seller), via: ResolvedVia::Token };
        }
        if token == trade.buyer_token {
            return Viewer { role: Some(TradeRole::Buyer), via: ResolvedVia::Token };
        }
    }
    Viewer::UNKNOWN
}
