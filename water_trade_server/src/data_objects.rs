use serde::{Deserialize, Serialize};
use wtg_common::{AcreFeet, UsdCents};

/// The body of `POST /api/trades`. The buyer names the listing and their opening terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTradeRequest {
    pub listing_id: i64,
    pub volume_af: AcreFeet,
    pub price_per_af: UsdCents,
    #[serde(default)]
    pub window_label: Option<String>,
}

/// Magic-link credential carried in the query string, e.g. `?token=...`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Query parameters on the magic-link landing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MagicLinkQuery {
    pub token: Option<String>,
    /// `accept` or `decline` executes the transition straight from the email link.
    pub action: Option<String>,
}

/// The body of `POST /auth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
