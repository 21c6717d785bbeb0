use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::Utc;
use log::debug;
use water_trade_engine::db_types::{Trade, TradeId, TradeRole, TradeStatus};
use wtg_common::{AcreFeet, Secret, UsdCents};

use crate::{auth::TokenIssuer, config::AuthConfig};

pub const SELLER_ID: i64 = 10;
pub const BUYER_ID: i64 = 20;
pub const SELLER_TOKEN: &str = "sellersellersellersellerseller12";
pub const BUYER_TOKEN: &str = "buyerbuyerbuyerbuyerbuyerbuyer12";

// A fixed signing secret for tests. DO NOT re-use this anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { session_secret: Secret::new("0123456789abcdef0123456789abcdef".to_string()) }
}

pub fn issue_session(user_id: i64) -> String {
    let issuer = TokenIssuer::new(&get_auth_config());
    issuer.issue_token(user_id, None).expect("Failed to issue session token")
}

pub fn sample_trade() -> Trade {
    Trade {
        id: TradeId("cafebabe12345678".to_string()),
        listing_id: 1,
        seller_user_id: SELLER_ID,
        buyer_user_id: BUYER_ID,
        seller_token: SELLER_TOKEN.to_string(),
        buyer_token: BUYER_TOKEN.to_string(),
        district: "Westlands".to_string(),
        water_type: Some("surface".to_string()),
        volume_af: AcreFeet::from(100),
        price_per_af: UsdCents::from(50_000),
        window_label: Some("Jul-Sep".to_string()),
        status: TradeStatus::Offered,
        round: 1,
        last_actor: TradeRole::Buyer,
        version: 1,
        buyer_sign_status: None,
        seller_sign_status: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub async fn get_request(
    session: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::get().uri(path);
    if !session.is_empty() {
        req = req.insert_header((crate::auth::SESSION_HEADER, session));
    }
    send(req, configure).await
}

pub async fn post_request(
    session: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if !session.is_empty() {
        req = req.insert_header((crate::auth::SESSION_HEADER, session));
    }
    send(req, configure).await
}

async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = req.to_request();
    let issuer = TokenIssuer::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(issuer)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
