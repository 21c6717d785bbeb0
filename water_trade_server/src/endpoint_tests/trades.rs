use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use water_trade_engine::{
    db_types::{Listing, TradeStatus},
    events::EventProducers,
    traits::TradeGatewayError,
    TradeFlowApi,
};
use wtg_common::{AcreFeet, UsdCents};

use super::{
    helpers::{get_request, issue_session, post_request, sample_trade, BUYER_ID, SELLER_ID, SELLER_TOKEN},
    mocks::MockTradeGateway,
};
use crate::routes::{
    health,
    AcceptTradeRoute,
    CounterTradeRoute,
    CreateTradeRoute,
    LoginRoute,
    MagicLinkRoute,
    TradeByIdRoute,
};

fn sample_listing() -> Listing {
    Listing {
        id: 1,
        seller_user_id: SELLER_ID,
        district: "Westlands".to_string(),
        water_type: Some("surface".to_string()),
        volume_af: AcreFeet::from(100),
        price_per_af: UsdCents::from(50_000),
        window_label: Some("Jul-Sep".to_string()),
        created_at: Utc::now(),
    }
}

fn trade_api(db: MockTradeGateway) -> web::Data<TradeFlowApi<MockTradeGateway>> {
    web::Data::new(TradeFlowApi::new(db, EventProducers::default()))
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/health", |cfg| {
        cfg.service(health);
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn fetch_trade_as_buyer() {
    let _ = env_logger::try_init().ok();
    let session = issue_session(BUYER_ID);
    let (status, body) = get_request(&session, "/trades/cafebabe12345678", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["viewer_role"], "BUYER");
    assert_eq!(json["status"], "OFFERED");
    assert_eq!(json["awaiting"], "SELLER");
    assert!(!body.contains("token"), "tokens must never appear in a trade view: {body}");
}

#[actix_web::test]
async fn fetch_trade_with_seller_token() {
    let _ = env_logger::try_init().ok();
    let path = format!("/trades/cafebabe12345678?token={SELLER_TOKEN}");
    let (status, body) = get_request("", &path, configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["viewer_role"], "SELLER");
}

#[actix_web::test]
async fn fetch_trade_without_credentials() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/trades/cafebabe12345678", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("not a party"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_trade_with_wrong_token() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("", "/trades/cafebabe12345678?token=wrong-token", configure_reads)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn fetch_unknown_trade() {
    let _ = env_logger::try_init().ok();
    let session = issue_session(BUYER_ID);
    let (status, _) = get_request(&session, "/trades/0000000000000000", configure_missing).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn create_trade_requires_session() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({ "listing_id": 1, "volume_af": 100, "price_per_af": 50_000 });
    let (status, _) = post_request("", "/trades", body, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_trade() {
    let _ = env_logger::try_init().ok();
    let session = issue_session(BUYER_ID);
    let body = serde_json::json!({ "listing_id": 1, "volume_af": 100, "price_per_af": 50_000, "window_label": "Jul-Sep" });
    let (status, body) = post_request(&session, "/trades", body, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "OFFERED");
    assert_eq!(json["round"], 1);
    assert_eq!(json["viewer_role"], "BUYER");
}

#[actix_web::test]
async fn create_trade_on_own_listing() {
    let _ = env_logger::try_init().ok();
    let session = issue_session(SELLER_ID);
    let body = serde_json::json!({ "listing_id": 1, "volume_af": 100, "price_per_af": 50_000 });
    let (status, body) = post_request(&session, "/trades", body, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("own listing"), "unexpected body: {body}");
}

#[actix_web::test]
async fn accept_with_seller_token() {
    let _ = env_logger::try_init().ok();
    let path = format!("/trades/cafebabe12345678/accept?token={SELLER_TOKEN}");
    let (status, body) =
        post_request("", &path, serde_json::json!({}), configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["trade"]["status"], "ACCEPTED_PENDING_BUYER_SIGNATURE");
    assert_eq!(json["trade"]["seller_sign_status"], "SIGNED");
    assert_eq!(json["trade"]["buyer_sign_status"], "PENDING");
}

#[actix_web::test]
async fn buyer_cannot_accept() {
    let _ = env_logger::try_init().ok();
    let session = issue_session(BUYER_ID);
    let (status, _) = post_request(&session, "/trades/cafebabe12345678/accept", serde_json::json!({}), configure_reads)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn counter_with_invalid_terms() {
    let _ = env_logger::try_init().ok();
    let path = format!("/trades/cafebabe12345678/counter?token={SELLER_TOKEN}");
    let terms = serde_json::json!({ "price_per_af": 0, "volume_af": 90 });
    let (status, body) = post_request("", &path, terms, configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("price_per_af"), "unexpected body: {body}");
}

#[actix_web::test]
async fn racing_accept_returns_conflict() {
    let _ = env_logger::try_init().ok();
    let path = format!("/trades/cafebabe12345678/accept?token={SELLER_TOKEN}");
    let (status, body) =
        post_request("", &path, serde_json::json!({}), configure_conflict).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("changed since you last looked"), "unexpected body: {body}");
}

#[actix_web::test]
async fn login_issues_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/auth", serde_json::json!({ "user_id": BUYER_ID }), configure_auth).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["token"].as_str().unwrap().contains('.'));
}

#[actix_web::test]
async fn login_unknown_user() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request("", "/auth", serde_json::json!({ "user_id": 999 }), configure_auth).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn magic_link_with_bad_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/t/cafebabe12345678?token=wrong", configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("invalid or expired"), "unexpected body: {body}");
}

#[actix_web::test]
async fn magic_link_accept_executes_on_load() {
    let _ = env_logger::try_init().ok();
    let path = format!("/t/cafebabe12345678?token={SELLER_TOKEN}&action=accept");
    let (status, body) = get_request("", &path, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("waiting on the buyer's signature"), "unexpected body: {body}");
}

#[actix_web::test]
async fn magic_link_decline_executes_on_load() {
    let _ = env_logger::try_init().ok();
    let path = format!("/t/cafebabe12345678?token={SELLER_TOKEN}&action=decline");
    let (status, body) = get_request("", &path, configure_transitions).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("This trade has been declined"), "unexpected body: {body}");
}

#[actix_web::test]
async fn magic_link_shows_trade_to_token_holder() {
    let _ = env_logger::try_init().ok();
    let path = format!("/t/cafebabe12345678?token={SELLER_TOKEN}");
    let (status, body) = get_request("", &path, configure_reads).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Westlands"), "unexpected body: {body}");
    assert!(body.contains("It is your move"), "unexpected body: {body}");
}

//----------------------------------------------   Fixtures  ----------------------------------------------------

fn configure_reads(cfg: &mut ServiceConfig) {
    let mut db = MockTradeGateway::new();
    db.expect_fetch_trade().returning(|_| Ok(Some(sample_trade())));
    db.expect_fetch_events().returning(|_| Ok(vec![]));
    cfg.service(TradeByIdRoute::<MockTradeGateway>::new())
        .service(AcceptTradeRoute::<MockTradeGateway>::new())
        .service(CounterTradeRoute::<MockTradeGateway>::new())
        .service(MagicLinkRoute::<MockTradeGateway>::new())
        .app_data(trade_api(db));
}

fn configure_missing(cfg: &mut ServiceConfig) {
    let mut db = MockTradeGateway::new();
    db.expect_fetch_trade().returning(|_| Ok(None));
    cfg.service(TradeByIdRoute::<MockTradeGateway>::new()).app_data(trade_api(db));
}

fn configure_create(cfg: &mut ServiceConfig) {
    let mut db = MockTradeGateway::new();
    db.expect_fetch_listing().returning(|_| Ok(Some(sample_listing())));
    db.expect_insert_trade().returning(|_| Ok(sample_trade()));
    db.expect_fetch_trade().returning(|_| Ok(Some(sample_trade())));
    db.expect_fetch_events().returning(|_| Ok(vec![]));
    cfg.service(CreateTradeRoute::<MockTradeGateway>::new()).app_data(trade_api(db));
}

fn configure_transitions(cfg: &mut ServiceConfig) {
    // A stateful mock: the transition must be visible to the view refetch that follows it.
    let state = std::sync::Arc::new(std::sync::Mutex::new(sample_trade()));
    let reads = state.clone();
    let writes = state.clone();
    let mut db = MockTradeGateway::new();
    db.expect_fetch_trade().returning(move |_| Ok(Some(reads.lock().unwrap().clone())));
    db.expect_checked_transition().returning(move |_, m| {
        let mut trade = writes.lock().unwrap();
        trade.status = m.next_status;
        trade.last_actor = m.actor;
        trade.version += 1;
        if let Some((seller, buyer)) = m.sign_statuses {
            trade.seller_sign_status = Some(seller);
            trade.buyer_sign_status = Some(buyer);
        }
        Ok(trade.clone())
    });
    db.expect_fetch_events().returning(|_| Ok(vec![]));
    cfg.service(AcceptTradeRoute::<MockTradeGateway>::new())
        .service(MagicLinkRoute::<MockTradeGateway>::new())
        .app_data(trade_api(db));
}

fn configure_conflict(cfg: &mut ServiceConfig) {
    let mut db = MockTradeGateway::new();
    db.expect_fetch_trade().returning(|_| Ok(Some(sample_trade())));
    db.expect_checked_transition().returning(|id, m| {
        Err(TradeGatewayError::TransitionConflict {
            id: id.clone(),
            expected: m.expected_status,
            actual: TradeStatus::Declined,
        })
    });
    cfg.service(AcceptTradeRoute::<MockTradeGateway>::new()).app_data(trade_api(db));
}

fn configure_auth(cfg: &mut ServiceConfig) {
    let mut db = MockTradeGateway::new();
    db.expect_fetch_user().returning(|id| {
        if id == BUYER_ID {
            Ok(Some(water_trade_engine::db_types::User {
                id,
                email: Some("bob@farms.test".to_string()),
                display_name: "Bob".to_string(),
                created_at: Utc::now(),
            }))
        } else {
            Ok(None)
        }
    });
    cfg.service(LoginRoute::<MockTradeGateway>::new()).app_data(trade_api(db));
}
