use std::sync::{Arc, Mutex};

use water_trade_engine::{
    db_types::{EventKind, TradeRole},
    events::TradeTransitionEvent,
    traits::TradeGatewayError,
};

use super::{
    helpers::{sample_trade, SELLER_ID, SELLER_TOKEN},
    mocks::MockTradeGateway,
};
use crate::{
    mailer::{Mailer, MailerError, Notification},
    server::dispatch_notification,
};

/// Records every notification it is handed.
#[derive(Clone, Default)]
struct MemoryMailer {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl Mailer for MemoryMailer {
    async fn send(&self, notification: Notification) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[actix_web::test]
async fn offer_notification_reaches_the_seller() {
    let _ = env_logger::try_init().ok();
    let mut db = MockTradeGateway::new();
    db.expect_email_for_user().returning(|id| {
        assert_eq!(id, SELLER_ID);
        Ok(Some("alice@canalco.test".to_string()))
    });
    let mailer = MemoryMailer::default();
    let event = TradeTransitionEvent::new(sample_trade(), EventKind::Offer, TradeRole::Buyer);
    dispatch_notification(event, db, mailer.clone(), "https://wtg.example.com").await;
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@canalco.test");
    assert!(sent[0].body.contains(SELLER_TOKEN), "the seller's magic link must carry their token");
}

#[actix_web::test]
async fn missing_address_skips_the_notification() {
    let _ = env_logger::try_init().ok();
    let mut db = MockTradeGateway::new();
    db.expect_email_for_user().returning(|_| Ok(None));
    let mailer = MemoryMailer::default();
    let event = TradeTransitionEvent::new(sample_trade(), EventKind::Offer, TradeRole::Buyer);
    dispatch_notification(event, db, mailer.clone(), "https://wtg.example.com").await;
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn lookup_failure_is_swallowed() {
    let _ = env_logger::try_init().ok();
    let mut db = MockTradeGateway::new();
    db.expect_email_for_user().returning(|_| Err(TradeGatewayError::DatabaseError("connection reset".to_string())));
    let mailer = MemoryMailer::default();
    let event = TradeTransitionEvent::new(sample_trade(), EventKind::Decline, TradeRole::Seller);
    dispatch_notification(event, db, mailer.clone(), "https://wtg.example.com").await;
    assert!(mailer.sent.lock().unwrap().is_empty());
}
