use mockall::mock;
use water_trade_engine::{
    db_types::{Listing, NewTrade, Trade, TradeEvent, TradeId, User},
    traits::{TradeGatewayError, TradeMutation},
    TradeGatewayDatabase,
};

mock! {
    pub TradeGateway {}

    impl Clone for TradeGateway {
        fn clone(&self) -> Self;
    }

    impl TradeGatewayDatabase for TradeGateway {
        fn url(&self) -> &str;
        async fn fetch_trade(&self, id: &TradeId) -> Result<Option<Trade>, TradeGatewayError>;
        async fn fetch_trades_for_user(&self, user_id: i64) -> Result<Vec<Trade>, TradeGatewayError>;
        async fn insert_trade(&self, trade: NewTrade) -> Result<Trade, TradeGatewayError>;
        async fn checked_transition(&self, id: &TradeId, mutation: TradeMutation) -> Result<Trade, TradeGatewayError>;
        async fn fetch_events(&self, id: &TradeId) -> Result<Vec<TradeEvent>, TradeGatewayError>;
        async fn fetch_listing(&self, id: i64) -> Result<Option<Listing>, TradeGatewayError>;
        async fn fetch_user(&self, id: i64) -> Result<Option<User>, TradeGatewayError>;
        async fn email_for_user(&self, user_id: i64) -> Result<Option<String>, TradeGatewayError>;
    }
}
