use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use water_trade_engine::{
    db_types::{Listing, User},
    events::EventProducers,
    SqliteDatabase, TradeFlowApi,
};
use wtg_common::{AcreFeet, UsdCents};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🪛️ Logging initialised");
    create_database(url).await;
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir().join(format!("wtg_test_{}", rand::random::<u64>()));
    std::fs::create_dir_all(&dir).expect("Error creating test database directory");
    format!("sqlite://{}/store.db", dir.display())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

pub struct Marketplace {
    pub api: TradeFlowApi<SqliteDatabase>,
    pub seller: User,
    pub buyer: User,
    pub listing: Listing,
}

/// A fresh database with one seller, one buyer, and a 100 AF listing in the Westlands district.
pub async fn setup() -> Marketplace {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> Marketplace {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let seller = db.insert_user(Some("alice@canalco.test"), "Alice").await.expect("Error seeding seller");
    let buyer = db.insert_user(Some("bob@farms.test"), "Bob").await.expect("Error seeding buyer");
    let listing = db
        .insert_listing(
            seller.id,
            "Westlands",
            Some("surface"),
            AcreFeet::from(100),
            UsdCents::from(50_000),
            Some("Jul-Sep"),
        )
        .await
        .expect("Error seeding listing");
    let api = TradeFlowApi::new(db, producers);
    Marketplace { api, seller, buyer, listing }
}

pub async fn tear_down(mut market: Marketplace) {
    use water_trade_engine::TradeGatewayDatabase;
    let url = market.api.db().url().to_string();
    if let Err(e) = market.api.db_mut().close().await {
        error!("🪛️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🪛️ Error dropping database {url}: {e:?}");
    }
}
