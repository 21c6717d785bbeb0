use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use water_trade_engine::{
    events::{EventHandlers, EventHooks, EventProducers, TradeTransitionEvent},
    SqliteDatabase,
    TradeFlowApi,
    TradeGatewayDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    mailer::{render_notification, Mailer, NotificationMailer},
    routes::{
        health,
        AcceptTradeRoute,
        CounterTradeRoute,
        CreateTradeRoute,
        DeclineTradeRoute,
        LoginRoute,
        MagicLinkRoute,
        MyTradesRoute,
        TradeByIdRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    let mailer = NotificationMailer::from_config(&config.mailer);
    install_notification_hook(&mut hooks, db.clone(), mailer, config.public_base_url.clone());
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Subscribe the notification dispatcher to trade transitions.
///
/// The hook runs on its own task after the transition has committed. Anything that goes wrong in here, a missing
/// email address, a provider outage, a serialization bug, is logged and dropped.
///
/// The closure is boxed as a `Send` future, so it is built over concrete types; `dispatch_notification` below
/// stays generic for the tests.
pub fn install_notification_hook(
    hooks: &mut EventHooks,
    db: SqliteDatabase,
    mailer: NotificationMailer,
    base_url: String,
) {
    hooks.on_trade_transition(move |event| {
        let db = db.clone();
        let mailer = mailer.clone();
        let base_url = base_url.clone();
        async move {
            dispatch_notification(event, db, mailer, &base_url).await;
        }
        .boxed()
    });
}

pub(crate) async fn dispatch_notification<B, M>(event: TradeTransitionEvent, db: B, mailer: M, base_url: &str)
where
    B: TradeGatewayDatabase,
    M: Mailer,
{
    let recipient = event.counterparty();
    let trade_id = event.trade.id.clone();
    let user_id = event.trade.party_id(recipient);
    let email = match db.email_for_user(user_id).await {
        Ok(Some(email)) => email,
        Ok(None) => {
            info!("📧️ No email address for {recipient} on trade {trade_id}. Skipping notification.");
            return;
        },
        Err(e) => {
            warn!("📧️ Could not look up the {recipient} address for trade {trade_id}. {e}");
            return;
        },
    };
    let notification = render_notification(&event, &email, base_url);
    match mailer.send(notification).await {
        Ok(()) => debug!("📧️ Notified {recipient} about {} on trade {trade_id}", event.kind),
        Err(e) => warn!("📧️ Dropped {} notification for trade {trade_id}. {e}", event.kind),
    }
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<actix_web::dev::Server, ServerError> {
    let srv = HttpServer::new(move || {
        let trades_api = TradeFlowApi::new(db.clone(), producers.clone());
        let token_issuer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("wtg::access_log"))
            .app_data(web::Data::new(trades_api))
            .app_data(web::Data::new(token_issuer));
        let api_scope = web::scope("/api")
            .service(CreateTradeRoute::<SqliteDatabase>::new())
            .service(MyTradesRoute::<SqliteDatabase>::new())
            .service(TradeByIdRoute::<SqliteDatabase>::new())
            .service(AcceptTradeRoute::<SqliteDatabase>::new())
            .service(CounterTradeRoute::<SqliteDatabase>::new())
            .service(DeclineTradeRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(MagicLinkRoute::<SqliteDatabase>::new())
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
