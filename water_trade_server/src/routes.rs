//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every trade route resolves the caller before touching trade data. A caller is either a logged-in user (session
//! token in the `wtg-session` header) or the holder of a magic-link token (`?token=` in the query string). The
//! session is checked first; the token is only consulted when no party matched the session.
use std::str::FromStr;

use actix_web::{get, http::header::ContentType, web, HttpResponse, Responder};
use log::*;
use water_trade_engine::{
    db_types::{EventKind, Trade, TradeId, TradeRole, TradeStatus},
    CounterTerms,
    TradeFlowApi,
    TradeGatewayDatabase,
};

use crate::{
    auth::{MaybeSession, SessionClaims, TokenIssuer},
    data_objects::{LoginRequest, LoginResponse, MagicLinkQuery, NewTradeRequest, TokenQuery},
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(login => Post "/auth" impl TradeGatewayDatabase);
/// Route handler for the auth endpoint
///
/// Exchanges a marketplace user id for a signed session token. There is no password check here; the gateway sits
/// behind the marketplace's own identity layer, which vouches for the caller before this endpoint is reachable.
/// The session token is presented in the `wtg-session` header on subsequent requests.
pub async fn login<B: TradeGatewayDatabase>(
    api: web::Data<TradeFlowApi<B>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServerError> {
    let user_id = body.into_inner().user_id;
    trace!("💻️ Received auth request for user {user_id}");
    let user = api
        .db()
        .fetch_user(user_id)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?
        .ok_or(ServerError::AuthenticationError(AuthError::AccountNotFound))?;
    let token = signer.issue_token(user.id, None)?;
    debug!("💻️ Issued session token for user {user_id}");
    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

//----------------------------------------------   Trades  ----------------------------------------------------
route!(create_trade => Post "/trades" impl TradeGatewayDatabase);
/// Route handler for opening a trade
///
/// The authenticated user becomes the buyer; the listing pins the seller. The response is the buyer's view of the
/// freshly created trade, which never includes either party's magic-link token.
pub async fn create_trade<B: TradeGatewayDatabase>(
    claims: SessionClaims,
    api: web::Data<TradeFlowApi<B>>,
    body: web::Json<NewTradeRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST create trade on listing {} for user {}", req.listing_id, claims.user_id);
    let trade =
        api.create_trade(req.listing_id, claims.user_id, req.volume_af, req.price_per_af, req.window_label).await?;
    let view = api.trade_view(&trade.id, Some(claims.user_id), None).await?;
    Ok(HttpResponse::Created().json(view))
}

route!(trade_by_id => Get "/trades/{trade_id}" impl TradeGatewayDatabase);
/// Route handler for fetching a single trade
///
/// The caller sees the trade only if they resolve to one of its parties, and the projection is scoped to that
/// party: the counterparty's token never appears.
pub async fn trade_by_id<B: TradeGatewayDatabase>(
    session: MaybeSession,
    path: web::Path<String>,
    query: web::Query<TokenQuery>,
    api: web::Data<TradeFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = trade_id_from_path(path.into_inner())?;
    debug!("💻️ GET trade {id}");
    let view = api.trade_view(&id, session.user_id(), query.token.as_deref()).await?;
    Ok(HttpResponse::Ok().json(view))
}

route!(my_trades => Get "/trades" impl TradeGatewayDatabase);
/// Route handler for the trade list
///
/// Authenticated users fetch the trades they participate in, on either side of the table, most recently updated
/// first.
pub async fn my_trades<B: TradeGatewayDatabase>(
    claims: SessionClaims,
    api: web::Data<TradeFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_trades for user {}", claims.user_id);
    let trades = api.trades_for_user(claims.user_id).await?;
    let summaries = trades.iter().map(|t| trade_summary(t, claims.user_id)).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(summaries))
}

route!(accept_trade => Post "/trades/{trade_id}/accept" impl TradeGatewayDatabase);
pub async fn accept_trade<B: TradeGatewayDatabase>(
    session: MaybeSession,
    path: web::Path<String>,
    query: web::Query<TokenQuery>,
    api: web::Data<TradeFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    apply_transition(EventKind::Accept, None, session, path, query, api).await
}

route!(counter_trade => Post "/trades/{trade_id}/counter" impl TradeGatewayDatabase);
pub async fn counter_trade<B: TradeGatewayDatabase>(
    session: MaybeSession,
    path: web::Path<String>,
    query: web::Query<TokenQuery>,
    api: web::Data<TradeFlowApi<B>>,
    body: web::Json<CounterTerms>,
) -> Result<HttpResponse, ServerError> {
    apply_transition(EventKind::Counter, Some(body.into_inner()), session, path, query, api).await
}

route!(decline_trade => Post "/trades/{trade_id}/decline" impl TradeGatewayDatabase);
pub async fn decline_trade<B: TradeGatewayDatabase>(
    session: MaybeSession,
    path: web::Path<String>,
    query: web::Query<TokenQuery>,
    api: web::Data<TradeFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    apply_transition(EventKind::Decline, None, session, path, query, api).await
}

/// Shared plumbing for the three transition routes. The caller's role is whatever they resolve to on this trade;
/// the engine decides whether that role may make this move right now.
async fn apply_transition<B: TradeGatewayDatabase>(
    kind: EventKind,
    terms: Option<CounterTerms>,
    session: MaybeSession,
    path: web::Path<String>,
    query: web::Query<TokenQuery>,
    api: web::Data<TradeFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = trade_id_from_path(path.into_inner())?;
    let token = query.into_inner().token;
    let user_id = session.user_id();
    debug!("💻️ POST {kind} on trade {id}");
    let (_, viewer) = api.trade_for_viewer(&id, user_id, token.as_deref()).await?;
    let actor = viewer
        .role
        .ok_or_else(|| ServerError::InsufficientPermissions("You are not a party to this trade".to_string()))?;
    let _ = api.apply_transition(&id, actor, kind, terms).await?;
    let view = api.trade_view(&id, user_id, token.as_deref()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true, "trade": view })))
}

fn trade_id_from_path(raw: String) -> Result<TradeId, ServerError> {
    TradeId::from_str(&raw).map_err(|_| ServerError::InvalidRequestPath(format!("Invalid trade id: {raw}")))
}

fn trade_summary(trade: &Trade, user_id: i64) -> serde_json::Value {
    let role = if trade.seller_user_id == user_id { TradeRole::Seller } else { TradeRole::Buyer };
    serde_json::json!({
        "id": trade.id,
        "listing_id": trade.listing_id,
        "district": trade.district,
        "water_type": trade.water_type,
        "volume_af": trade.volume_af,
        "price_per_af": trade.price_per_af,
        "window_label": trade.window_label,
        "status": trade.status,
        "round": trade.round,
        "last_actor": trade.last_actor,
        "role": role,
        "updated_at": trade.updated_at,
    })
}

//----------------------------------------------   Magic links  ----------------------------------------------------
route!(magic_link => Get "/t/{trade_id}" impl TradeGatewayDatabase);
/// Route handler for the magic-link landing page from notification emails.
///
/// The page renders the trade for the token holder. With `action=accept` or `action=decline` the transition is
/// applied straight from the link. A bad or stale token gets a generic "invalid or expired" page that reveals
/// nothing about the trade, not even whether it exists.
pub async fn magic_link<B: TradeGatewayDatabase>(
    session: MaybeSession,
    path: web::Path<String>,
    query: web::Query<MagicLinkQuery>,
    api: web::Data<TradeFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = trade_id_from_path(path.into_inner())?;
    let query = query.into_inner();
    trace!("💻️ GET magic link page for trade {id}");
    let resolved = api.trade_for_viewer(&id, session.user_id(), query.token.as_deref()).await;
    let (_, viewer) = match resolved {
        Ok(r) => r,
        Err(_) => return Ok(invalid_link_page()),
    };
    let Some(role) = viewer.role else {
        return Ok(invalid_link_page());
    };
    let mut banner = None;
    let mut counter_form = false;
    if let Some(action) = query.action.as_deref() {
        let kind = match action {
            "accept" => Some(EventKind::Accept),
            "decline" => Some(EventKind::Decline),
            // Countering needs new terms, so it gets a form instead of firing on page load.
            "counter" => {
                counter_form = true;
                None
            },
            _ => {
                banner = Some(format!("Unknown action '{action}'. Nothing was changed."));
                None
            },
        };
        if let Some(kind) = kind {
            if let Err(e) = api.apply_transition(&id, role, kind, None).await {
                debug!("💻️ Magic link action {action} on trade {id} failed. {e}");
                banner = Some(e.to_string());
            }
        }
    }
    let view = api.trade_view(&id, session.user_id(), query.token.as_deref()).await?;
    let page = render_trade_page(&view, query.token.as_deref(), banner, counter_form);
    Ok(HttpResponse::Ok().insert_header(ContentType::html()).body(page))
}

fn invalid_link_page() -> HttpResponse {
    let body = "<!DOCTYPE html><html><head><title>Water Trade Gateway</title></head><body>\
                <h1>This link is invalid or expired</h1>\
                <p>Ask your counterparty to resend the trade link, or log in to the marketplace.</p>\
                </body></html>";
    HttpResponse::Forbidden().insert_header(ContentType::html()).body(body)
}

fn render_trade_page(
    view: &water_trade_engine::TradeView,
    token: Option<&str>,
    banner: Option<String>,
    counter_form: bool,
) -> String {
    let banner = banner.map(|m| format!("<p class=\"banner\">{m}</p>")).unwrap_or_default();
    let window = view.window_label.as_deref().unwrap_or("unspecified");
    let status_line = match view.status {
        TradeStatus::Declined => "This trade has been declined.".to_string(),
        TradeStatus::AcceptedPendingBuyerSignature => {
            "The seller has accepted. The trade is waiting on the buyer's signature.".to_string()
        },
        _ => match view.awaiting {
            Some(r) if r == view.viewer_role => "It is your move.".to_string(),
            _ => "Waiting on your counterparty.".to_string(),
        },
    };
    let actions = if view.viewer_can_act() {
        let credential = token.map(|t| format!("?token={t}&")).unwrap_or_else(|| "?".to_string());
        let mut links = String::new();
        if view.viewer_role == TradeRole::Seller {
            links.push_str(&format!("<a href=\"/t/{}{credential}action=accept\">Accept</a> ", view.id.as_str()));
        }
        links.push_str(&format!("<a href=\"/t/{}{credential}action=decline\">Decline</a> ", view.id.as_str()));
        links.push_str(&format!("<a href=\"/t/{}{credential}action=counter\">Counter</a>", view.id.as_str()));
        let form = if counter_form { render_counter_form(view, token) } else { String::new() };
        format!("<p>{links}</p>{form}")
    } else {
        String::new()
    };
    format!(
        "<!DOCTYPE html><html><head><title>Trade {id}</title></head><body>\
         {banner}\
         <h1>Water trade in {district}</h1>\
         <p>{volume} at {price} per acre-foot, delivery window: {window}.</p>\
         <p>Round {round}. {status_line}</p>\
         {actions}\
         </body></html>",
        id = view.id.as_str(),
        district = view.district,
        volume = view.volume_af,
        price = view.price_per_af,
        round = view.round,
    )
}

/// The counter form submits JSON to the API endpoint, carrying the same token the page was opened with.
fn render_counter_form(view: &water_trade_engine::TradeView, token: Option<&str>) -> String {
    let credential = token.map(|t| format!("?token={t}")).unwrap_or_default();
    let endpoint = format!("/api/trades/{}/counter{credential}", view.id.as_str());
    format!(
        "<form id=\"counter\">\
         <label>Price per acre-foot (cents) <input name=\"price_per_af\" type=\"number\" value=\"{price}\"></label>\
         <label>Volume (acre-feet) <input name=\"volume_af\" type=\"number\" value=\"{volume}\"></label>\
         <label>Delivery window <input name=\"window_label\" value=\"{window}\"></label>\
         <button type=\"submit\">Send counteroffer</button>\
         </form>\
         <script>document.getElementById('counter').addEventListener('submit',async e=>{{\
         e.preventDefault();const f=new FormData(e.target);\
         const body={{price_per_af:Number(f.get('price_per_af')),volume_af:Number(f.get('volume_af')),\
         window_label:f.get('window_label')||null}};\
         const res=await fetch('{endpoint}',{{method:'POST',headers:{{'Content-Type':'application/json'}},\
         body:JSON.stringify(body)}});\
         if(res.ok){{location.search=location.search.replace(/&?action=counter/,'');}}\
         else{{const err=await res.json();alert(err.error);}}}});</script>",
        price = view.price_per_af.value(),
        volume = view.volume_af.value(),
        window = view.window_label.as_deref().unwrap_or(""),
    )
}
