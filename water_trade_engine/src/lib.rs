//! Water Trade Engine
//!
//! The engine holds the core logic for the water-rights trade gateway: the multi-round
//! offer/counteroffer negotiation between a buyer and a seller. It is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`TradeFlowApi`]). This provides the public-facing functionality of the negotiation
//!    engine: creating trades, applying accept/counter/decline transitions, and viewer-scoped reads. Backends need to
//!    implement the traits in [`mod@traits`] in order to act as a store for the trade server.
//! 3. The pure domain rules ([`mod@state_machine`] and [`mod@viewer`]): the transition table and the caller-role
//!    resolver. These have no I/O and are exhaustively unit tested.
//!
//! The engine also emits events when a trade transitions. A simple hook framework ([`mod@events`]) lets the server
//! subscribe and, for example, email the counterparty without ever blocking (or failing) the transition itself.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod state_machine;
pub mod viewer;

mod trade_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use trade_api::{
    trade_flow_api::TradeFlowApi,
    trade_objects::{CounterTerms, TradeView},
};
pub use traits::{TradeFlowError, TradeGatewayDatabase, TradeGatewayError};
