//! Traits that a storage backend must implement to power the trade engine, and the error taxonomies shared between
//! the engine and its backends.
mod data_objects;
mod errors;
mod trade_gateway_database;

pub use data_objects::TradeMutation;
pub use errors::{TradeFlowError, TradeGatewayError};
pub use trade_gateway_database::TradeGatewayDatabase;
