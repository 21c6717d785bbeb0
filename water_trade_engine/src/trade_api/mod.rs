pub mod trade_flow_api;
pub mod trade_objects;
