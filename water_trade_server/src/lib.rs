//! # Water trade gateway server
//! This module hosts the HTTP surface of the water trade gateway. It is responsible for:
//! Accepting trade offers from buyers and accept/counter/decline responses from either party.
//! Resolving who the caller is (session or magic-link token) before any trade data crosses the wire.
//! Dispatching counterparty notifications after a transition commits.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth`: Issues a session token for a marketplace user.
//! * `/api/trades` and friends: The negotiation API.
//! * `/t/{trade_id}`: The magic-link landing page from notification emails.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod mailer;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
