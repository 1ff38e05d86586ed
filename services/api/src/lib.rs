//! Amadeus API Library Crate
//!
//! This library contains all the core logic for the robot bridge service:
//! configuration, shared state, the HTTP router and handlers, and the
//! WebSocket relay session. The `api` binary is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod ws;
