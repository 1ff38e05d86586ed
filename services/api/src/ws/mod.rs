//! WebSocket Bridge Session Management
//!
//! This module contains the core logic for relaying between a frontend
//! connection and the robot actuator. It is structured into submodules:
//!
//! - `protocol`: frontend-bound messages emitted in AI mode.
//! - `pipeline`: one AI turn — gateway call, envelope decode, normalization.
//! - `session`: the connection lifecycle, from the upstream dial to the
//!   stop-on-exit safety interlock.

mod pipeline;
pub mod protocol;
pub mod session;

pub use session::ws_handler;
