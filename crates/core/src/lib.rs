//! Core domain logic for the Amadeus robot bridge.
//!
//! This crate holds everything that does not depend on a web framework:
//! the robot command schema and its safety normalization, the LLM provider
//! registry, the system-prompt loader, and the chat gateway that talks to
//! a configured provider over HTTP.

pub mod command;
pub mod error;
pub mod gateway;
pub mod prompt;
pub mod provider;

pub use command::{AiResponse, BuzzerState, CommandKind, Direction, RobotCommand};
pub use error::GatewayError;
pub use gateway::{HttpLlmGateway, LlmGateway};
pub use provider::{ProviderConfig, ProviderKind, ProviderRegistry};
