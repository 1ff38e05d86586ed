//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the immutable
//! resources every session reads: the loaded configuration, the provider
//! registry, and the LLM gateway. Nothing in here is mutated after startup,
//! so sessions share it without locking.

use crate::config::Config;
use amadeus_core::{LlmGateway, ProviderRegistry};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: ProviderRegistry,
    pub gateway: Arc<dyn LlmGateway>,
}
