//! Common utilities shared across examples.

#![allow(dead_code)]

use ironfast::prelude::ContextConfig;
use std::env;

/// Default number of messages to generate.
pub const DEFAULT_MESSAGES: usize = 1_000;

/// Example configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ExampleConfig {
    /// Number of messages to generate.
    pub messages: usize,
    /// Instruments to cycle through.
    pub symbols: Vec<String>,
    /// Codec configuration shared by encoder and decoder.
    pub context: ContextConfig,
}

impl ExampleConfig {
    /// Loads the configuration from `FAST_MESSAGES`, `FAST_SYMBOLS` and
    /// `FAST_MAX_MESSAGE_SIZE`.
    #[must_use]
    pub fn from_env() -> Self {
        let messages = env::var("FAST_MESSAGES")
            .ok()
            .and_then(|m| m.parse().ok())
            .unwrap_or(DEFAULT_MESSAGES);
        let symbols = env::var("FAST_SYMBOLS")
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_else(|_| vec!["ESZ6".to_string(), "NQZ6".to_string()]);
        let mut context = ContextConfig::default();
        if let Some(size) = env::var("FAST_MAX_MESSAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            context = context.with_max_message_size(size);
        }

        Self {
            messages,
            symbols,
            context,
        }
    }
}

/// Initializes logging for examples.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Formats bytes as upper-case hex.
pub fn wire_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
