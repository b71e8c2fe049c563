//! Error types for the discovery bot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
