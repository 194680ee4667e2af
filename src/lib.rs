#![deny(unexpected_cfgs)]
//
#![warn(clippy::nursery)]

mod status;
mod validate;

#[cfg(test)]
mod test_server;

pub mod bot;
pub mod config;
pub mod error;
pub mod practicum;
pub mod telegram;
pub mod verdict;

pub use bot::Bot;
pub use config::{Config, ConfigError, check_tokens};
pub use error::BotError;
pub use practicum::{HomeworkSource, PracticumClient};
pub use status::parse_status;
pub use telegram::{Notifier, TelegramClient};
pub use validate::{CheckedResponse, check_response};
