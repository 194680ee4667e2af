mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use homework_bot::{Bot, Config, PracticumClient, TelegramClient, config};
use reqwest::blocking::Client;

/// Practicum Homework Status Bot
///
/// Configuration comes from the environment (or a `.env` file):
/// PRACTICUM_TOKEN, TELEGRAM_TOKEN and TELEGRAM_CHAT_ID are required;
/// PRACTICUM_ENDPOINT, RETRY_PERIOD and HOMEWORK_BOT_LOG_FILE are optional.
#[derive(Parser)]
#[command(version)]
struct Args {}

fn main() -> Result<()> {
    let _ = Args::parse();

    let dotenv = config::load_dotenv();
    logging::init(config::log_file(config::process_env).as_deref())?;
    match dotenv {
        Ok(Some(path)) => log::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => log::warn!("Could not load .env file: {e}"),
    }

    let config = Config::from_env().inspect_err(|e| log::error!("{e}"))?;
    log::debug!("{config:?}");

    let http_client = Client::new();
    let telegram = TelegramClient::new(http_client.clone(), &config.telegram_token, config.chat_id)
        .context("Could not create Telegram client")?;
    let practicum = PracticumClient::new(http_client, config.practicum_token, config.endpoint);

    log::info!("Initialization succeeded!");

    Bot::new(practicum, telegram, config.retry_period).run()
}
