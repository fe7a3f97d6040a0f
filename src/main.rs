use color_eyre::Section;
use color_eyre::eyre::{Result, WrapErr, eyre};
use homework_bot::config::{Config, check_tokens};
use homework_bot::logging;
use homework_bot::notifier::Notifier;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Plain environment variables are enough; .env is optional.
    dotenv::dotenv().ok();
    let config = Config::load()
        .wrap_err("Failed to read configuration from the environment")
        .with_suggestion(|| "RETRY_TIME and REQUEST_TIMEOUT must be whole numbers of seconds")?;

    let _guard = logging::init(&config.log_dir)?;

    info!("🚀 Homework status bot");
    info!(?config, "📊 Config loaded");

    if !check_tokens(&config) {
        let missing = config.missing_tokens();
        error!(?missing, "Отсутствуют обязательные переменные окружения");
        return Err(
            eyre!("Missing required environment variables: {}", missing.join(", "))
                .with_suggestion(|| "Set PRACTICUM_TOKEN, TELEGRAM_TOKEN and TELEGRAM_CHAT_ID in the environment or .env"),
        );
    }

    let notifier = Notifier::new(config)
        .wrap_err("Failed to initialize the notifier")
        .with_suggestion(|| "Check the Telegram bot token")?;

    notifier.run().await;
    Ok(())
}
