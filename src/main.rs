use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

use sondage_bot::commands::{command_callback_query_handler, command_message_handler, Command};
use sondage_bot::{config, store};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    log::info!("Loading configuration");
    config::config();
    let database = store::connect(&config::config().database_url, 5)
        .await
        .unwrap();

    let bot = Bot::new(config::config().bot_token.clone());
    bot.set_my_commands(Command::bot_commands()).await.unwrap();

    log::info!("Initializing dispatchers");
    let message_handler = Update::filter_message().chain(command_message_handler());
    let callback_handler = Update::filter_callback_query().chain(command_callback_query_handler());

    let mut bot_dispatcher = Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(message_handler)
            .branch(callback_handler),
    )
    .default_handler(|_| async move {})
    .error_handler(LoggingErrorHandler::with_custom_text(
        "An error has occurred in the dispatcher",
    ))
    .dependencies(dptree::deps![Arc::new(database)])
    .enable_ctrlc_handler()
    .build();

    log::info!("Starting poll bot");
    bot_dispatcher.dispatch().await;
}
