use std::sync::Arc;

use sqlx::SqlitePool;
use teloxide::{
    dispatching::DpHandlerDescription, prelude::*, types::Message, utils::command::BotCommands, Bot,
};

use crate::{cmd_question, cmd_vote, HandlerResult};

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "Les commandes suivantes sont disponibles:"
)]
pub enum Command {
    #[command(description = "affiche le message de bienvenue.")]
    Start,
    #[command(description = "affiche ce texte.")]
    Aide,
    #[command(description = "crée une question avec ses choix de réponse.")]
    Question(String),
}

fn welcome_text(name: &str) -> String {
    format!(
        "Salut {name},\n\nLance une question en utilisant:\n{usage}\n\nUtilise /aide à tout moment pour plus d'info.\n\nBisous",
        usage = cmd_question::QUESTION_USAGE
    )
}

async fn answer_command(bot: Bot, msg: Message, cmd: Command, db: Arc<SqlitePool>) -> HandlerResult {
    match cmd {
        Command::Start => {
            let name = msg
                .from()
                .map(|user| user.first_name.clone())
                .unwrap_or_else(|| "toi".to_owned());
            log::info!("{} started the bot", name);
            bot.send_message(msg.chat.id, welcome_text(&name)).await?;
        }
        Command::Aide => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "{}\n\n{}",
                    Command::descriptions(),
                    cmd_question::QUESTION_USAGE
                ),
            )
            .await?;
        }
        Command::Question(raw_args) => {
            cmd_question::question(bot, msg, raw_args, db).await?;
        }
    };

    Ok(())
}

pub fn command_message_handler(
) -> Endpoint<'static, DependencyMap, HandlerResult, DpHandlerDescription> {
    dptree::entry()
        .filter_command::<Command>()
        .endpoint(answer_command)
}

pub fn command_callback_query_handler(
) -> Endpoint<'static, DependencyMap, HandlerResult, DpHandlerDescription> {
    dptree::entry().endpoint(cmd_vote::vote)
}
