use std::sync::Arc;

use sqlx::SqlitePool;
use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    types::{Message, ParseMode, ReplyMarkup},
    Bot,
};

use crate::render;
use crate::store::{self, AnswerTally, StoreError};
use crate::HandlerResult;

pub const QUESTION_USAGE: &str =
    r#"/question "Ta (très pertinente) question ?" "Choix 1" "Choix 2" ["D'autres choix si tu veux" ...]"#;

/// Splits the raw command tail into the question and its choices. Double
/// quotes group words into one argument; an unterminated quote extends to
/// the end of the input.
pub fn split_args(raw: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current: Option<String> = None;

    for token in raw.split_whitespace() {
        match current.take() {
            Some(mut quoted) => {
                if let Some(stripped) = token.strip_suffix('"') {
                    quoted.push(' ');
                    quoted.push_str(stripped);
                    args.push(quoted);
                } else {
                    quoted.push(' ');
                    quoted.push_str(token);
                    current = Some(quoted);
                }
            }
            None => {
                if let Some(stripped) = token.strip_prefix('"') {
                    if let Some(both) = stripped.strip_suffix('"') {
                        args.push(both.to_string());
                    } else {
                        current = Some(stripped.to_string());
                    }
                } else {
                    args.push(token.to_string());
                }
            }
        }
    }

    if let Some(unterminated) = current {
        args.push(unterminated);
    }
    args
}

pub async fn question(bot: Bot, msg: Message, raw_args: String, db: Arc<SqlitePool>) -> HandlerResult {
    let args = split_args(&raw_args);
    log::debug!("/question called with {:?}", args);

    let Some((question, choices)) = args.split_first() else {
        bot.send_message(msg.chat.id, insufficient_args_text()).await?;
        return Ok(());
    };

    let created_by = msg
        .from()
        .map(|user| user.full_name())
        .unwrap_or_else(|| "quelqu'un".to_owned());

    let (poll, answers) = match store::create_poll(db.as_ref(), question, &created_by, choices).await
    {
        Ok(created) => created,
        Err(StoreError::InsufficientChoices) => {
            bot.send_message(msg.chat.id, insufficient_args_text()).await?;
            return Ok(());
        }
        Err(e) => {
            log::error!("Could not create poll: {}", e);
            bot.send_message(
                msg.chat.id,
                "Je n'ai pas réussi à créer la question, réessaie plus tard.",
            )
            .await?;
            return Ok(());
        }
    };
    log::info!(
        "{} created poll {} with {} choices",
        created_by,
        poll.id,
        answers.len()
    );

    let tallies: Vec<AnswerTally> = answers.into_iter().map(AnswerTally::without_votes).collect();
    let rendered = render::render_poll(&poll, &tallies);

    log::debug!("Sending poll message with inline keyboard for callback");
    bot.send_message(msg.chat.id, rendered.text)
        .parse_mode(ParseMode::Html)
        .reply_markup(ReplyMarkup::InlineKeyboard(rendered.keyboard))
        .await?;

    Ok(())
}

fn insufficient_args_text() -> String {
    format!("Il n'y a pas assez d'arguments:\n\n{QUESTION_USAGE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tokens_split_on_whitespace() {
        assert_eq!(split_args("Lunch? Pizza Sushi"), ["Lunch?", "Pizza", "Sushi"]);
    }

    #[test]
    fn quoted_segments_keep_their_spaces() {
        assert_eq!(
            split_args(r#""On mange où ?" "Chez Luigi" Sushi"#),
            ["On mange où ?", "Chez Luigi", "Sushi"]
        );
    }

    #[test]
    fn single_token_quotes_are_stripped() {
        assert_eq!(split_args(r#""Pizza" "Sushi""#), ["Pizza", "Sushi"]);
    }

    #[test]
    fn unterminated_quote_runs_to_the_end() {
        assert_eq!(
            split_args(r#"Lunch? "Pizza con funghi"#),
            ["Lunch?", "Pizza con funghi"]
        );
    }

    #[test]
    fn empty_input_yields_no_args() {
        assert_eq!(split_args(""), Vec::<String>::new());
        assert_eq!(split_args("   "), Vec::<String>::new());
    }
}
