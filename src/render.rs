use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

use crate::store::{AnswerTally, PollRow};

/// The message body and inline keyboard for a poll. Rebuilding from the same
/// snapshot yields the same output, so the message can be edited in place
/// after every vote.
#[derive(Debug, Clone)]
pub struct RenderedPoll {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

pub fn render_poll(poll: &PollRow, tallies: &[AnswerTally]) -> RenderedPoll {
    let mut text = format!(
        "Une nouvelle question a été créée par {}:\n\n<b>{}</b>\n",
        html::escape(&poll.created_by),
        html::escape(&poll.question),
    );
    for tally in tallies {
        text.push('\n');
        text.push_str(&answer_line(tally));
    }

    let keyboard = InlineKeyboardMarkup::new(tallies.iter().map(|tally| {
        vec![InlineKeyboardButton::callback(
            tally.answer.answer.clone(),
            tally.answer.id.clone(),
        )]
    }));

    RenderedPoll { text, keyboard }
}

/// An answer with no votes renders as its bare text; otherwise the count and
/// the voter names follow, in the order the votes were cast.
fn answer_line(tally: &AnswerTally) -> String {
    let choice = html::escape(&tally.answer.answer);
    if tally.voters.is_empty() {
        return choice;
    }
    let names = tally
        .voters
        .iter()
        .map(|name| html::escape(name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} ({} 👍: {})", choice, tally.voters.len(), names)
}
