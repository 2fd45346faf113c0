use std::sync::Arc;

use sqlx::SqlitePool;
use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters},
    requests::Requester,
    types::{CallbackQuery, ParseMode},
    Bot,
};

use crate::render::{self, RenderedPoll};
use crate::store::{self, StoreError, VoteToggle};
use crate::HandlerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded,
    Retracted,
    AnswerNotFound,
}

impl VoteOutcome {
    /// Short acknowledgement shown as the button-press toast.
    pub fn ack(self) -> &'static str {
        match self {
            VoteOutcome::Recorded => "vote recorded",
            VoteOutcome::Retracted => "vote retracted",
            VoteOutcome::AnswerNotFound => "answer not found",
        }
    }
}

pub struct VoteResult {
    pub outcome: VoteOutcome,
    /// Fresh rendering of the poll the answer belongs to. `None` when the
    /// answer no longer exists and there is nothing to re-render.
    pub poll: Option<RenderedPoll>,
}

/// Registers the voter, toggles their vote on the answer and returns the
/// poll rendered from the new state. The voter is persisted even when the
/// answer id turns out to be stale.
pub async fn submit_vote(
    db: &SqlitePool,
    answer_id: &str,
    voter_id: i64,
    voter_name: &str,
) -> Result<VoteResult, StoreError> {
    let (voter, newly_created) = store::upsert_voter(db, voter_id, voter_name).await?;
    if newly_created {
        log::debug!("Registered new voter {} ({})", voter.name, voter.id);
    }

    let Some(answer) = store::find_answer(db, answer_id).await? else {
        return Ok(VoteResult {
            outcome: VoteOutcome::AnswerNotFound,
            poll: None,
        });
    };

    let outcome = match store::toggle_vote(db, &answer.id, voter_id).await? {
        VoteToggle::Recorded => VoteOutcome::Recorded,
        VoteToggle::Retracted => VoteOutcome::Retracted,
    };

    let (poll, tallies) = store::poll_snapshot(db, answer.poll_id).await?;
    Ok(VoteResult {
        outcome,
        poll: Some(render::render_poll(&poll, &tallies)),
    })
}

pub async fn vote(bot: Bot, q: CallbackQuery, db: Arc<SqlitePool>) -> HandlerResult {
    let Some(answer_id) = q.data.as_deref() else {
        log::warn!("Callback query without data from {}", q.from.full_name());
        return Ok(());
    };

    let voter_name = q.from.full_name();
    log::info!("{} pressed answer {}", voter_name, answer_id);

    let result = match submit_vote(db.as_ref(), answer_id, q.from.id.0 as i64, &voter_name).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Could not record vote on {}: {}", answer_id, e);
            bot.answer_callback_query(q.id)
                .text("une erreur est survenue")
                .await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(q.id)
        .text(result.outcome.ack())
        .await?;

    if let (Some(rendered), Some(message)) = (result.poll, q.message) {
        log::debug!("Editing poll message {}", message.id.0);
        bot.edit_message_text(message.chat.id, message.id, rendered.text)
            .parse_mode(ParseMode::Html)
            .reply_markup(rendered.keyboard)
            .await?;
    }

    Ok(())
}
