use std::collections::HashMap;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("at least two answer choices are required")]
    InsufficientChoices,
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub id: i64,
    pub question: String,
    pub created_by: String,
    pub opened: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerRow {
    pub id: String,
    pub poll_id: i64,
    pub answer: String,
    pub position: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoterRow {
    pub id: i64,
    pub name: String,
}

/// An answer together with the display names of its current voters, in the
/// order the votes were cast.
#[derive(Debug, Clone)]
pub struct AnswerTally {
    pub answer: AnswerRow,
    pub voters: Vec<String>,
}

impl AnswerTally {
    pub fn without_votes(answer: AnswerRow) -> Self {
        Self {
            answer,
            voters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteToggle {
    Recorded,
    Retracted,
}

/// Opens the SQLite pool and applies pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// Creates a poll and its ordered answers in one transaction. Fewer than two
/// choices is rejected without touching the database.
pub async fn create_poll(
    pool: &SqlitePool,
    question: &str,
    created_by: &str,
    choices: &[String],
) -> Result<(PollRow, Vec<AnswerRow>), StoreError> {
    if choices.len() < 2 {
        return Err(StoreError::InsufficientChoices);
    }

    let mut tx = pool.begin().await?;

    let poll = sqlx::query_as::<_, PollRow>(
        "INSERT INTO polls (question, created_by) VALUES (?1, ?2)
         RETURNING id, question, created_by, opened",
    )
    .bind(question)
    .bind(created_by)
    .fetch_one(tx.as_mut())
    .await?;

    let mut answers = Vec::with_capacity(choices.len());
    for (position, choice) in choices.iter().enumerate() {
        let answer = sqlx::query_as::<_, AnswerRow>(
            "INSERT INTO answers (id, poll_id, answer, position) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, poll_id, answer, position",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(poll.id)
        .bind(choice)
        .bind(position as i64)
        .fetch_one(tx.as_mut())
        .await?;
        answers.push(answer);
    }

    tx.commit().await?;
    Ok((poll, answers))
}

pub async fn find_answer(
    pool: &SqlitePool,
    answer_id: &str,
) -> Result<Option<AnswerRow>, StoreError> {
    let row = sqlx::query_as::<_, AnswerRow>(
        "SELECT id, poll_id, answer, position FROM answers WHERE id = ?1",
    )
    .bind(answer_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_voter(pool: &SqlitePool, voter_id: i64) -> Result<Option<VoterRow>, StoreError> {
    let row = sqlx::query_as::<_, VoterRow>("SELECT id, name FROM voters WHERE id = ?1")
        .bind(voter_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Find-or-create for a voter identity. Returns the stored row plus whether
/// it was newly created; a changed display name is written back.
pub async fn upsert_voter(
    pool: &SqlitePool,
    voter_id: i64,
    name: &str,
) -> Result<(VoterRow, bool), StoreError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, VoterRow>("SELECT id, name FROM voters WHERE id = ?1")
        .bind(voter_id)
        .fetch_optional(tx.as_mut())
        .await?;

    let result = match existing {
        None => {
            let row = sqlx::query_as::<_, VoterRow>(
                "INSERT INTO voters (id, name) VALUES (?1, ?2) RETURNING id, name",
            )
            .bind(voter_id)
            .bind(name)
            .fetch_one(tx.as_mut())
            .await?;
            (row, true)
        }
        Some(voter) if voter.name != name => {
            let row = sqlx::query_as::<_, VoterRow>(
                "UPDATE voters SET name = ?2 WHERE id = ?1 RETURNING id, name",
            )
            .bind(voter_id)
            .bind(name)
            .fetch_one(tx.as_mut())
            .await?;
            (row, false)
        }
        Some(voter) => (voter, false),
    };

    tx.commit().await?;
    Ok(result)
}

/// Flips the vote of `voter_id` on `answer_id`: present means delete, absent
/// means insert. Runs in one transaction; a unique-constraint violation on
/// the insert (two presses racing) lands in the retract branch instead of
/// producing a duplicate vote.
pub async fn toggle_vote(
    pool: &SqlitePool,
    answer_id: &str,
    voter_id: i64,
) -> Result<VoteToggle, StoreError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM votes WHERE answer_id = ?1 AND voter_id = ?2",
    )
    .bind(answer_id)
    .bind(voter_id)
    .fetch_optional(tx.as_mut())
    .await?;

    let toggle = match existing {
        Some(vote_id) => {
            sqlx::query("DELETE FROM votes WHERE id = ?1")
                .bind(vote_id)
                .execute(tx.as_mut())
                .await?;
            VoteToggle::Retracted
        }
        None => {
            let inserted = sqlx::query("INSERT INTO votes (answer_id, voter_id) VALUES (?1, ?2)")
                .bind(answer_id)
                .bind(voter_id)
                .execute(tx.as_mut())
                .await;
            match inserted {
                Ok(_) => VoteToggle::Recorded,
                Err(e) if is_unique_violation(&e) => {
                    sqlx::query("DELETE FROM votes WHERE answer_id = ?1 AND voter_id = ?2")
                        .bind(answer_id)
                        .bind(voter_id)
                        .execute(tx.as_mut())
                        .await?;
                    VoteToggle::Retracted
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    tx.commit().await?;
    Ok(toggle)
}

/// Reads a poll with its answers and, per answer, the voter names in the
/// order the votes were cast. This is the input to [`crate::render`].
pub async fn poll_snapshot(
    pool: &SqlitePool,
    poll_id: i64,
) -> Result<(PollRow, Vec<AnswerTally>), StoreError> {
    let poll = sqlx::query_as::<_, PollRow>(
        "SELECT id, question, created_by, opened FROM polls WHERE id = ?1",
    )
    .bind(poll_id)
    .fetch_one(pool)
    .await?;

    let answers = sqlx::query_as::<_, AnswerRow>(
        "SELECT id, poll_id, answer, position FROM answers WHERE poll_id = ?1 ORDER BY position",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    let cast_votes = sqlx::query_as::<_, (String, String)>(
        "SELECT votes.answer_id, voters.name
         FROM votes
         JOIN voters ON voters.id = votes.voter_id
         JOIN answers ON answers.id = votes.answer_id
         WHERE answers.poll_id = ?1
         ORDER BY votes.id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    let mut by_answer: HashMap<String, Vec<String>> = HashMap::new();
    for (answer_id, name) in cast_votes {
        by_answer.entry(answer_id).or_default().push(name);
    }

    let tallies = answers
        .into_iter()
        .map(|answer| {
            let voters = by_answer.remove(&answer.id).unwrap_or_default();
            AnswerTally { answer, voters }
        })
        .collect();

    Ok((poll, tallies))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}
