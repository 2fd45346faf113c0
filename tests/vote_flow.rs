//! End-to-end exercises of the poll store and vote toggle engine against an
//! in-memory database, without a Telegram connection.

use sondage_bot::cmd_vote::{submit_vote, VoteOutcome};
use sondage_bot::store;

async fn memory_store() -> sqlx::SqlitePool {
    store::connect("sqlite::memory:", 1).await.unwrap()
}

fn choices(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|s| s.to_string()).collect()
}

async fn vote_count(db: &sqlx::SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM votes")
        .fetch_one(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn lunch_poll_scenario() {
    let db = memory_store().await;
    let (_poll, answers) = store::create_poll(&db, "Lunch?", "Chef", &choices(&["Pizza", "Sushi"]))
        .await
        .unwrap();
    let pizza = answers[0].id.as_str();
    let sushi = answers[1].id.as_str();

    // A votes Pizza.
    let result = submit_vote(&db, pizza, 1, "A").await.unwrap();
    assert_eq!(result.outcome, VoteOutcome::Recorded);
    let text = result.poll.unwrap().text;
    assert!(text.contains("Pizza (1 👍: A)"), "got: {text}");
    assert!(text.contains("\nSushi"));
    assert!(!text.contains("Sushi ("));

    // A presses Pizza again, retracting the vote.
    let result = submit_vote(&db, pizza, 1, "A").await.unwrap();
    assert_eq!(result.outcome, VoteOutcome::Retracted);
    let text = result.poll.unwrap().text;
    assert!(!text.contains("👍"), "got: {text}");

    // B then A vote Sushi; names appear in cast order.
    submit_vote(&db, sushi, 2, "B").await.unwrap();
    let result = submit_vote(&db, sushi, 1, "A").await.unwrap();
    assert_eq!(result.outcome, VoteOutcome::Recorded);
    let text = result.poll.unwrap().text;
    assert!(text.contains("Sushi (2 👍: B, A)"), "got: {text}");
}

#[tokio::test]
async fn unknown_answer_keeps_voter_but_never_votes() {
    let db = memory_store().await;
    store::create_poll(&db, "Lunch?", "Chef", &choices(&["Pizza", "Sushi"]))
        .await
        .unwrap();

    let result = submit_vote(&db, "gone", 9, "Zoé").await.unwrap();
    assert_eq!(result.outcome, VoteOutcome::AnswerNotFound);
    assert!(result.poll.is_none());

    let voter = store::find_voter(&db, 9).await.unwrap().unwrap();
    assert_eq!(voter.name, "Zoé");
    assert_eq!(vote_count(&db).await, 0);
}

#[tokio::test]
async fn renamed_voter_shows_up_with_the_new_name() {
    let db = memory_store().await;
    let (_poll, answers) = store::create_poll(&db, "Lunch?", "Chef", &choices(&["Pizza", "Sushi"]))
        .await
        .unwrap();

    submit_vote(&db, &answers[0].id, 1, "Ana").await.unwrap();
    let result = submit_vote(&db, &answers[1].id, 1, "Anaïs").await.unwrap();

    let text = result.poll.unwrap().text;
    assert!(text.contains("Pizza (1 👍: Anaïs)"), "got: {text}");
    assert!(text.contains("Sushi (1 👍: Anaïs)"), "got: {text}");

    let voters: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM voters")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(voters, 1);
}

#[tokio::test]
async fn double_toggle_is_a_no_op() {
    let db = memory_store().await;
    let (_poll, answers) = store::create_poll(&db, "Lunch?", "Chef", &choices(&["Pizza", "Sushi"]))
        .await
        .unwrap();

    submit_vote(&db, &answers[0].id, 1, "A").await.unwrap();
    submit_vote(&db, &answers[0].id, 1, "A").await.unwrap();
    assert_eq!(vote_count(&db).await, 0);
}
