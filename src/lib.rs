// Library entry so integration tests can drive the poll store and the vote
// toggle engine without a Telegram connection.
pub mod cmd_question;
pub mod cmd_vote;
pub mod commands;
pub mod config;
pub mod render;
pub mod store;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
