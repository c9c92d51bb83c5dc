//! Presenter message handlers
//!
//! Opening questions and kicking participants. Outcomes are broadcast by the
//! state layer; the presenter gets no direct reply.

use crate::protocol::ServerMessage;
use crate::state::{AppState, KickOutcome, OpenOutcome};
use crate::types::Question;
use std::sync::Arc;

pub async fn handle_ask_question(
    state: &Arc<AppState>,
    question: Question,
) -> Option<ServerMessage> {
    tracing::info!("Question asked: {}", question.text);
    match state.ask_question(question).await {
        OpenOutcome::Accepted { generation } => {
            tracing::debug!("Question live as generation {}", generation);
        }
        OpenOutcome::Rejected => {}
    }
    None
}

pub async fn handle_kick_student(state: &Arc<AppState>, name: String) -> Option<ServerMessage> {
    tracing::info!("Presenter is kicking: {}", name);
    if let KickOutcome::Kicked(participant) = state.kick_student(&name).await {
        tracing::debug!("Removed {:?}", participant);
    }
    None
}
