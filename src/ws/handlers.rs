//! WebSocket message dispatch
//!
//! Maps each inbound event of one connection onto the session, directory or
//! router. The returned message, if any, goes back to the sender only.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::ConnectionId;
use std::sync::Arc;

use super::{participant, presenter};

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    connection_id: &ConnectionId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Presenter events
        ClientMessage::AskQuestion(question) => {
            presenter::handle_ask_question(state, question).await
        }

        ClientMessage::KickStudent(name) => presenter::handle_kick_student(state, name).await,

        // Participant events
        ClientMessage::RegisterUser(name, role) => {
            participant::handle_register_user(state, connection_id, name, role).await
        }

        ClientMessage::SubmitAnswer(answer) => {
            participant::handle_submit_answer(state, answer).await
        }

        ClientMessage::SendMessage(payload) => {
            participant::handle_send_message(state, payload).await
        }
    }
}
