//! Participant message handlers
//!
//! Registration, answers and private messages.

use crate::protocol::{AnswerPayload, MessagePayload, ServerMessage};
use crate::state::{AppState, Delivery, DirectoryError};
use crate::types::{ConnectionId, Role};
use std::sync::Arc;

pub async fn handle_register_user(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    name: String,
    role: Role,
) -> Option<ServerMessage> {
    tracing::info!("Registration: {} as {:?}", name, role);
    match state.register_user(connection_id, &name, role).await {
        Ok(_) => None,
        Err(e) => {
            let code = match e {
                DirectoryError::EmptyName => "INVALID_NAME",
                DirectoryError::NameTaken(_) => "NAME_TAKEN",
            };
            tracing::info!("Registration refused for {}: {}", connection_id, e);
            Some(ServerMessage::Error {
                code: code.to_string(),
                msg: e.to_string(),
            })
        }
    }
}

pub async fn handle_submit_answer(
    state: &Arc<AppState>,
    answer: AnswerPayload,
) -> Option<ServerMessage> {
    state
        .submit_answer(&answer.student_id, &answer.answer)
        .await;
    None
}

pub async fn handle_send_message(
    state: &Arc<AppState>,
    payload: MessagePayload,
) -> Option<ServerMessage> {
    tracing::debug!("sendMessage for {}", payload.recipient);
    if state.route_message(payload).await == Delivery::ChannelClosed {
        tracing::debug!("Recipient disconnected before delivery");
    }
    None
}
