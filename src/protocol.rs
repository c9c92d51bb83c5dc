use crate::types::*;
use serde::{Deserialize, Serialize};

/// Frames are `{"event": "<name>", "data": <payload>}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Presenter opens a new question
    AskQuestion(Question),
    SubmitAnswer(AnswerPayload),
    /// `[name, role]`
    RegisterUser(String, Role),
    /// Display name of the participant to remove
    KickStudent(String),
    SendMessage(MessagePayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub student_id: ParticipantId,
    pub answer: String,
}

/// A private message addressed by display name.
///
/// Everything besides `recipient` is opaque and forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagePayload {
    pub recipient: String,
    #[serde(flatten)]
    pub body: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    NewQuestion(Question),
    UpdateResults(PercentageResult),
    UpdateOnlineUsers(Vec<Participant>),
    Kicked,
    ReceiveMessage(MessagePayload),
    Error { code: String, msg: String },
}
