use super::{AppState, Tally};
use crate::protocol::ServerMessage;
use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The question is live; `generation` identifies this open episode
    Accepted { generation: u64 },
    /// Another question is still open, nothing changed
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Counted; carries the recomputed percentages
    Recorded(PercentageResult),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoOpenQuestion,
    AlreadyAnswered,
}

#[derive(Debug)]
struct OpenQuestion {
    question: Question,
    generation: u64,
    asked_at: DateTime<Utc>,
}

/// A question that just closed, with its final percentages
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedQuestion {
    pub question: Question,
    pub asked_at: DateTime<Utc>,
    pub result: PercentageResult,
}

/// Question lifecycle: idle -> open -> idle.
///
/// `answered_by` and `tally` are reset together with every open and close, so
/// an idle session never carries answers.
#[derive(Debug, Default)]
pub struct Session {
    open: Option<OpenQuestion>,
    generation: u64,
    answered_by: HashSet<ParticipantId>,
    tally: Tally,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.open.as_ref().map(|open| &open.question)
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Open `question` unless one is already open
    pub fn open_question(&mut self, question: Question) -> OpenOutcome {
        if self.open.is_some() {
            return OpenOutcome::Rejected;
        }

        self.generation += 1;
        self.answered_by.clear();
        self.tally.reset();
        self.open = Some(OpenQuestion {
            question,
            generation: self.generation,
            asked_at: Utc::now(),
        });

        OpenOutcome::Accepted {
            generation: self.generation,
        }
    }

    /// Record one answer per participant while a question is open.
    ///
    /// Any option string is counted. Undeclared options never show up in the
    /// percentages but still add to the total.
    pub fn submit_answer(&mut self, participant_id: &str, option: &str) -> AnswerOutcome {
        let Some(open) = &self.open else {
            return AnswerOutcome::Ignored(IgnoreReason::NoOpenQuestion);
        };
        if self.answered_by.contains(participant_id) {
            return AnswerOutcome::Ignored(IgnoreReason::AlreadyAnswered);
        }

        self.answered_by.insert(participant_id.to_string());
        self.tally.record(option);
        AnswerOutcome::Recorded(self.tally.snapshot(&open.question.options))
    }

    /// Close the episode started as `generation`.
    ///
    /// Returns the closed question with its final percentages, or `None` when
    /// idle or when the timer belongs to an episode that is already over.
    pub fn expire(&mut self, generation: u64) -> Option<ClosedQuestion> {
        match &self.open {
            Some(open) if open.generation == generation => {}
            _ => return None,
        }

        let open = self.open.take()?;
        let result = self.tally.snapshot(&open.question.options);
        self.answered_by.clear();
        self.tally.reset();
        Some(ClosedQuestion {
            question: open.question,
            asked_at: open.asked_at,
            result,
        })
    }
}

impl AppState {
    /// Open a question, broadcast it, and start its countdown
    pub async fn ask_question(self: &Arc<Self>, question: Question) -> OpenOutcome {
        let duration = question.duration_or(self.config.default_question_duration_ms);

        let mut session = self.session.write().await;
        let outcome = session.open_question(question.clone());
        let OpenOutcome::Accepted { generation } = outcome else {
            tracing::info!("Question '{}' dropped: another question is open", question.text);
            return outcome;
        };

        tracing::info!(
            "Question opened: '{}' ({} options, {:?}, generation {})",
            question.text,
            question.options.len(),
            duration,
            generation
        );
        self.router
            .broadcast(ServerMessage::NewQuestion(question.clone()))
            .await;
        drop(session);

        self.schedule_close(generation, duration);

        outcome
    }

    fn schedule_close(self: &Arc<Self>, generation: u64, duration: Duration) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            state.close_question(generation).await;
        });
    }

    /// Timer expiry for the episode `generation`; broadcasts the final results
    /// and saves the finished poll
    pub async fn close_question(&self, generation: u64) -> Option<PercentageResult> {
        let mut session = self.session.write().await;
        let Some(closed) = session.expire(generation) else {
            tracing::debug!("Stale close for generation {}, ignoring", generation);
            return None;
        };

        tracing::info!(
            "Question closed (generation {}): {:?}",
            generation,
            closed.result
        );
        self.router
            .broadcast(ServerMessage::UpdateResults(closed.result.clone()))
            .await;
        drop(session);

        let duration = closed
            .question
            .duration_or(self.config.default_question_duration_ms);
        let result = closed.result.clone();
        self.persist_poll(PollRecord::from_closed(
            &closed.question,
            duration,
            closed.asked_at,
            closed.result,
        ));
        Some(result)
    }

    /// Record an answer and broadcast the live percentages
    pub async fn submit_answer(&self, participant_id: &str, option: &str) -> AnswerOutcome {
        let mut session = self.session.write().await;
        let outcome = session.submit_answer(participant_id, option);

        match &outcome {
            AnswerOutcome::Recorded(result) => {
                tracing::debug!("Answer from {}: {}", participant_id, option);
                // Still under the session lock so snapshots go out in tally order
                self.router
                    .broadcast(ServerMessage::UpdateResults(result.clone()))
                    .await;
            }
            AnswerOutcome::Ignored(reason) => {
                tracing::debug!(
                    "Answer from {} ignored: {:?}",
                    participant_id,
                    reason
                );
            }
        }

        outcome
    }
}
