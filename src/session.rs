use crate::conversation::{ConversationEntry, ConversationStore};
use crate::error::FlowError;
use crate::flow::{FlowClient, FlowReply, Tweaks};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// One user's conversation with a flow.
///
/// The session is the only place a [`ConversationStore`] is mutated. It keeps
/// at most one request in flight: [`ChatSession::begin`] hands out a
/// [`PendingQuestion`] and refuses another until [`ChatSession::finish`] sees
/// the matching [`AnsweredQuestion`].
pub struct ChatSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    client: Arc<FlowClient>,
    tweaks: Option<Arc<Tweaks>>,
    store: ConversationStore,
    waiting: bool,
}

/// A question accepted by a session, ready to be sent.
///
/// Owns its client handle so it can run on a spawned task.
pub struct PendingQuestion {
    session_id: Uuid,
    question: String,
    client: Arc<FlowClient>,
    tweaks: Option<Arc<Tweaks>>,
}

/// The outcome of a [`PendingQuestion`], only produced by
/// [`PendingQuestion::send`].
#[derive(Debug)]
pub struct AnsweredQuestion {
    session_id: Uuid,
    question: String,
    outcome: Result<FlowReply, FlowError>,
}

impl AnsweredQuestion {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn question(&self) -> &str {
        &self.question
    }
}

impl PendingQuestion {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Perform the round trip, handing the question back with its outcome.
    pub async fn send(self) -> AnsweredQuestion {
        let outcome = self.client.run(&self.question, self.tweaks.as_deref()).await;
        AnsweredQuestion {
            session_id: self.session_id,
            question: self.question,
            outcome,
        }
    }
}

impl ChatSession {
    pub fn new(client: Arc<FlowClient>, tweaks: Option<Tweaks>) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            client,
            tweaks: tweaks.map(Arc::new),
            store: ConversationStore::new(),
            waiting: false,
        };
        tracing::info!(session = %session.id, url = session.client.url(), "session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn client(&self) -> &FlowClient {
        &self.client
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Accept a question for sending
    pub fn begin(&mut self, input: &str) -> Result<PendingQuestion, FlowError> {
        if input.trim().is_empty() {
            return Err(FlowError::EmptyInput);
        }
        if self.waiting {
            return Err(FlowError::Busy);
        }

        self.waiting = true;
        Ok(PendingQuestion {
            session_id: self.id,
            question: input.to_string(),
            client: Arc::clone(&self.client),
            tweaks: self.tweaks.clone(),
        })
    }

    /// Record the outcome of the question handed out by [`ChatSession::begin`].
    ///
    /// Answers from another session, or arriving when nothing is outstanding,
    /// are refused with [`FlowError::Stale`] and change nothing.
    pub fn finish(&mut self, answered: AnsweredQuestion) -> Result<&ConversationEntry, FlowError> {
        if answered.session_id != self.id || !self.waiting {
            tracing::debug!(session = %self.id, from = %answered.session_id, "ignoring stale answer");
            return Err(FlowError::Stale);
        }
        self.waiting = false;

        let AnsweredQuestion { question, outcome, .. } = answered;
        match outcome {
            Ok(reply) => {
                if reply.is_degraded() {
                    tracing::warn!(session = %self.id, "recording fallback answer");
                }
                let entry = self.store.append(question, reply.into_answer());
                tracing::debug!(session = %self.id, "entry appended");
                Ok(entry)
            }
            Err(err) => {
                tracing::error!(session = %self.id, error = %err, "question failed");
                Err(err)
            }
        }
    }

    /// Ask a question and wait for the answer
    pub async fn submit(&mut self, input: &str) -> Result<&ConversationEntry, FlowError> {
        let pending = self.begin(input)?;
        let answered = pending.send().await;
        self.finish(answered)
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        tracing::info!(session = %self.id, entries = self.store.len(), "session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowSettings;

    fn session() -> ChatSession {
        let settings = FlowSettings {
            name: "test".into(),
            title: "Test".into(),
            intro: String::new(),
            placeholder: String::new(),
            base_url: "http://127.0.0.1:9".into(),
            langflow_id: "id".into(),
            endpoint: "ep".into(),
            token: "tok".into(),
            tweaks: None,
        };
        ChatSession::new(Arc::new(FlowClient::new(&settings, None).unwrap()), None)
    }

    fn answer(pending: PendingQuestion, outcome: Result<FlowReply, FlowError>) -> AnsweredQuestion {
        AnsweredQuestion {
            session_id: pending.session_id,
            question: pending.question,
            outcome,
        }
    }

    #[test]
    fn blank_input_is_rejected_without_waiting() {
        let mut session = session();
        for input in ["", "   ", "\n\t "] {
            assert!(matches!(session.begin(input), Err(FlowError::EmptyInput)));
        }
        assert!(!session.is_waiting());
        assert!(session.store().is_empty());
    }

    #[test]
    fn second_question_is_refused_while_waiting() {
        let mut session = session();
        let pending = session.begin("first").unwrap();
        assert_eq!(pending.session_id(), session.id());
        assert!(session.is_waiting());
        assert!(matches!(session.begin("second"), Err(FlowError::Busy)));

        session
            .finish(answer(pending, Ok(FlowReply::Text("done".into()))))
            .unwrap();
        assert!(!session.is_waiting());
        assert!(session.begin("third").is_ok());
    }

    #[test]
    fn failures_leave_history_alone() {
        let mut session = session();
        let pending = session.begin("q").unwrap();
        let err = FlowError::Status {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(matches!(session.finish(answer(pending, Err(err))), Err(FlowError::Status { .. })));
        assert!(session.store().is_empty());
        assert!(!session.is_waiting());
    }

    #[test]
    fn degraded_reply_is_recorded_as_answer() {
        let mut session = session();
        let pending = session.begin("  keep spacing ").unwrap();
        let entry = session
            .finish(answer(pending, Ok(FlowReply::NoValidOutputs)))
            .unwrap()
            .clone();
        assert_eq!(entry, ConversationEntry::new("  keep spacing ", "No valid outputs received"));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn sessions_do_not_share_history() {
        let mut a = session();
        let b = session();
        let pending = a.begin("only in a").unwrap();
        a.finish(answer(pending, Ok(FlowReply::Text("x".into()))))
            .unwrap();
        assert_eq!(a.store().len(), 1);
        assert!(b.store().is_empty());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn answer_without_outstanding_question_is_refused() {
        let mut session = session();
        let pending = session.begin("once").unwrap();
        let duplicate = AnsweredQuestion {
            session_id: pending.session_id,
            question: pending.question.clone(),
            outcome: Ok(FlowReply::Text("again".into())),
        };
        session.finish(answer(pending, Ok(FlowReply::Text("first".into())))).unwrap();

        assert!(matches!(session.finish(duplicate), Err(FlowError::Stale)));
        assert_eq!(session.store().len(), 1);
        assert!(!session.is_waiting());
    }

    #[test]
    fn answer_from_another_session_is_refused() {
        let mut a = session();
        let mut b = session();
        let from_b = b.begin("for b").unwrap();
        a.begin("for a").unwrap();

        assert!(matches!(
            a.finish(answer(from_b, Ok(FlowReply::Text("x".into())))),
            Err(FlowError::Stale)
        ));
        assert!(a.is_waiting());
        assert!(a.store().is_empty());
    }
}
