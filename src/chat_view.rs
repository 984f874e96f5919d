//! In-memory chat state behind the terminal front end.
//!
//! The view owns the transcript, the draft being typed and the in-flight flag.
//! Sending is split in two halves so a front end can keep handling keys while
//! the relay call is pending:
//!
//! * [`ChatView::begin_submit`] records the user turn and returns the request
//!   to send, or `None` when there is nothing to send or a request is already
//!   in flight.
//! * [`ChatView::finish_submit`] records the assistant turn for the outcome.
//!
//! [`ChatView::submit`] runs both halves against a [`ChatClient`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::chat_client::{ChatClient, RelayOutcome, TransportError};
use crate::io_struct::{ChatRequest, HistoryItem};

pub const CONNECT_FAILED: &str = "Failed to connect to server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: ChatRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// How prior turns are framed into `chat_history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFraming {
    /// Every prior turn becomes a question with an empty answer, whatever its
    /// role. This is the wire format the deployed service has been receiving.
    #[default]
    Verbatim,
    /// Each user turn is paired with the assistant turn that follows it.
    Paired,
}

impl HistoryFraming {
    pub fn frame(self, transcript: &[Turn]) -> Vec<HistoryItem> {
        match self {
            HistoryFraming::Verbatim => transcript
                .iter()
                .map(|turn| HistoryItem::new(turn.content.clone(), ""))
                .collect(),
            HistoryFraming::Paired => {
                let mut items = Vec::new();
                let mut turns = transcript.iter().peekable();
                while let Some(turn) = turns.next() {
                    if turn.role != ChatRole::User {
                        continue;
                    }
                    let answer = match turns.peek() {
                        Some(next) if next.role == ChatRole::Assistant => {
                            let answer = next.content.clone();
                            turns.next();
                            answer
                        }
                        _ => String::new(),
                    };
                    items.push(HistoryItem::new(turn.content.clone(), answer));
                }
                items
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    Edited,
    Quit,
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ChatView {
    transcript: Vec<Turn>,
    draft: String,
    is_sending: bool,
    framing: HistoryFraming,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_framing(framing: HistoryFraming) -> Self {
        ChatView {
            framing,
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    pub fn framing(&self) -> HistoryFraming {
        self.framing
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn begin_submit(&mut self) -> Option<ChatRequest> {
        if self.is_sending || self.draft.trim().is_empty() {
            return None;
        }
        let question = std::mem::take(&mut self.draft);
        let chat_history = self.framing.frame(&self.transcript);
        self.transcript.push(Turn::user(question.clone()));
        self.is_sending = true;
        Some(ChatRequest {
            question,
            chat_history,
        })
    }

    /// Appends the assistant turn for a finished request. Returns false and
    /// changes nothing when no request was in flight.
    pub fn finish_submit(&mut self, outcome: Result<RelayOutcome, TransportError>) -> bool {
        if !self.is_sending {
            log::warn!("Dropping relay outcome with no request in flight");
            return false;
        }
        let content = match outcome {
            Ok(RelayOutcome::Reply(response)) => response,
            Ok(RelayOutcome::Rejected { status, error }) => {
                log::error!("AI Error ({status}): {error}");
                format!("Error: {error}")
            }
            Err(e) => {
                log::error!("Error sending message: {e}");
                CONNECT_FAILED.to_string()
            }
        };
        self.transcript.push(Turn::assistant(content));
        self.is_sending = false;
        true
    }

    /// Sends the current draft and waits for the answer. Returns false when
    /// nothing was sent.
    pub async fn submit<C: ChatClient + ?Sized>(&mut self, client: &C) -> bool {
        let Some(request) = self.begin_submit() else {
            return false;
        };
        let outcome = client.send(&request).await;
        self.finish_submit(outcome)
    }

    /// Enter sends; Shift+Enter (or Alt+Enter, for terminals that cannot report
    /// Shift on Enter) inserts a newline instead.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                self.draft.push('\n');
                KeyAction::Edited
            }
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::Backspace => {
                self.draft.pop();
                KeyAction::Edited
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.draft.push(c);
                KeyAction::Edited
            }
            _ => KeyAction::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct ScriptedClient {
        replies: Mutex<Vec<Result<RelayOutcome, TransportError>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<RelayOutcome, TransportError>>) -> Self {
            ScriptedClient {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn send(&self, request: &ChatRequest) -> Result<RelayOutcome, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn reply(text: &str) -> Result<RelayOutcome, TransportError> {
        Ok(RelayOutcome::Reply(text.to_string()))
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[tokio::test]
    async fn test_first_submit_sends_empty_history() {
        let client = ScriptedClient::new(vec![reply("Hi there")]);
        let mut view = ChatView::new();
        view.set_draft("Hello");

        assert!(view.submit(&client).await);

        let seen = client.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].question, "Hello");
        assert!(seen[0].chat_history.is_empty());
        assert_eq!(
            view.transcript(),
            &[Turn::user("Hello"), Turn::assistant("Hi there")]
        );
        assert!(!view.is_sending());
        assert_eq!(view.draft(), "");
    }

    #[tokio::test]
    async fn test_second_submit_frames_prior_turns_verbatim() {
        let client = ScriptedClient::new(vec![reply("Hi there"), reply("Sure")]);
        let mut view = ChatView::new();
        view.set_draft("Hello");
        view.submit(&client).await;
        view.set_draft("Make a bucket");
        view.submit(&client).await;

        let history = &client.seen()[1].chat_history;
        assert_eq!(
            history,
            &vec![HistoryItem::new("Hello", ""), HistoryItem::new("Hi there", "")]
        );
    }

    #[tokio::test]
    async fn test_paired_framing_keeps_answers() {
        let client = ScriptedClient::new(vec![reply("Hi there"), reply("Sure")]);
        let mut view = ChatView::with_framing(HistoryFraming::Paired);
        view.set_draft("Hello");
        view.submit(&client).await;
        view.set_draft("Make a bucket");
        view.submit(&client).await;

        assert_eq!(
            client.seen()[1].chat_history,
            vec![HistoryItem::new("Hello", "Hi there")]
        );
    }

    #[test]
    fn test_paired_framing_unanswered_question() {
        let transcript = [
            Turn::user("a"),
            Turn::user("b"),
            Turn::assistant("B"),
            Turn::assistant("stray"),
        ];
        assert_eq!(
            HistoryFraming::Paired.frame(&transcript),
            vec![HistoryItem::new("a", ""), HistoryItem::new("b", "B")]
        );
    }

    #[tokio::test]
    async fn test_whitespace_submit_is_noop() {
        let client = ScriptedClient::new(vec![]);
        let mut view = ChatView::new();
        view.set_draft("   \n\t ");

        assert!(!view.submit(&client).await);
        assert!(client.seen().is_empty());
        assert!(view.transcript().is_empty());
        assert_eq!(view.draft(), "   \n\t ");
        assert!(!view.is_sending());
    }

    #[tokio::test]
    async fn test_rejected_reply_becomes_error_turn() {
        let client = ScriptedClient::new(vec![Ok(RelayOutcome::Rejected {
            status: 500,
            error: "API key is missing".to_string(),
        })]);
        let mut view = ChatView::new();
        view.set_draft("Hello");
        view.submit(&client).await;

        assert_eq!(
            view.transcript(),
            &[Turn::user("Hello"), Turn::assistant("Error: API key is missing")]
        );
        assert!(!view.is_sending());
    }

    #[tokio::test]
    async fn test_transport_failure_appends_one_turn() {
        let client = ScriptedClient::new(vec![Err(TransportError::Unavailable(
            "connection refused".to_string(),
        ))]);
        let mut view = ChatView::new();
        view.set_draft("Hello");
        view.submit(&client).await;

        assert_eq!(view.transcript().len(), 2);
        assert_eq!(view.transcript()[1], Turn::assistant(CONNECT_FAILED));
        assert!(!view.is_sending());
    }

    #[test]
    fn test_second_begin_submit_rejected_while_in_flight() {
        let mut view = ChatView::new();
        view.set_draft("first");
        assert!(view.begin_submit().is_some());
        assert!(view.is_sending());

        view.set_draft("second");
        assert!(view.begin_submit().is_none());
        assert_eq!(view.transcript(), &[Turn::user("first")]);
        assert_eq!(view.draft(), "second");

        assert!(view.finish_submit(reply("ok")));
        assert!(view.begin_submit().is_some());
    }

    #[test]
    fn test_finish_without_request_is_ignored() {
        let mut view = ChatView::new();
        assert!(!view.finish_submit(reply("late")));
        assert!(view.transcript().is_empty());
    }

    #[test]
    fn test_enter_submits_and_shift_enter_inserts_newline() {
        let mut view = ChatView::new();
        view.handle_key(key(KeyCode::Char('h'), KeyModifiers::NONE));
        view.handle_key(key(KeyCode::Char('i'), KeyModifiers::SHIFT));
        assert_eq!(
            view.handle_key(key(KeyCode::Enter, KeyModifiers::SHIFT)),
            KeyAction::Edited
        );
        view.handle_key(key(KeyCode::Char('x'), KeyModifiers::NONE));
        assert_eq!(view.draft(), "hi\nx");

        assert_eq!(
            view.handle_key(key(KeyCode::Enter, KeyModifiers::NONE)),
            KeyAction::Submit
        );
        assert_eq!(view.draft(), "hi\nx");
    }

    #[test]
    fn test_edit_and_quit_keys() {
        let mut view = ChatView::new();
        view.set_draft("ab");
        assert_eq!(
            view.handle_key(key(KeyCode::Backspace, KeyModifiers::NONE)),
            KeyAction::Edited
        );
        assert_eq!(view.draft(), "a");
        assert_eq!(
            view.handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
        assert_eq!(view.draft(), "a");
        assert_eq!(
            view.handle_key(key(KeyCode::Tab, KeyModifiers::NONE)),
            KeyAction::Ignored
        );
    }
}
