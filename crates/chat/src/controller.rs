//! Conversation controller: orchestrates one user turn.
//!
//! A turn walks `Idle → Retrieving → Streaming → Committing → Idle`;
//! retrieval and streaming failures divert to a single user-visible error
//! message and return to `Idle`. The phase value is the only turn state:
//! invalid combinations (e.g. streaming with a visible placeholder) are
//! unrepresentable because each transition clears the markers it retires.

use crate::consumer::StreamConsumer;
use crate::conversation::{Conversation, Placeholder};
use crate::transport::ChatTransport;
use sitechat_core::{AppError, AppResult, CancelToken};
use sitechat_relay::Message;
use sitechat_retrieval::{KnowledgeEntry, Retriever};
use std::sync::Arc;
use std::time::Duration;

/// Turn lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn in flight; submission is enabled
    Idle,
    /// Gathering retrieval context (best-effort)
    Retrieving,
    /// Consuming the relay byte stream
    Streaming,
    /// Folding the final text into the log
    Committing,
}

/// How a submitted turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An assistant message with this content was committed
    Committed(String),
    /// The stream completed with no content; nothing was appended
    EmptyCompletion,
    /// The turn failed; one assistant message naming the category was
    /// appended
    Failed { category: &'static str },
    /// The caller cancelled; nothing was appended
    Cancelled,
}

/// Orchestrates chat turns over a retriever and a relay transport.
pub struct ChatController {
    retriever: Arc<Retriever>,
    transport: Arc<dyn ChatTransport>,
    conversation: Conversation,
    phase: TurnPhase,
    top_k: usize,
    read_timeout: Duration,
}

impl ChatController {
    /// Create a controller with an empty conversation.
    pub fn new(
        retriever: Arc<Retriever>,
        transport: Arc<dyn ChatTransport>,
        top_k: usize,
        read_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            transport,
            conversation: Conversation::new(),
            phase: TurnPhase::Idle,
            top_k,
            read_timeout,
        }
    }

    /// The conversation state.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The current turn phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Whether a new submission would be accepted.
    pub fn can_submit(&self) -> bool {
        self.phase == TurnPhase::Idle
    }

    /// Submit one user turn.
    ///
    /// See [`Self::submit_with_progress`]; this variant discards the live
    /// delta notifications.
    pub async fn submit(&mut self, input: &str, cancel: &CancelToken) -> AppResult<TurnOutcome> {
        self.submit_with_progress(input, cancel, |_| {}).await
    }

    /// Submit one user turn, observing each streamed delta.
    ///
    /// Rejected with `AppError::Chat` when a turn is already in flight or
    /// the input is empty; rejection leaves the log untouched and issues no
    /// transport call. Every accepted turn ends back in `Idle` with
    /// `pending` and `partial` cleared, whatever the outcome.
    pub async fn submit_with_progress<F>(
        &mut self,
        input: &str,
        cancel: &CancelToken,
        mut progress: F,
    ) -> AppResult<TurnOutcome>
    where
        F: FnMut(&str),
    {
        if self.phase != TurnPhase::Idle {
            return Err(AppError::Chat("A turn is already in flight".to_string()));
        }

        let input = input.trim();
        if input.is_empty() {
            return Err(AppError::Chat("Cannot submit an empty message".to_string()));
        }

        self.conversation.log.push(Message::user(input));
        self.conversation.pending = Some(Placeholder::default());
        self.phase = TurnPhase::Retrieving;

        let result = self.run_turn(input, cancel, &mut progress).await;

        match result {
            Ok(full_text) => {
                self.phase = TurnPhase::Committing;

                let outcome = if full_text.is_empty() {
                    // Empty completion: a no-op turn, nothing to append
                    tracing::debug!("Stream completed with no content");
                    TurnOutcome::EmptyCompletion
                } else {
                    self.conversation.log.push(Message::assistant(&full_text));
                    TurnOutcome::Committed(full_text)
                };

                self.finish_turn();
                Ok(outcome)
            }
            Err(err) if err.is_cancelled() => {
                // Silent: no message is committed on cancellation
                tracing::info!("Turn cancelled");
                self.finish_turn();
                Ok(TurnOutcome::Cancelled)
            }
            Err(err) => {
                tracing::error!("Turn failed: {}", err);
                let category = err.category();
                self.conversation
                    .log
                    .push(Message::assistant(failure_message(category)));
                self.finish_turn();
                Ok(TurnOutcome::Failed { category })
            }
        }
    }

    /// Drive retrieval and streaming for an accepted turn.
    async fn run_turn<F>(
        &mut self,
        input: &str,
        cancel: &CancelToken,
        progress: &mut F,
    ) -> AppResult<String>
    where
        F: FnMut(&str),
    {
        // Retrieval is best-effort: an unreachable knowledge source
        // degrades to an empty context instead of aborting the turn
        let context = match self.retriever.query(input, self.top_k).await {
            Ok(entries) => build_context(&entries),
            Err(err) => {
                tracing::warn!("Retrieval failed, continuing without context: {}", err);
                None
            }
        };

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        // Outgoing list: optional system context plus the full log. The
        // placeholder is never part of the log, so no filtering is needed.
        let mut outgoing = Vec::with_capacity(self.conversation.log.len() + 1);
        if let Some(context) = context {
            outgoing.push(Message::system(context));
        }
        outgoing.extend(self.conversation.log.iter().cloned());

        self.phase = TurnPhase::Streaming;
        self.conversation.pending = None;

        let transport = Arc::clone(&self.transport);
        let stream = transport.open_stream(&outgoing).await?;

        self.conversation.partial = Some(String::new());
        let read_timeout = self.read_timeout;
        let partial = &mut self.conversation.partial;

        StreamConsumer::consume(stream, cancel, read_timeout, |delta| {
            // Mirror the growing text for live display
            if let Some(partial) = partial.as_mut() {
                partial.push_str(delta);
            }
            progress(delta);
        })
        .await
    }

    /// Clear the transient turn markers and return to `Idle`.
    fn finish_turn(&mut self) {
        self.conversation.pending = None;
        self.conversation.partial = None;
        self.phase = TurnPhase::Idle;
    }
}

/// Build the system-context message from retrieved entries.
///
/// Returns `None` when nothing was retrieved; the turn then runs without a
/// system message.
fn build_context(entries: &[KnowledgeEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let sections: Vec<String> = entries
        .iter()
        .map(|entry| format!("[{}]\n{}", entry.route, entry.content))
        .collect();

    Some(format!(
        "You are the site's assistant. Answer using only the site content below. \
         If the content does not cover the question, say so.\n\n{}",
        sections.join("\n\n---\n\n")
    ))
}

/// One user-visible failure message per turn, naming only the category.
fn failure_message(category: &str) -> String {
    format!(
        "Sorry, something went wrong while answering ({} error). Please try again.",
        category
    )
}
