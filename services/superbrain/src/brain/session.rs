//! services/superbrain/src/brain/session.rs
//!
//! Drives one grounded conversation against the generation API, given either
//! a single document's text or an aggregated library context. Each session's
//! transcript is private; turns are strictly ordered within a session.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use student_hub_core::domain::{AggregatedContext, ChatTurn};
use student_hub_core::ports::{GenerationRequest, GenerationService};

use crate::error::HubError;

/// The grounding a session is bound to for its entire lifetime.
#[derive(Debug, Clone)]
pub enum Grounding {
    /// One document's extracted text.
    Document { title: String, text: String },
    /// A whole-library (or one-subject) context snapshot.
    Library(Arc<AggregatedContext>),
}

impl Grounding {
    fn text(&self) -> &str {
        match self {
            Grounding::Document { text, .. } => text,
            Grounding::Library(context) => &context.text,
        }
    }
}

/// The per-turn state machine: `Idle → AwaitingResponse → Idle`, and
/// `Idle → Closed` on session end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingResponse,
    Closed,
}

/// Tunables for a chat session, derived from `Config`.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Character budget for grounding text per request. Distinct from and
    /// generally smaller than the aggregator's own budget.
    pub model_input_budget: usize,
    /// How long without activity before the session is flagged idle.
    pub idle_threshold: Duration,
    /// How often the idle watchdog wakes up.
    pub idle_poll_interval: Duration,
    /// The user-visible message returned when the generation API fails.
    pub fallback_message: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model_input_budget: 30_000,
            idle_threshold: Duration::from_secs(300),
            idle_poll_interval: Duration::from_secs(30),
            fallback_message:
                "I'm having trouble connecting to the AI right now. Please try again in a moment."
                    .to_string(),
        }
    }
}

struct SessionState {
    grounding: Grounding,
    history: Vec<ChatTurn>,
    phase: Phase,
    /// Monotonic, so the idle watchdog behaves under a paused test clock.
    last_activity: Instant,
    idle: bool,
}

/// One grounded conversation, owned by the client that opened it.
///
/// No concurrent in-flight requests per session: a new user turn while one is
/// awaiting its response is rejected, never interleaved, to keep transcript
/// ordering deterministic.
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    generation: Arc<dyn GenerationService>,
    settings: ChatSettings,
    state: Arc<Mutex<SessionState>>,
    cancel: CancellationToken,
}

impl ChatSession {
    /// Opens a new session bound to the given grounding and spawns its idle
    /// watchdog. The watchdog is stopped deterministically on `close`.
    pub fn open(
        user_id: Uuid,
        grounding: Grounding,
        generation: Arc<dyn GenerationService>,
        settings: ChatSettings,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState {
            grounding,
            history: Vec::new(),
            phase: Phase::Idle,
            last_activity: Instant::now(),
            idle: false,
        }));

        let session = Self {
            id: Uuid::new_v4(),
            user_id,
            generation,
            settings,
            state,
            cancel: CancellationToken::new(),
        };
        session.spawn_idle_watchdog();
        session
    }

    /// Submits one user turn and returns the assistant's reply.
    ///
    /// On generation failure the configured fallback message is returned and
    /// the user's question stays in history (not removed, not duplicated) so
    /// context is preserved for a retry.
    pub async fn submit_turn(&self, user_text: &str) -> Result<String, HubError> {
        let request = {
            let mut state = self.state.lock().await;
            match state.phase {
                Phase::Closed => return Err(HubError::SessionClosed),
                Phase::AwaitingResponse => return Err(HubError::TurnInFlight),
                Phase::Idle => {}
            }

            state.history.push(ChatTurn::user(user_text));
            state.phase = Phase::AwaitingResponse;
            state.last_activity = Instant::now();
            state.idle = false;

            GenerationRequest {
                grounding: truncate_chars(
                    state.grounding.text(),
                    self.settings.model_input_budget,
                )
                .to_string(),
                history: state.history.clone(),
            }
        };

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                info!("Session {} closed mid-turn; abandoning the request.", self.id);
                return Err(HubError::SessionClosed);
            }
            result = self.generation.generate(&request) => result,
        };

        let mut state = self.state.lock().await;
        if state.phase == Phase::Closed {
            // The session closed while the call was in flight; the result is
            // discarded, never applied to a closed session's history.
            info!("Discarding a late generation result for closed session {}.", self.id);
            return Err(HubError::SessionClosed);
        }
        state.phase = Phase::Idle;
        state.last_activity = Instant::now();

        match result {
            Ok(answer) => {
                state.history.push(ChatTurn::assistant(&answer));
                Ok(answer)
            }
            Err(e) => {
                warn!("Generation API failed for session {}: {}", self.id, e);
                Ok(self.settings.fallback_message.clone())
            }
        }
    }

    /// Closes the session: cancels any in-flight request and stops the idle
    /// watchdog. Idempotent.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Closed {
            state.phase = Phase::Closed;
            self.cancel.cancel();
            info!("Session {} closed.", self.id);
        }
    }

    /// A copy of the transcript so far.
    pub async fn history(&self) -> Vec<ChatTurn> {
        self.state.lock().await.history.clone()
    }

    pub async fn is_idle(&self) -> bool {
        self.state.lock().await.idle
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.phase == Phase::Closed
    }

    /// Spawns the task that flips the idle flag once the threshold elapses
    /// without activity. Replaces the original UI-timer polling with an
    /// explicit, cancelable scheduled task owned by the session.
    fn spawn_idle_watchdog(&self) {
        let state = self.state.clone();
        let cancel = self.cancel.clone();
        let threshold = self.settings.idle_threshold;
        let poll_interval = self.settings.idle_poll_interval;
        let session_id = self.id;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }

                let mut state = state.lock().await;
                if state.phase == Phase::Closed {
                    break;
                }
                if !state.idle && state.last_activity.elapsed() >= threshold {
                    state.idle = true;
                    info!("Session {} is now idle.", session_id);
                }
            }
        });
    }
}

/// Keeps the earliest `max_chars` characters of `text`, never splitting a
/// character. Documents are already ordered deterministically by the
/// aggregator, so this truncation is reproducible.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
