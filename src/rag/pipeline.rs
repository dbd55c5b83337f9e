// End-to-end turn processing: retrieve -> compose -> record
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::errors::Result;
use crate::knowledge::embedding::Embedder;
use crate::knowledge::index::{FactIndex, FactStoreBuilder};
use crate::knowledge::dataset::FactPair;
use crate::generation::TextGenerator;
use crate::rag::composer::{error_message, AnswerComposer, ComposeMode, ComposedAnswer};
use crate::rag::retrieval::{RetrievalHit, Retriever};
use crate::session::{SessionState, TurnEvent, TurnState};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};

/// What happened during one turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub query: String,
    pub answer: String,
    pub retrieved: Option<RetrievalHit>,
    /// `None` when the turn failed before a prompt was chosen
    pub mode: Option<ComposeMode>,
    /// `Done` or `Errored`
    pub outcome: TurnState,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl TurnReport {
    pub fn is_error(&self) -> bool {
        self.outcome == TurnState::Errored
    }
}

/// The retrieval-augmented answer pipeline
///
/// Index and embedder are shared read-only; one turn runs to completion
/// before the next is accepted.
pub struct ChatPipeline {
    retriever: Retriever,
    composer: AnswerComposer,
    telemetry: TelemetryCollector,
}

impl ChatPipeline {
    pub fn new(retriever: Retriever, composer: AnswerComposer) -> Self {
        Self {
            retriever,
            composer,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Build the fact index and wire everything together.
    ///
    /// Fails with a configuration error if the index cannot be built.
    pub fn build(
        facts: &[FactPair],
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        max_distance: Option<f32>,
    ) -> Result<Self> {
        let index = FactStoreBuilder::new(embedder.clone()).build(facts)?;
        let retriever = Retriever::new(embedder, Arc::new(index)).with_max_distance(max_distance);
        let composer = AnswerComposer::new(generator);
        info!(
            facts = retriever.index().len(),
            embedder = retriever.embedder_name(),
            generator = composer.generator_name(),
            "Pipeline built"
        );
        Ok(Self::new(retriever, composer))
    }

    /// Share a telemetry collector with the caller
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Process one user turn.
    ///
    /// The transcript gains exactly one user and one assistant entry, whatever
    /// happens. The session comes back in `Idle`.
    pub async fn process_turn(&self, mut session: SessionState, query: &str) -> (SessionState, TurnReport) {
        let started = Instant::now();
        self.telemetry.record(TelemetryEvent::TurnStarted { timestamp: started });

        // A previous turn that never reset must not wedge the session
        if session.turn_state != TurnState::Idle {
            warn!(state = ?session.turn_state, "Session not idle at turn start, forcing reset");
            session.turn_state = TurnState::Idle;
        }

        session.transcript.push_user(query);
        session.turns += 1;

        let mut retrieved = None;
        let mut mode = None;
        let result = self.run_turn(&mut session, query, &mut retrieved, &mut mode).await;

        let (answer, error) = match result {
            Ok(composed) => (composed.text, composed.error),
            Err(e) => {
                if session.turn_state.is_in_progress() {
                    let _ = session.advance(TurnEvent::Failed);
                }
                (error_message(&e), Some(e.to_string()))
            }
        };
        let outcome = session.turn_state;
        session.transcript.push_assistant(answer.clone());

        let duration_ms = started.elapsed().as_millis() as u64;
        match (&error, mode) {
            (None, Some(mode)) => {
                self.telemetry.record(TelemetryEvent::TurnCompleted {
                    mode,
                    duration_ms,
                    timestamp: Instant::now(),
                });
                info!(mode = mode.as_str(), duration_ms, "Turn complete");
            }
            _ => {
                let reason = error.clone().unwrap_or_default();
                warn!(error = %reason, duration_ms, "Turn failed");
                self.telemetry.record(TelemetryEvent::TurnFailed {
                    reason,
                    timestamp: Instant::now(),
                });
            }
        }

        if session.advance(TurnEvent::Reset).is_err() {
            session.turn_state = TurnState::Idle;
        }

        let report = TurnReport {
            query: query.to_string(),
            answer,
            retrieved,
            mode,
            outcome,
            error,
            duration_ms,
        };
        (session, report)
    }

    async fn run_turn(
        &self,
        session: &mut SessionState,
        query: &str,
        retrieved: &mut Option<RetrievalHit>,
        mode: &mut Option<ComposeMode>,
    ) -> Result<ComposedAnswer> {
        session.advance(TurnEvent::QueryReceived)?;

        let hit = self
            .retriever
            .retrieve(query)?
            .filter(|hit| !hit.answer.trim().is_empty());
        match &hit {
            Some(hit) => {
                self.telemetry.record(TelemetryEvent::FactRetrieved {
                    row: hit.row,
                    distance: hit.distance,
                    timestamp: Instant::now(),
                });
                session.advance(TurnEvent::MatchFound)?;
            }
            None => {
                self.telemetry.record(TelemetryEvent::RetrievalMiss { timestamp: Instant::now() });
                session.advance(TurnEvent::NoMatch)?;
            }
        }
        *retrieved = hit;

        let composed = self
            .composer
            .compose(query, retrieved.as_ref().map(|h| h.answer.as_str()))
            .await;
        *mode = Some(composed.mode);

        if composed.is_error() {
            session.advance(TurnEvent::Failed)?;
        } else {
            session.advance(TurnEvent::Composed)?;
        }
        Ok(composed)
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn index(&self) -> &FactIndex {
        self.retriever.index()
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }
}
