//! Per-message orchestration: match, record, compose, deliver.
//!
//! This is the only place where store and sink failures are turned into a
//! per-message outcome. A message whose scores could not be recorded is never
//! answered, so a reply always reflects persisted counters.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::ledger::{DEFAULT_LEADERBOARD_SIZE, ScoreLedger};
use super::markdown::{escape, mention};
use super::matcher::SequenceMatcher;
use super::message::{InboundMessage, Reply, Sender};
use super::numeric::{NumericSum, NumericTarget};
use super::obfuscate::obfuscate;
use super::ports::{ChatCommand, CounterStoreError, ReplySink, ReplySinkError};
use super::score::{CounterKind, LeaderboardEntry, ScoreEvent, ScoreUpdate};

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Malformed input; nothing was done.
    Skipped,
    /// Nothing to report.
    NoMatch,
    /// A reply was delivered.
    Replied,
}

/// Per-message failures. None of them affects other messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The ledger could not record the event or read the leaderboard.
    #[error("score store unavailable: {0}")]
    StoreUnavailable(#[source] CounterStoreError),
    /// The reply was composed but the sink did not deliver it.
    #[error("reply delivery failed: {0}")]
    DeliveryFailure(#[source] ReplySinkError),
}

/// Composes matcher, ledger and sink into the message flow.
pub struct MessagePipeline {
    matcher: SequenceMatcher,
    numeric: Option<NumericTarget>,
    ledger: ScoreLedger,
    sink: Arc<dyn ReplySink>,
    leaderboard_size: usize,
}

impl MessagePipeline {
    /// Build a pipeline with the pattern trigger only.
    pub fn new(matcher: SequenceMatcher, ledger: ScoreLedger, sink: Arc<dyn ReplySink>) -> Self {
        Self {
            matcher,
            numeric: None,
            ledger,
            sink,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    /// Enable the numeric-sum trigger.
    pub fn with_numeric_target(mut self, target: Option<NumericTarget>) -> Self {
        self.numeric = target;
        self
    }

    /// Override the number of leaderboard rows.
    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    /// Process one plain-text message.
    ///
    /// The pattern trigger wins when a message satisfies both triggers, so
    /// every message records at most one event.
    pub async fn handle_text(&self, message: &InboundMessage) -> Result<Outcome, PipelineError> {
        if message.text.trim().is_empty() {
            debug!(chat_id = %message.chat_id, "skipping message without text");
            return Ok(Outcome::Skipped);
        }

        let scan = self.matcher.scan(&message.text);
        if let Some(positions) = scan.result.positions() {
            let body = obfuscate(scan.text.chars(), positions);
            let update = self.record(CounterKind::Pattern, &message.sender).await?;
            let caption = self.pattern_caption(&message.sender, update);
            return self
                .deliver(Reply::rich_text_to(message, format!("{body}\n\n{caption}")))
                .await;
        }

        if let Some(sum) = self.numeric.and_then(|target| target.check(&message.text)) {
            let update = self
                .record(CounterKind::NumericSum, &message.sender)
                .await?;
            let caption = numeric_caption(&sum, &message.sender, update);
            return self.deliver(Reply::rich_text_to(message, caption)).await;
        }

        debug!(chat_id = %message.chat_id, "no match");
        Ok(Outcome::NoMatch)
    }

    /// Reply to `message` with the leaderboard for `kind`.
    pub async fn show_leaderboard(
        &self,
        message: &InboundMessage,
        kind: CounterKind,
    ) -> Result<Outcome, PipelineError> {
        let entries = self
            .ledger
            .top(kind, self.leaderboard_size)
            .await
            .map_err(PipelineError::StoreUnavailable)?;
        let text = self.leaderboard_text(kind, &entries);
        self.deliver(Reply::rich_text_to(message, text)).await
    }

    async fn record(
        &self,
        kind: CounterKind,
        sender: &Sender,
    ) -> Result<ScoreUpdate, PipelineError> {
        let event = ScoreEvent {
            kind,
            user_id: sender.id,
            display_name: sender.display_name.clone(),
        };
        let update = self
            .ledger
            .record_match(event)
            .await
            .map_err(PipelineError::StoreUnavailable)?;
        info!(
            %kind,
            user_id = %sender.id,
            user_score = update.user_score,
            global_score = update.global_score,
            "recorded match"
        );
        Ok(update)
    }

    async fn deliver(&self, reply: Reply) -> Result<Outcome, PipelineError> {
        self.sink
            .send(&reply)
            .await
            .map_err(PipelineError::DeliveryFailure)?;
        Ok(Outcome::Replied)
    }

    fn pattern_caption(&self, sender: &Sender, update: ScoreUpdate) -> String {
        let pattern = self.matcher.pattern().as_str();
        format!(
            "{}{}{}",
            escape(&format!(
                "Hidden {pattern} detected! {} have been discovered so far. ",
                update.global_score
            )),
            mention(&sender.display_name, sender.id.get()),
            escape(&format!(
                " has already worshiped the {pattern} {} time(s).",
                update.user_score
            )),
        )
    }

    fn leaderboard_text(&self, kind: CounterKind, entries: &[LeaderboardEntry]) -> String {
        let pattern = self.matcher.pattern().as_str();
        if entries.is_empty() {
            return escape(&match kind {
                CounterKind::Pattern => format!("Nobody has found the hidden {pattern} yet."),
                CounterKind::NumericSum => "Nobody has found a matching sum yet.".to_owned(),
            });
        }

        let heading = match kind {
            CounterKind::Pattern => format!("Top {} {pattern} worshipers:", entries.len()),
            CounterKind::NumericSum => format!("Top {} sum finders:", entries.len()),
        };
        let mut lines = vec![escape(&heading)];
        lines.extend(entries.iter().enumerate().map(|(index, entry)| {
            format!(
                "{}\\. {} — {}",
                index + 1,
                mention(&entry.display_name, entry.user_id.get()),
                escape(&entry.score.to_string()),
            )
        }));
        lines.join("\n")
    }
}

fn numeric_caption(sum: &NumericSum, sender: &Sender, update: ScoreUpdate) -> String {
    format!(
        "{}{}{}",
        escape(&format!(
            "{sum}! {} sums have been found so far. ",
            update.global_score
        )),
        mention(&sender.display_name, sender.id.get()),
        escape(&format!(" has found {} of them.", update.user_score)),
    )
}

#[async_trait]
impl ChatCommand for MessagePipeline {
    async fn handle_text(&self, message: &InboundMessage) -> Result<Outcome, PipelineError> {
        MessagePipeline::handle_text(self, message).await
    }

    async fn show_leaderboard(
        &self,
        message: &InboundMessage,
        kind: CounterKind,
    ) -> Result<Outcome, PipelineError> {
        MessagePipeline::show_leaderboard(self, message, kind).await
    }
}
