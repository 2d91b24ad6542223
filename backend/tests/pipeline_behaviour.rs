//! Behavioural tests for the message pipeline and score ledger running
//! against the in-memory counter store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use acrostic::domain::ports::{ReplySink, ReplySinkError};
use acrostic::domain::{
    ChatId, CounterKind, Formatting, InboundMessage, MatchingMode, MessagePipeline,
    NumericTarget, Outcome, Pattern, RecordKey, Reply, ScoreEvent, ScoreLedger, Sender,
    SenderId, SequenceMatcher,
};
use acrostic::outbound::memory::InMemoryCounterStore;
use async_trait::async_trait;
use futures::future::join_all;
use rstest::{fixture, rstest};
use tokio::time::{sleep, timeout};

#[derive(Default)]
struct RecordingSink {
    replies: Mutex<Vec<Reply>>,
}

impl RecordingSink {
    fn texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .expect("sink lock")
            .iter()
            .map(|reply| reply.text.clone())
            .collect()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, reply: &Reply) -> Result<(), ReplySinkError> {
        self.replies.lock().expect("sink lock").push(reply.clone());
        Ok(())
    }
}

#[fixture]
fn store() -> Arc<InMemoryCounterStore> {
    Arc::new(
        InMemoryCounterStore::default()
            .with_interleaving()
            .with_page_size(3),
    )
}

fn event(user: i64) -> ScoreEvent {
    ScoreEvent {
        kind: CounterKind::Pattern,
        user_id: SenderId::new(user),
        display_name: format!("user {user}"),
    }
}

fn message(user: i64, name: &str, text: &str) -> InboundMessage {
    let sender = Sender::from_parts(SenderId::new(user), Some(name), None, None);
    InboundMessage::new(ChatId::new(-500), Some(user * 100), sender, text).expect("valid message")
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_matches_for_one_user_are_all_counted(store: Arc<InMemoryCounterStore>) {
    let ledger = ScoreLedger::new(store.clone());

    let results = join_all((0..64).map(|_| ledger.record_match(event(1)))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(
        store.count(&RecordKey::user(CounterKind::Pattern, SenderId::new(1))),
        Some(64)
    );
    assert_eq!(store.count(&RecordKey::global(CounterKind::Pattern)), Some(64));
}

#[rstest]
#[tokio::test]
async fn abandoned_match_still_updates_both_counters(store: Arc<InMemoryCounterStore>) {
    let ledger = ScoreLedger::new(store.clone());

    let _ = timeout(Duration::from_nanos(1), ledger.record_match(event(1))).await;
    sleep(Duration::from_millis(50)).await;

    assert_eq!(
        store.count(&RecordKey::user(CounterKind::Pattern, SenderId::new(1))),
        Some(1)
    );
    assert_eq!(store.count(&RecordKey::global(CounterKind::Pattern)), Some(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn global_counter_equals_sum_of_user_counters(store: Arc<InMemoryCounterStore>) {
    let ledger = ScoreLedger::new(store.clone());
    let events = (1..=5).flat_map(|user| std::iter::repeat_n(user, 12)).map(event);

    join_all(events.map(|event| ledger.record_match(event))).await;

    for user in 1..=5 {
        assert_eq!(
            store.count(&RecordKey::user(CounterKind::Pattern, SenderId::new(user))),
            Some(12)
        );
    }
    assert_eq!(store.count(&RecordKey::global(CounterKind::Pattern)), Some(60));
    let board = ledger
        .top(CounterKind::Pattern, 10)
        .await
        .expect("leaderboard");
    assert_eq!(board.iter().map(|entry| entry.score).sum::<i64>(), 60);
}

#[rstest]
#[tokio::test]
async fn leaderboard_is_ranked_and_capped(store: Arc<InMemoryCounterStore>) {
    let ledger = ScoreLedger::new(store);
    for user in 1..=12_i64 {
        for _ in 0..user {
            ledger.record_match(event(user)).await.expect("recorded");
        }
    }

    let board = ledger
        .top(CounterKind::Pattern, 10)
        .await
        .expect("leaderboard");

    let scores: Vec<i64> = board.iter().map(|entry| entry.score).collect();
    assert_eq!(scores, vec![12, 11, 10, 9, 8, 7, 6, 5, 4, 3]);
    assert_eq!(board.first().map(|entry| entry.display_name.as_str()), Some("user 12"));
}

#[rstest]
#[tokio::test]
async fn short_leaderboard_lists_everyone(store: Arc<InMemoryCounterStore>) {
    let ledger = ScoreLedger::new(store);
    ledger.record_match(event(1)).await.expect("recorded");
    ledger.record_match(event(2)).await.expect("recorded");
    ledger.record_match(event(2)).await.expect("recorded");

    let board = ledger
        .top(CounterKind::Pattern, 10)
        .await
        .expect("leaderboard");

    assert_eq!(board.len(), 2);
    assert_eq!(board.first().map(|entry| entry.user_id), Some(SenderId::new(2)));
    assert!(
        ledger
            .top(CounterKind::NumericSum, 10)
            .await
            .expect("leaderboard")
            .is_empty()
    );
}

#[rstest]
#[tokio::test]
async fn pipeline_counts_replies_and_ranks(store: Arc<InMemoryCounterStore>) {
    let sink = Arc::new(RecordingSink::default());
    let matcher = SequenceMatcher::new(
        Pattern::new("owl").expect("valid pattern"),
        MatchingMode::LetterScan,
    );
    let pipeline = MessagePipeline::new(matcher, ScoreLedger::new(store.clone()), sink.clone())
        .with_numeric_target(Some(NumericTarget::new(10)));

    let first = pipeline
        .handle_text(&message(1, "Ada", "on weekdays lunch"))
        .await;
    let second = pipeline
        .handle_text(&message(1, "Ada", "our wise leader"))
        .await;
    let sum = pipeline.handle_text(&message(2, "Bo", "3 and 7")).await;
    let miss = pipeline.handle_text(&message(2, "Bo", "nothing")).await;
    let board = pipeline
        .show_leaderboard(&message(2, "Bo", "/leaderboard"), CounterKind::Pattern)
        .await;

    assert_eq!(first, Ok(Outcome::Replied));
    assert_eq!(second, Ok(Outcome::Replied));
    assert_eq!(sum, Ok(Outcome::Replied));
    assert_eq!(miss, Ok(Outcome::NoMatch));
    assert_eq!(board, Ok(Outcome::Replied));

    let texts = sink.texts();
    assert_eq!(texts.len(), 4);
    let second_text = texts.get(1).expect("second reply");
    assert!(second_text.contains("Hidden owl detected\\! 2 have been discovered so far\\."));
    assert!(second_text.contains("[Ada](tg://user?id=1)"));
    assert!(second_text.contains("worshiped the owl 2 time\\(s\\)\\."));
    let sum_text = texts.get(2).expect("sum reply");
    assert!(sum_text.starts_with("3 \\+ 7 \\= 10\\! 1 sums have been found so far\\."));
    let board_text = texts.get(3).expect("leaderboard reply");
    assert!(board_text.starts_with("Top 1 owl worshipers:"));
    assert!(board_text.contains("1\\. [Ada](tg://user?id=1) — 2"));

    assert_eq!(
        store.count(&RecordKey::global(CounterKind::NumericSum)),
        Some(1)
    );
    let replies = sink.replies.lock().expect("sink lock");
    assert!(replies.iter().all(|reply| reply.formatting == Formatting::RichText));
    assert_eq!(replies.first().and_then(|reply| reply.reply_to), Some(100));
}
