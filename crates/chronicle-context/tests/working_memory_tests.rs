// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategies running against a real session store.

use std::sync::Arc;

use chronicle_context::{
    BufferWindow, ConversationWindow, SummaryBuffer, SummaryBufferConfig, WorkingMemory,
};
use chronicle_core::{CancellationToken, Message, SessionStore, TokenCounter};
use chronicle_test_utils::{MockSummarizer, TestStore, conversation};

fn summary_buffer(summarizer: Arc<MockSummarizer>) -> WorkingMemory {
    let config = SummaryBufferConfig {
        budget: 200,
        ..SummaryBufferConfig::default()
    };
    WorkingMemory::SummaryBuffer(SummaryBuffer::new(
        config,
        TokenCounter::estimate(),
        summarizer,
    ))
}

fn ids(window: &ConversationWindow) -> Vec<String> {
    window.messages().iter().map(|m| m.id.clone()).collect()
}

#[tokio::test]
async fn window_of_three_returns_last_three() {
    let harness = TestStore::new().await.unwrap();
    let token = CancellationToken::new();
    for text in ["a", "b", "c", "d", "e"] {
        harness
            .store
            .append_messages("agent", "s1", &[Message::user(text)], &token)
            .await
            .unwrap();
    }

    let wm = WorkingMemory::BufferWindow(BufferWindow::new(3));
    let window = wm
        .load_state(harness.store.as_ref(), "agent", "s1")
        .await
        .unwrap();
    let texts: Vec<String> = wm.get_messages(&window).iter().map(Message::text).collect();
    assert_eq!(texts, vec!["c", "d", "e"]);
}

#[tokio::test]
async fn reload_after_compaction_starts_at_checkpoint() {
    let harness = TestStore::new().await.unwrap();
    let token = CancellationToken::new();
    let summarizer = Arc::new(MockSummarizer::new());
    summarizer.push_summary("alice asked about invoices");
    let wm = summary_buffer(summarizer.clone());

    harness
        .store
        .append_messages("agent", "s1", &conversation("turn", 40), &token)
        .await
        .unwrap();

    let mut window = wm
        .load_state(harness.store.as_ref(), "agent", "s1")
        .await
        .unwrap();
    let persisted = wm.check_and_summarize(&mut window, None).await.unwrap();
    assert_eq!(persisted.len(), 1);
    harness
        .store
        .append_messages("agent", "s1", &persisted, &token)
        .await
        .unwrap();

    // The source of truth still holds every original message.
    assert_eq!(harness.store.count_messages("agent", "s1").await.unwrap(), 41);

    let reloaded = wm
        .load_state(harness.store.as_ref(), "agent", "s1")
        .await
        .unwrap();
    assert!(reloaded.starts_with_checkpoint());
    assert_eq!(ids(&reloaded), ids(&window));
    assert!(reloaded.len() - 1 >= 10);
    assert!(
        reloaded.messages()[1..].iter().all(|m| !m.is_checkpoint()),
        "only the leading message may be a checkpoint"
    );
}

#[tokio::test]
async fn messages_after_checkpoint_are_included_on_reload() {
    let harness = TestStore::new().await.unwrap();
    let token = CancellationToken::new();
    let summarizer = Arc::new(MockSummarizer::new());
    let wm = summary_buffer(summarizer);

    harness
        .store
        .append_messages("agent", "s1", &conversation("old", 30), &token)
        .await
        .unwrap();
    let mut window = wm
        .load_state(harness.store.as_ref(), "agent", "s1")
        .await
        .unwrap();
    let persisted = wm.check_and_summarize(&mut window, None).await.unwrap();
    harness
        .store
        .append_messages("agent", "s1", &persisted, &token)
        .await
        .unwrap();
    harness
        .store
        .append_messages("agent", "s1", &conversation("new", 3), &token)
        .await
        .unwrap();

    let reloaded = wm
        .load_state(harness.store.as_ref(), "agent", "s1")
        .await
        .unwrap();
    let got = ids(&reloaded);
    assert_eq!(got[0], persisted[0].id);
    assert_eq!(&got[got.len() - 3..], &["new-0", "new-1", "new-2"]);
    assert!(!got.iter().any(|id| id == "old-0"));
}

#[tokio::test]
async fn fifteen_messages_no_summary_twenty_five_one_summary() {
    for (count, expected_calls) in [(15usize, 0usize), (25, 1)] {
        let harness = TestStore::new().await.unwrap();
        let token = CancellationToken::new();
        let summarizer = Arc::new(MockSummarizer::new());
        let config = SummaryBufferConfig {
            budget: 50,
            ..SummaryBufferConfig::default()
        };
        let wm = WorkingMemory::SummaryBuffer(SummaryBuffer::new(
            config,
            TokenCounter::estimate(),
            summarizer.clone(),
        ));

        harness
            .store
            .append_messages("agent", "s1", &conversation("m", count), &token)
            .await
            .unwrap();
        let mut window = wm
            .load_state(harness.store.as_ref(), "agent", "s1")
            .await
            .unwrap();
        wm.check_and_summarize(&mut window, None).await.unwrap();

        assert_eq!(summarizer.call_count(), expected_calls, "count = {count}");
        assert_eq!(window.starts_with_checkpoint(), expected_calls == 1);
    }
}
