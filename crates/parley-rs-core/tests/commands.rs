//! Administrative command tests against a real store.

use parley_rs_config::{MemoryConfig, MemoryUpdateMode, ParleyConfig};
use parley_rs_core::{
    AdminCommand, InboundMessage, LlmSummarizer, ModelClient, ModelSettings, Orchestrator,
    OrchestratorParts,
};
use parley_rs_memory::{ConversationStore, NewTurn, SqliteStore};
use parley_rs_test_utils::{RecordingChatLLM, RecordingSink};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn orchestrator(store: Arc<SqliteStore>, sink: RecordingSink) -> Orchestrator {
    let config = ParleyConfig::builder()
        .memory(MemoryConfig {
            update_mode: MemoryUpdateMode::Inline,
            ..MemoryConfig::default()
        })
        .build();
    let summarizer = LlmSummarizer::new(ModelClient::new(
        Arc::new(RecordingChatLLM::new("Likes Rust.")),
        ModelSettings::for_summaries(&config.model),
    ));
    Orchestrator::new(OrchestratorParts {
        config,
        store,
        reply_llm: Arc::new(RecordingChatLLM::new("Noted.")),
        summarizer: Arc::new(summarizer),
        sink: Arc::new(sink),
        bot_user_id: "900".to_string(),
    })
    .expect("orchestrator")
}

#[tokio::test]
async fn memory_reports_summary_or_absence() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let orchestrator = orchestrator(store.clone(), RecordingSink::new());

    let reply = AdminCommand::Memory
        .execute(&orchestrator, "u1", "c1")
        .await
        .expect("memory");
    assert_eq!(reply, "I don't have any long-term memory about you yet.");

    store.upsert_summary("u1", "likes Rust").await.expect("seed");
    let reply = AdminCommand::Memory
        .execute(&orchestrator, "u1", "c1")
        .await
        .expect("memory");
    assert_eq!(reply, "Your long-term memory: likes Rust");
}

#[tokio::test]
async fn forget_erases_summary_and_is_repeatable() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    store.upsert_summary("u1", "likes Rust").await.expect("seed");
    store.upsert_summary("u2", "likes Go").await.expect("seed");
    let orchestrator = orchestrator(store.clone(), RecordingSink::new());

    for _ in 0..2 {
        let reply = AdminCommand::Forget
            .execute(&orchestrator, "u1", "c1")
            .await
            .expect("forget");
        assert_eq!(reply, "Your long-term memory has been erased.");
    }
    assert_eq!(orchestrator.read_memory("u1").await.expect("read"), "");
    assert_eq!(store.get_summary("u2").await.expect("read"), "likes Go");
}

#[tokio::test]
async fn reset_clears_channel_history() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    for idx in 0..5 {
        store
            .append_turn(NewTurn::user(None, "c1", "u1", format!("turn {idx}")))
            .await
            .expect("append");
    }
    let orchestrator = orchestrator(store.clone(), RecordingSink::new());

    let reply = AdminCommand::Reset
        .execute(&orchestrator, "u1", "c1")
        .await
        .expect("reset");
    assert_eq!(reply, "Cleared 5 messages from this channel's history.");
    assert!(
        store
            .recent_turns("c1", 10)
            .await
            .expect("recent")
            .is_empty()
    );

    let reply = AdminCommand::Reset
        .execute(&orchestrator, "u1", "c1")
        .await
        .expect("reset again");
    assert_eq!(reply, "Cleared 0 messages from this channel's history.");
}

#[tokio::test]
async fn reset_does_not_touch_long_term_memory() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(store.clone(), sink.clone());

    orchestrator
        .handle_message(InboundMessage::new(None, "c1", "u1", "!ask I like Rust"))
        .await
        .expect("handle");
    assert_eq!(sink.texts(), vec!["Noted.".to_string()]);

    AdminCommand::parse("/reset")
        .expect("command")
        .execute(&orchestrator, "u1", "c1")
        .await
        .expect("reset");
    assert_eq!(store.count_turns("c1").await.expect("count"), 0);
    assert_eq!(
        store.get_summary("u1").await.expect("summary"),
        "Likes Rust."
    );
}
