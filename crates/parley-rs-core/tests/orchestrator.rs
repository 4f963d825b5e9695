//! Orchestrator pipeline tests with stub models and an in-memory store.

use autoagents_llm::LLMProvider;
use parley_rs_config::{MemoryConfig, MemoryUpdateMode, ParleyConfig};
use parley_rs_core::{
    InboundMessage, LlmSummarizer, ModelClient, ModelSettings, Orchestrator, OrchestratorParts,
    ParleyCoreError, PipelineOutcome, PipelineStage,
};
use parley_rs_memory::{ConversationStore, Role, SqliteStore, StoreError};
use parley_rs_test_utils::{
    FailingLLM, FaultyStore, RecordingChatLLM, RecordingSink, ScriptedLLM, SlowLLM,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const BOT_ID: &str = "900";
const APOLOGY: &str = "Sorry, something went wrong while generating a reply.";

fn config(mode: MemoryUpdateMode) -> ParleyConfig {
    let mut config = ParleyConfig::builder()
        .memory(MemoryConfig {
            update_mode: mode,
            ..MemoryConfig::default()
        })
        .build();
    config.model.max_retries = 0;
    config.model.retry_backoff_ms = 0;
    config
}

fn build(
    config: ParleyConfig,
    store: Arc<dyn ConversationStore>,
    reply_llm: Arc<dyn LLMProvider>,
    summary_llm: Arc<dyn LLMProvider>,
    sink: RecordingSink,
) -> Orchestrator {
    let summarizer = LlmSummarizer::new(ModelClient::new(
        summary_llm,
        ModelSettings::for_summaries(&config.model),
    ))
    .with_max_words(config.memory.summary_max_words);
    Orchestrator::new(OrchestratorParts {
        config,
        store,
        reply_llm,
        summarizer: Arc::new(summarizer),
        sink: Arc::new(sink),
        bot_user_id: BOT_ID.to_string(),
    })
    .expect("orchestrator")
}

fn message(channel: &str, author: &str, text: &str) -> InboundMessage {
    InboundMessage::new(Some("g1".to_string()), channel, author, text)
}

/// Unaddressed chatter is recorded but never answered or summarized.
#[tokio::test]
async fn unaddressed_messages_are_recorded_only() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let reply_llm = Arc::new(RecordingChatLLM::new("should not be used"));
    let summary_llm = Arc::new(RecordingChatLLM::new("should not be used"));
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        reply_llm.clone(),
        summary_llm.clone(),
        sink.clone(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "just chatting about lunch"))
        .await
        .expect("handle");

    assert_eq!(outcome, PipelineOutcome::Persisted);
    assert!(sink.sent().is_empty());
    assert_eq!(reply_llm.call_count(), 0);
    assert_eq!(summary_llm.call_count(), 0);
    let turns = store.recent_turns("c1", 10).await.expect("turns");
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].guild_id.as_deref(), Some("g1"));
}

/// First contact: no history, no memory, reply recorded as an assistant turn.
#[tokio::test]
async fn hello_with_empty_history_replies_and_records() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let reply_llm = Arc::new(RecordingChatLLM::new("  Hi there!  "));
    let summary_llm = Arc::new(RecordingChatLLM::new("Greets people."));
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        reply_llm.clone(),
        summary_llm,
        sink.clone(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "!ask hello"))
        .await
        .expect("handle");

    assert_eq!(outcome.reply(), Some("Hi there!"));
    let prompt = reply_llm.last_messages.lock().clone();
    let contents = prompt
        .iter()
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1], "Long-term memory about this user: (none)");
    assert_eq!(contents[2], "hello");

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel_id, "c1");
    assert_eq!(sent[0].text, "Hi there!");

    let turns = store.recent_turns("c1", 10).await.expect("turns");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::Assistant);
    assert_eq!(turns[0].author_id, BOT_ID);
    assert_eq!(turns[0].content, "Hi there!");
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[1].content, "!ask hello");
}

/// The summary is fed the raw inbound text, not the reply or cleaned text.
#[tokio::test]
async fn memory_update_uses_raw_inbound_text() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let summary_llm = Arc::new(RecordingChatLLM::new(" Loves Rust. "));
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(RecordingChatLLM::new("Nice!")),
        summary_llm.clone(),
        RecordingSink::new(),
    );

    orchestrator
        .handle_message(message("c1", "u1", "<@900> I love   Rust"))
        .await
        .expect("handle");

    let prompt = summary_llm.last_messages.lock().clone();
    assert_eq!(
        prompt[1].content,
        "Current summary: (none)\nNew message: <@900> I love   Rust\nUpdated summary:"
    );
    assert_eq!(
        store.get_summary("u1").await.expect("summary"),
        "Loves Rust."
    );
}

/// Prior turns reach the prompt in causal order, and the summary is included.
#[tokio::test]
async fn history_and_memory_reach_the_prompt() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    store.upsert_summary("u1", "likes Rust").await.expect("seed");
    let reply_llm = Arc::new(RecordingChatLLM::new("Sure."));
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        reply_llm.clone(),
        Arc::new(RecordingChatLLM::new("likes Rust")),
        RecordingSink::new(),
    );

    orchestrator
        .handle_message(message("c1", "u2", "anyone around?"))
        .await
        .expect("first");
    orchestrator
        .handle_message(message("c1", "u1", "!ask can you help"))
        .await
        .expect("second");

    let contents = reply_llm
        .last_messages
        .lock()
        .iter()
        .map(|message| message.content.clone())
        .collect::<Vec<_>>();
    assert_eq!(contents[1], "Long-term memory about this user: likes Rust");
    assert_eq!(contents[2], "anyone around?");
    assert_eq!(contents[3], "can you help");
    assert_eq!(contents.len(), 4);
}

/// Bot-authored and blank messages are dropped before anything is stored.
#[tokio::test]
async fn bot_and_blank_messages_are_ignored() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(RecordingChatLLM::new("x")),
        Arc::new(RecordingChatLLM::new("x")),
        sink.clone(),
    );

    let bot = orchestrator
        .handle_message(message("c1", "b1", "!ask echo").from_bot())
        .await
        .expect("bot");
    let blank = orchestrator
        .handle_message(message("c1", "u1", "  \n "))
        .await
        .expect("blank");

    assert_eq!(bot, PipelineOutcome::IgnoredBot);
    assert_eq!(blank, PipelineOutcome::IgnoredEmpty);
    assert_eq!(store.count_turns("c1").await.expect("count"), 0);
    assert!(sink.sent().is_empty());
}

/// A bare prefix is recorded but not answered.
#[tokio::test]
async fn empty_after_strip_is_recorded_without_reply() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let reply_llm = Arc::new(RecordingChatLLM::new("x"));
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        reply_llm.clone(),
        Arc::new(RecordingChatLLM::new("x")),
        sink.clone(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "!ask <@900>"))
        .await
        .expect("handle");

    assert_eq!(outcome, PipelineOutcome::EmptyAfterStrip);
    assert_eq!(store.count_turns("c1").await.expect("count"), 1);
    assert_eq!(reply_llm.call_count(), 0);
    assert!(sink.sent().is_empty());
}

/// Generation failure sends the apology and keeps the user turn.
#[tokio::test]
async fn generation_failure_sends_apology() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let summary_llm = Arc::new(RecordingChatLLM::new("x"));
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(FailingLLM::new("model offline")),
        summary_llm.clone(),
        sink.clone(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "!ask hello"))
        .await
        .expect("handle");

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: PipelineStage::GenerateReply,
            ..
        }
    ));
    assert_eq!(sink.texts(), vec![APOLOGY.to_string()]);
    let turns = store.recent_turns("c1", 10).await.expect("turns");
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(summary_llm.call_count(), 0);
}

/// A rejected reply still gets an apology attempt and is not recorded.
#[tokio::test]
async fn send_failure_attempts_apology() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let sink = RecordingSink::rejecting();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(RecordingChatLLM::new("Hello!")),
        Arc::new(RecordingChatLLM::new("x")),
        sink.clone(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "!ask hello"))
        .await
        .expect("handle");

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: PipelineStage::SendReply,
            ..
        }
    ));
    assert_eq!(
        sink.texts(),
        vec!["Hello!".to_string(), APOLOGY.to_string()]
    );
    assert_eq!(store.count_turns("c1").await.expect("count"), 1);
}

/// A failed assistant write still apologizes and skips the memory update.
#[tokio::test]
async fn assistant_turn_failure_apologizes_and_skips_memory() {
    let store = Arc::new(FaultyStore::new().fail_appends_for(Role::Assistant));
    let summary_llm = Arc::new(RecordingChatLLM::new("x"));
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(RecordingChatLLM::new("Hello!")),
        summary_llm.clone(),
        sink.clone(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "!ask hello"))
        .await
        .expect("handle");

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: PipelineStage::PersistAssistantTurn,
            ..
        }
    ));
    assert_eq!(
        sink.texts(),
        vec!["Hello!".to_string(), APOLOGY.to_string()]
    );
    assert_eq!(summary_llm.call_count(), 0);
    assert_eq!(store.count_turns("c1").await.expect("count"), 1);
}

/// When the user turn cannot be stored, addressed messages get an apology.
#[tokio::test]
async fn user_turn_failure_is_an_error() {
    let store = Arc::new(FaultyStore::new().fail_appends_for(Role::User));
    let reply_llm = Arc::new(RecordingChatLLM::new("x"));
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store,
        reply_llm.clone(),
        Arc::new(RecordingChatLLM::new("x")),
        sink.clone(),
    );

    let err = orchestrator
        .handle_message(message("c1", "u1", "!ask hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyCoreError::Store(StoreError::Closed)));
    assert_eq!(sink.texts(), vec![APOLOGY.to_string()]);

    orchestrator
        .handle_message(message("c1", "u1", "unaddressed"))
        .await
        .unwrap_err();
    assert_eq!(sink.texts().len(), 1);
    assert_eq!(reply_llm.call_count(), 0);
}

/// Summarizer failures never surface to the user.
#[tokio::test]
async fn summarizer_failure_does_not_fail_the_reply() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    store.upsert_summary("u1", "likes tea").await.expect("seed");
    let sink = RecordingSink::new();
    let orchestrator = build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(RecordingChatLLM::new("Sure.")),
        Arc::new(FailingLLM::new("summary model offline")),
        sink.clone(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "!ask I prefer coffee now"))
        .await
        .expect("handle");

    assert_eq!(outcome.reply(), Some("Sure."));
    assert_eq!(sink.texts(), vec!["Sure.".to_string()]);
    assert_eq!(store.get_summary("u1").await.expect("summary"), "likes tea");
}

/// Background updates finish by the time shutdown returns.
#[tokio::test]
async fn shutdown_waits_for_background_updates() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let summary_llm = Arc::new(SlowLLM::new("Plays chess.", Duration::from_millis(50)));
    let orchestrator = build(
        config(MemoryUpdateMode::Background),
        store.clone(),
        Arc::new(RecordingChatLLM::new("Good move.")),
        summary_llm,
        RecordingSink::new(),
    );

    let outcome = orchestrator
        .handle_message(message("c1", "u1", "!ask I play chess"))
        .await
        .expect("handle");
    assert_eq!(outcome.reply(), Some("Good move."));

    orchestrator.shutdown().await;
    assert_eq!(orchestrator.pending_memory_updates(), 0);
    assert_eq!(
        store.get_summary("u1").await.expect("summary"),
        "Plays chess."
    );
}

/// Two addressed messages in one channel do not interleave their turns.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_channel_messages_are_serialized() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let orchestrator = Arc::new(build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(SlowLLM::new("done", Duration::from_millis(40))),
        Arc::new(RecordingChatLLM::new("x")),
        RecordingSink::new(),
    ));

    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .handle_message(message("c1", "u1", "!ask one"))
                .await
        })
    };
    let second = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .handle_message(message("c1", "u2", "!ask two"))
                .await
        })
    };
    first.await.expect("join").expect("first");
    second.await.expect("join").expect("second");

    let mut turns = store.recent_turns("c1", 10).await.expect("turns");
    turns.reverse();
    let roles = turns.iter().map(|turn| turn.role).collect::<Vec<_>>();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

/// One user talking in two channels at once never loses a summary update.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_for_one_user_build_on_each_other() {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    let summary_llm = Arc::new(
        ScriptedLLM::new(vec![
            Ok("Likes tea.".to_string()),
            Ok("Likes tea and chess.".to_string()),
        ])
        .with_delay(Duration::from_millis(50)),
    );
    let orchestrator = Arc::new(build(
        config(MemoryUpdateMode::Inline),
        store.clone(),
        Arc::new(RecordingChatLLM::new("Noted.")),
        summary_llm.clone(),
        RecordingSink::new(),
    ));

    let handles = [("c1", "!ask I like tea"), ("c2", "!ask I play chess")].map(
        |(channel, text)| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .handle_message(message(channel, "u1", text))
                    .await
            })
        },
    );
    for handle in handles {
        handle.await.expect("join").expect("handle");
    }

    let prompts = summary_llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0][1].content.contains("Current summary: (none)"));
    assert!(
        prompts[1][1]
            .content
            .contains("Current summary: Likes tea.")
    );
    assert_eq!(
        store.get_summary("u1").await.expect("summary"),
        "Likes tea and chess."
    );
}

/// The orchestrator refuses to start without a bot identity.
#[tokio::test]
async fn empty_bot_id_is_a_config_error() {
    let config = config(MemoryUpdateMode::Inline);
    let model = config.model.clone();
    let result = Orchestrator::new(OrchestratorParts {
        config,
        store: Arc::new(SqliteStore::open_in_memory().expect("store")),
        reply_llm: Arc::new(RecordingChatLLM::new("x")),
        summarizer: Arc::new(LlmSummarizer::new(ModelClient::new(
            Arc::new(RecordingChatLLM::new("x")),
            ModelSettings::for_summaries(&model),
        ))),
        sink: Arc::new(RecordingSink::new()),
        bot_user_id: "  ".to_string(),
    });
    assert!(matches!(result, Err(ParleyCoreError::Config(_))));
}
